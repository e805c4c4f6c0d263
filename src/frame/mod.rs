//! Time-indexed wide table.
//!
//! [`TimeFrame`] is an ordered map from instants to rows: a strictly
//! increasing UTC index plus typed columns of nullable `f64` values. It is the
//! single table abstraction shared by every pipeline stage, replacing implicit
//! index alignment with explicit positional operations:
//!
//! - [`TimeFrame::shift`]: sample-offset shift (lags and targets)
//! - [`TimeFrame::rolling_mean`]: trailing mean over a sample window
//! - [`TimeFrame::resample`]: re-grid onto a fixed period
//!
//! # Invariants
//!
//! - The index is strictly increasing (sorted, no duplicates)
//! - Every column has exactly `index.len()` values
//! - Column definitions are unique
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use metrics_preprocessor::frame::TimeFrame;
//! use metrics_preprocessor::schema::ColumnDef;
//!
//! let index = (0..3)
//!     .map(|m| Utc.with_ymd_and_hms(2024, 1, 1, 0, m, 0).unwrap())
//!     .collect();
//! let mut frame = TimeFrame::new(index).unwrap();
//! frame
//!     .push_column(ColumnDef::metric("cpu"), vec![Some(1.0), Some(2.0), Some(3.0)])
//!     .unwrap();
//!
//! let lag = frame.shift(&ColumnDef::metric("cpu"), 1).unwrap();
//! assert_eq!(lag, vec![None, Some(1.0), Some(2.0)]);
//! ```

pub mod ops;

use crate::error::{PrepError, Result};
use crate::schema::{ColumnDef, DatasetSchema};
use chrono::{DateTime, Utc};
use ndarray::Array2;
use std::ops::Range;

/// Instant type used for every index.
pub type Timestamp = DateTime<Utc>;

/// One typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Typed descriptor
    pub def: ColumnDef,

    /// Values aligned with the frame index (`None` = null)
    pub values: Vec<Option<f64>>,
}

impl Column {
    /// Number of null entries.
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// True if every entry is null.
    pub fn is_all_null(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

/// Wide table indexed by strictly increasing UTC instants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeFrame {
    index: Vec<Timestamp>,
    columns: Vec<Column>,
}

impl TimeFrame {
    /// Create a frame with the given index and no columns.
    ///
    /// Fails if the index is not strictly increasing.
    pub fn new(index: Vec<Timestamp>) -> Result<Self> {
        if let Some(pos) = index.windows(2).position(|w| w[0] >= w[1]) {
            return Err(PrepError::Frame(format!(
                "index not strictly increasing at position {}: {} >= {}",
                pos + 1,
                index[pos],
                index[pos + 1]
            )));
        }
        Ok(Self {
            index,
            columns: Vec::new(),
        })
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True if the frame has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The time index.
    pub fn index(&self) -> &[Timestamp] {
        &self.index
    }

    /// All columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of columns.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Column definitions in order.
    pub fn defs(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().map(|c| &c.def)
    }

    /// Schema snapshot with name lookup.
    pub fn schema(&self) -> Result<DatasetSchema> {
        DatasetSchema::from_defs(self.defs())
    }

    /// Append a column.
    ///
    /// Fails on length mismatch, or when the serialized name is already taken
    /// (a metric called `cpu_lag_1` next to the lag-1 column of `cpu`).
    pub fn push_column(&mut self, def: ColumnDef, values: Vec<Option<f64>>) -> Result<()> {
        if values.len() != self.len() {
            return Err(PrepError::Frame(format!(
                "column '{}' has {} values, frame has {} rows",
                def,
                values.len(),
                self.len()
            )));
        }
        let name = def.name();
        if self.columns.iter().any(|c| c.def.name() == name) {
            return Err(PrepError::Frame(format!("duplicate column '{name}'")));
        }
        self.columns.push(Column { def, values });
        Ok(())
    }

    /// True if a column with this definition exists.
    pub fn has_column(&self, def: &ColumnDef) -> bool {
        self.columns.iter().any(|c| &c.def == def)
    }

    /// Column position by definition.
    pub fn position(&self, def: &ColumnDef) -> Option<usize> {
        self.columns.iter().position(|c| &c.def == def)
    }

    /// Column by definition.
    pub fn column(&self, def: &ColumnDef) -> Option<&Column> {
        self.columns.iter().find(|c| &c.def == def)
    }

    /// Mutable column by position.
    pub fn column_mut(&mut self, position: usize) -> Option<&mut Column> {
        self.columns.get_mut(position)
    }

    /// Column values by definition.
    pub fn values(&self, def: &ColumnDef) -> Option<&[Option<f64>]> {
        self.column(def).map(|c| c.values.as_slice())
    }

    /// Shift a column by `by` samples (positive = lag, negative = lead).
    pub fn shift(&self, def: &ColumnDef, by: isize) -> Option<Vec<Option<f64>>> {
        self.values(def).map(|v| ops::shift(v, by))
    }

    /// Trailing rolling mean of a column over `window` samples.
    pub fn rolling_mean(&self, def: &ColumnDef, window: usize) -> Option<Vec<Option<f64>>> {
        self.values(def).map(|v| ops::rolling_mean(v, window))
    }

    /// Re-grid onto a fixed period, filling gaps with `method`.
    ///
    /// See [`crate::preprocessing::Resampler`].
    pub fn resample(
        &self,
        period: chrono::Duration,
        method: crate::config::InterpolationMethod,
    ) -> Result<TimeFrame> {
        crate::preprocessing::Resampler::new(period, method).apply(self)
    }

    /// Keep rows where `mask` is true.
    ///
    /// # Panics
    ///
    /// Panics if `mask.len() != self.len()`.
    pub fn filter_rows(&self, mask: &[bool]) -> TimeFrame {
        assert_eq!(mask.len(), self.len(), "row mask must match frame length");

        let pick = |values: &[Option<f64>]| -> Vec<Option<f64>> {
            values
                .iter()
                .zip(mask)
                .filter(|(_, &keep)| keep)
                .map(|(v, _)| *v)
                .collect()
        };

        TimeFrame {
            index: self
                .index
                .iter()
                .zip(mask)
                .filter(|(_, &keep)| keep)
                .map(|(t, _)| *t)
                .collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    def: c.def.clone(),
                    values: pick(&c.values),
                })
                .collect(),
        }
    }

    /// Contiguous row slice.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn slice_rows(&self, range: Range<usize>) -> TimeFrame {
        TimeFrame {
            index: self.index[range.clone()].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    def: c.def.clone(),
                    values: c.values[range.clone()].to_vec(),
                })
                .collect(),
        }
    }

    /// Drop every row that has a null in any column.
    pub fn drop_nulls(&self) -> TimeFrame {
        let mask: Vec<bool> = (0..self.len())
            .map(|i| self.columns.iter().all(|c| c.values[i].is_some()))
            .collect();
        self.filter_rows(&mask)
    }

    /// Total null entries across all columns.
    pub fn null_count(&self) -> usize {
        self.columns.iter().map(Column::null_count).sum()
    }

    /// Dense `[rows, positions.len()]` matrix of the selected columns.
    ///
    /// Nulls become `NaN`.
    pub fn to_array(&self, positions: &[usize]) -> Array2<f64> {
        Array2::from_shape_fn((self.len(), positions.len()), |(row, col)| {
            self.columns[positions[col]].values[row].unwrap_or(f64::NAN)
        })
    }
}

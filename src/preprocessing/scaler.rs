//! Standardization of a column subset.
//!
//! Fits per-column mean and population standard deviation, then applies
//!
//! ```text
//! scaled = (x - mean) / scale
//! ```
//!
//! in place. A column with zero variance gets `scale = 1.0`, so constant
//! columns become all zeros instead of NaN.
//!
//! # Fit Scope
//!
//! Which rows the statistics come from is a policy, [`ScalerFitScope`]:
//!
//! - `FullDataset` (default): every row of every split. Validation and test
//!   statistics leak into the fitted parameters.
//! - `TrainOnly`: only the train split rows. The resulting transform is still
//!   applied to all splits.
//!
//! # Example
//!
//! ```
//! use metrics_preprocessor::preprocessing::{ScalerFitScope, ScalerState};
//!
//! let state = ScalerState::from_columns(
//!     ScalerFitScope::FullDataset,
//!     vec!["cpu".to_string()],
//!     &[&[Some(1.0), Some(3.0)]],
//! );
//! assert_eq!(state.mean, vec![2.0]);
//! assert_eq!(state.scale, vec![1.0]);
//! assert_eq!(state.transform(&[3.0]), vec![1.0]);
//! ```

use crate::error::Result;
use crate::frame::TimeFrame;
use crate::schema::{ColumnDef, DatasetSchema, FeatureCategory};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Which rows the scaler is fitted on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerFitScope {
    /// All rows of all splits
    #[default]
    FullDataset,

    /// Train split rows only
    TrainOnly,
}

impl ScalerFitScope {
    /// Serialized name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalerFitScope::FullDataset => "full_dataset",
            ScalerFitScope::TrainOnly => "train_only",
        }
    }
}

/// Welford running mean/variance for one column.
#[derive(Debug, Clone, Copy, Default)]
struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn update(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    /// Population std, 1.0 when undefined or zero.
    fn scale(&self) -> f64 {
        if self.count == 0 {
            return 1.0;
        }
        let std = (self.m2 / self.count as f64).sqrt();
        if std == 0.0 || !std.is_finite() {
            1.0
        } else {
            std
        }
    }
}

/// Fitted standardization parameters.
///
/// Serialized to `scaler.json` and shared read-only by anything that needs
/// to map model outputs back to the original units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    /// Rows the parameters were fitted on
    pub policy: ScalerFitScope,

    /// Column names in parameter order
    pub features: Vec<String>,

    /// Per-column mean
    pub mean: Vec<f64>,

    /// Per-column population std (zero replaced by 1.0)
    pub scale: Vec<f64>,

    /// Number of rows used for fitting
    pub n_samples_seen: usize,
}

impl ScalerState {
    /// Fit from raw column slices, skipping nulls.
    ///
    /// An empty column gets identity parameters (mean 0, scale 1).
    pub fn from_columns(
        policy: ScalerFitScope,
        features: Vec<String>,
        columns: &[&[Option<f64>]],
    ) -> Self {
        let mut n_samples_seen = 0;
        let (mean, scale): (Vec<f64>, Vec<f64>) = columns
            .iter()
            .map(|values| {
                let mut stats = RunningStats::default();
                for v in values.iter().flatten() {
                    stats.update(*v);
                }
                n_samples_seen = n_samples_seen.max(stats.count);
                (stats.mean, stats.scale())
            })
            .unzip();

        Self {
            policy,
            features,
            mean,
            scale,
            n_samples_seen,
        }
    }

    /// Fit on the given columns of `frame`, restricted to `rows`.
    ///
    /// # Panics
    ///
    /// Panics if `rows` is out of bounds for the frame.
    pub fn fit(
        frame: &TimeFrame,
        columns: &[ColumnDef],
        rows: Range<usize>,
        policy: ScalerFitScope,
    ) -> Self {
        let slices: Vec<&[Option<f64>]> = columns
            .iter()
            .map(|def| {
                frame
                    .values(def)
                    .map(|v| &v[rows.clone()])
                    .unwrap_or(&[])
            })
            .collect();
        let names = columns.iter().map(ColumnDef::name).collect();
        Self::from_columns(policy, names, &slices)
    }

    /// Number of scaled columns.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// True if no column is scaled.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Scale one row of values given in `features` order.
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect()
    }

    /// Undo [`transform`](Self::transform) for one row.
    pub fn inverse_transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| x * s + m)
            .collect()
    }

    /// Scale the fitted columns of `frame` in place.
    ///
    /// Columns are matched by serialized name; names absent from the frame
    /// are skipped. Nulls stay null.
    pub fn apply(&self, frame: &mut TimeFrame) -> Result<()> {
        let schema: DatasetSchema = frame.schema()?;
        for (i, name) in self.features.iter().enumerate() {
            let Some(position) = schema.position_by_name(name) else {
                continue;
            };
            let (mean, scale) = (self.mean[i], self.scale[i]);
            if let Some(column) = frame.column_mut(position) {
                for value in column.values.iter_mut().flatten() {
                    *value = (*value - mean) / scale;
                }
            }
        }
        Ok(())
    }
}

/// Resolve which columns to scale.
///
/// Explicitly configured names are kept in configured order when present in
/// the schema. An empty configuration falls back to the raw metric columns.
pub fn select_scaler_columns(schema: &DatasetSchema, configured: &[String]) -> Vec<ColumnDef> {
    if configured.is_empty() {
        return schema
            .columns()
            .iter()
            .filter(|c| c.category() == FeatureCategory::Raw)
            .cloned()
            .collect();
    }

    configured
        .iter()
        .filter_map(|name| match schema.position_by_name(name) {
            Some(pos) => Some(schema.columns()[pos].clone()),
            None => {
                log::warn!("Scaler feature '{}' not present in dataset, skipping", name);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CalendarField;
    use chrono::{TimeZone, Utc};

    fn frame() -> TimeFrame {
        let index = (0..4)
            .map(|m| Utc.with_ymd_and_hms(2024, 1, 1, 0, m, 0).unwrap())
            .collect();
        let mut frame = TimeFrame::new(index).unwrap();
        frame
            .push_column(
                ColumnDef::metric("cpu"),
                vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)],
            )
            .unwrap();
        frame
            .push_column(ColumnDef::metric("mem"), vec![Some(7.0); 4])
            .unwrap();
        frame
            .push_column(ColumnDef::Calendar(CalendarField::Hour), vec![Some(0.0); 4])
            .unwrap();
        frame
    }

    #[test]
    fn test_full_dataset_fit() {
        let f = frame();
        let cols = vec![ColumnDef::metric("cpu"), ColumnDef::metric("mem")];
        let state = ScalerState::fit(&f, &cols, 0..4, ScalerFitScope::FullDataset);

        assert_eq!(state.features, vec!["cpu", "mem"]);
        assert!((state.mean[0] - 2.5).abs() < 1e-10);
        assert!((state.scale[0] - 1.25f64.sqrt()).abs() < 1e-10);
        // Constant column
        assert!((state.mean[1] - 7.0).abs() < 1e-10);
        assert_eq!(state.scale[1], 1.0);
        assert_eq!(state.n_samples_seen, 4);
    }

    #[test]
    fn test_train_only_fit_uses_prefix() {
        let f = frame();
        let cols = vec![ColumnDef::metric("cpu")];
        let state = ScalerState::fit(&f, &cols, 0..2, ScalerFitScope::TrainOnly);
        assert!((state.mean[0] - 1.5).abs() < 1e-10);
        assert!((state.scale[0] - 0.5).abs() < 1e-10);
        assert_eq!(state.n_samples_seen, 2);
    }

    #[test]
    fn test_apply_and_inverse() {
        let mut f = frame();
        let cols = vec![ColumnDef::metric("cpu"), ColumnDef::metric("mem")];
        let state = ScalerState::fit(&f, &cols, 0..4, ScalerFitScope::FullDataset);
        state.apply(&mut f).unwrap();

        let cpu: Vec<f64> = f
            .values(&ColumnDef::metric("cpu"))
            .unwrap()
            .iter()
            .map(|v| v.unwrap())
            .collect();
        let mean: f64 = cpu.iter().sum::<f64>() / 4.0;
        assert!(mean.abs() < 1e-10);
        assert!(f
            .values(&ColumnDef::metric("mem"))
            .unwrap()
            .iter()
            .all(|v| *v == Some(0.0)));
        // Unscaled column untouched
        assert_eq!(f.values(&ColumnDef::Calendar(CalendarField::Hour)).unwrap()[0], Some(0.0));

        let restored = state.inverse_transform(&[cpu[3], 0.0]);
        assert!((restored[0] - 4.0).abs() < 1e-10);
        assert!((restored[1] - 7.0).abs() < 1e-10);
    }

    #[test]
    fn test_empty_fit_is_identity() {
        let state = ScalerState::from_columns(ScalerFitScope::TrainOnly, vec!["cpu".into()], &[&[]]);
        assert_eq!(state.mean, vec![0.0]);
        assert_eq!(state.scale, vec![1.0]);
        assert_eq!(state.transform(&[5.0]), vec![5.0]);
    }

    #[test]
    fn test_select_scaler_columns() {
        let schema = frame().schema().unwrap();
        let default = select_scaler_columns(&schema, &[]);
        assert_eq!(default, vec![ColumnDef::metric("cpu"), ColumnDef::metric("mem")]);

        let explicit = select_scaler_columns(&schema, &["hour".to_string(), "absent".to_string()]);
        assert_eq!(explicit, vec![ColumnDef::Calendar(CalendarField::Hour)]);
    }

    #[test]
    fn test_policy_serialization() {
        let json = serde_json::to_string(&ScalerFitScope::TrainOnly).unwrap();
        assert_eq!(json, "\"train_only\"");
        assert_eq!(ScalerFitScope::default().as_str(), "full_dataset");
    }
}

//! Multi-horizon regression targets.
//!
//! For the target metric and each forecast horizon `h`, appends a column whose
//! row N holds the metric's raw value at row N+h:
//!
//! ```text
//! target_{metric}_t+{h}[N] = metric[N + h]      (last h rows null)
//! ```
//!
//! Horizons count samples, exactly like lags. Every target column is trimmed
//! together with the features at the final null-drop, so the largest horizon
//! bounds how much trailing history survives.
//!
//! The first configured horizon is the *primary* one; the sequence builder
//! pairs each window with it.
//!
//! # Example
//!
//! ```
//! use metrics_preprocessor::labeling::TargetBuilder;
//! use metrics_preprocessor::frame::TimeFrame;
//! use metrics_preprocessor::schema::ColumnDef;
//! use chrono::{TimeZone, Utc};
//!
//! let index = (0..4).map(|m| Utc.with_ymd_and_hms(2024, 1, 1, 0, m, 0).unwrap()).collect();
//! let mut frame = TimeFrame::new(index).unwrap();
//! frame.push_column(ColumnDef::metric("cpu"), vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]).unwrap();
//!
//! let builder = TargetBuilder::new("cpu", vec![2]);
//! let labelled = builder.apply(&frame).unwrap();
//! assert_eq!(
//!     labelled.values(&ColumnDef::target("cpu", 2)).unwrap(),
//!     &[Some(3.0), Some(4.0), None, None]
//! );
//! ```

use crate::error::{PrepError, Result};
use crate::frame::TimeFrame;
use crate::schema::ColumnDef;

/// Appends forward-shifted target columns for one metric.
#[derive(Debug, Clone)]
pub struct TargetBuilder {
    metric: String,
    horizons: Vec<usize>,
}

impl TargetBuilder {
    /// Create a builder for `metric` over the given horizons.
    pub fn new(metric: impl Into<String>, horizons: Vec<usize>) -> Self {
        Self {
            metric: metric.into(),
            horizons,
        }
    }

    /// Target metric name.
    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// Configured horizons in column order.
    pub fn horizons(&self) -> &[usize] {
        &self.horizons
    }

    /// Largest configured horizon (0 if none).
    pub fn max_horizon(&self) -> usize {
        self.horizons.iter().copied().max().unwrap_or(0)
    }

    /// Column definitions produced by [`apply`](Self::apply).
    pub fn target_columns(&self) -> Vec<ColumnDef> {
        self.horizons
            .iter()
            .map(|&h| ColumnDef::target(self.metric.as_str(), h))
            .collect()
    }

    /// Primary target column (first horizon).
    pub fn primary(&self) -> Option<ColumnDef> {
        self.horizons
            .first()
            .map(|&h| ColumnDef::target(self.metric.as_str(), h))
    }

    /// Return a copy of `frame` with one target column per horizon.
    ///
    /// # Errors
    ///
    /// [`PrepError::MissingTargetMetric`] if the target metric has no column.
    pub fn apply(&self, frame: &TimeFrame) -> Result<TimeFrame> {
        let source = ColumnDef::metric(self.metric.as_str());
        if !frame.has_column(&source) {
            return Err(PrepError::MissingTargetMetric(self.metric.clone()));
        }

        let mut out = frame.clone();
        for (&horizon, def) in self.horizons.iter().zip(self.target_columns()) {
            let values = frame
                .shift(&source, -(horizon as isize))
                .ok_or_else(|| PrepError::MissingTargetMetric(self.metric.clone()))?;
            out.push_column(def, values)?;
        }

        if self.max_horizon() >= frame.len() && !frame.is_empty() {
            log::warn!(
                "Horizon {} >= {} rows: every row of '{}' targets will be null",
                self.max_horizon(),
                frame.len(),
                self.metric
            );
        }
        Ok(out)
    }
}

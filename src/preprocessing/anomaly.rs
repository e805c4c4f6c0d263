//! Z-score outlier row removal.
//!
//! For every configured metric present in the frame, values are standardized
//! with the column's mean and population standard deviation (a zero std is
//! replaced by 1.0). A row survives only if **every** standardized value has
//! absolute value at most the threshold; one extreme metric removes the whole
//! timestamp across all columns. Null values standardize to 0 and never cause
//! a removal.
//!
//! The surviving rows keep their original timestamps, so the cadence may have
//! holes after this stage.
//!
//! # Example
//!
//! ```
//! use metrics_preprocessor::preprocessing::{AnomalyConfig, AnomalyFilter};
//! # use metrics_preprocessor::frame::TimeFrame;
//! # use metrics_preprocessor::schema::ColumnDef;
//! # use chrono::{TimeZone, Utc};
//! # let index = (0..20).map(|m| Utc.with_ymd_and_hms(2024, 1, 1, 0, m, 0).unwrap()).collect();
//! # let mut frame = TimeFrame::new(index).unwrap();
//! # let mut cpu = vec![Some(1.0); 20];
//! # cpu[7] = Some(500.0);
//! # frame.push_column(ColumnDef::metric("cpu"), cpu).unwrap();
//!
//! let filter = AnomalyFilter::new(AnomalyConfig::default());
//! let (kept, removed) = filter.apply(&frame, &["cpu".to_string()]);
//! assert_eq!(removed, 1);
//! assert_eq!(kept.len(), 19);
//! ```

use crate::frame::{ops, TimeFrame};
use crate::schema::ColumnDef;
use serde::{Deserialize, Serialize};

/// Anomaly filter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Run the filter at all
    pub enabled: bool,

    /// Maximum allowed |z| per metric (inclusive)
    pub zscore_threshold: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            zscore_threshold: 3.0,
        }
    }
}

impl AnomalyConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.zscore_threshold.is_nan() || self.zscore_threshold <= 0.0 {
            return Err(format!(
                "anomaly.zscore_threshold must be > 0 (got {})",
                self.zscore_threshold
            ));
        }
        Ok(())
    }
}

/// Row-wise z-score filter.
#[derive(Debug, Clone)]
pub struct AnomalyFilter {
    config: AnomalyConfig,
}

impl AnomalyFilter {
    /// Create a filter from configuration.
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    /// Filter rows of `frame` on the given metrics.
    ///
    /// Returns the surviving rows and the number of rows removed. A disabled
    /// filter, or one with no configured metric present, returns the frame
    /// unchanged.
    pub fn apply(&self, frame: &TimeFrame, metrics: &[String]) -> (TimeFrame, usize) {
        if !self.config.enabled {
            return (frame.clone(), 0);
        }

        let columns: Vec<&[Option<f64>]> = metrics
            .iter()
            .filter_map(|m| frame.values(&ColumnDef::metric(m.as_str())))
            .collect();
        if columns.is_empty() {
            return (frame.clone(), 0);
        }

        let threshold = self.config.zscore_threshold;
        let mut mask = vec![true; frame.len()];

        for values in columns {
            let mean = ops::mean(values).unwrap_or(0.0);
            let std = match ops::population_std(values) {
                Some(s) if s != 0.0 => s,
                _ => 1.0,
            };
            for (keep, value) in mask.iter_mut().zip(values) {
                let z = value.map_or(0.0, |v| (v - mean) / std);
                // NaN z-scores count as 0
                if !z.is_nan() && z.abs() > threshold {
                    *keep = false;
                }
            }
        }

        let kept = frame.filter_rows(&mask);
        let removed = frame.len() - kept.len();
        if removed > 0 {
            log::info!(
                "Anomaly filter removed {} of {} rows (|z| > {})",
                removed,
                frame.len(),
                threshold
            );
        }
        (kept, removed)
    }
}

//! Feature engineering over the resampled frame.
//!
//! Derives three families of input features without touching existing
//! columns:
//!
//! - **Calendar** (opt-out): hour, day of week, weekend flag and minute of
//!   day, taken from the UTC time index
//! - **Lag**: for each metric and lag `k`, row N holds row N-k's raw value
//!   (first `k` rows null)
//! - **Rolling mean**: for each metric and window `w`, the trailing mean of
//!   the last `w` samples ending at row N (first `w - 1` rows null)
//!
//! Offsets and windows count samples, not wall-clock time. After anomaly
//! filtering the index may have holes, and lags follow row positions anyway.
//!
//! # Column Order
//!
//! ```text
//! [existing columns] [hour, day_of_week, is_weekend, minute_of_day]
//! [m1_lag_k1, m1_lag_k2, ..., m2_lag_k1, ...]
//! [m1_rolling_mean_w1, ..., m2_rolling_mean_w1, ...]
//! ```
//!
//! # Usage
//!
//! ```
//! use metrics_preprocessor::features::{FeatureConfig, FeatureEngineer};
//! use metrics_preprocessor::frame::TimeFrame;
//! use metrics_preprocessor::schema::ColumnDef;
//! use chrono::{TimeZone, Utc};
//!
//! let index = (0..4).map(|m| Utc.with_ymd_and_hms(2024, 1, 6, 0, m, 0).unwrap()).collect();
//! let mut frame = TimeFrame::new(index).unwrap();
//! frame.push_column(ColumnDef::metric("cpu"), vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]).unwrap();
//!
//! let config = FeatureConfig::default().with_lags(vec![1]).with_rolling_windows(vec![2]);
//! let enriched = FeatureEngineer::new(config).apply(&frame, &["cpu".to_string()]).unwrap();
//!
//! assert_eq!(enriched.values(&ColumnDef::lag("cpu", 1)).unwrap()[1], Some(1.0));
//! assert_eq!(enriched.values(&ColumnDef::rolling_mean("cpu", 2)).unwrap()[3], Some(3.5));
//! ```

use crate::error::Result;
use crate::frame::TimeFrame;
use crate::schema::{CalendarField, ColumnDef};
use chrono::{Datelike, Timelike};
use serde::{Deserialize, Serialize};

/// Feature engineering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Add calendar columns derived from the index
    pub enable_time_features: bool,

    /// Lag offsets in samples, in output order
    pub lags: Vec<usize>,

    /// Rolling-mean window sizes in samples, in output order
    pub rolling_windows: Vec<usize>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            enable_time_features: true,
            lags: vec![1, 5, 15],
            rolling_windows: vec![3, 5],
        }
    }
}

impl FeatureConfig {
    /// Enable or disable calendar features.
    pub fn with_time_features(mut self, enabled: bool) -> Self {
        self.enable_time_features = enabled;
        self
    }

    /// Set lag offsets.
    pub fn with_lags(mut self, lags: Vec<usize>) -> Self {
        self.lags = lags;
        self
    }

    /// Set rolling-mean windows.
    pub fn with_rolling_windows(mut self, windows: Vec<usize>) -> Self {
        self.rolling_windows = windows;
        self
    }

    /// Number of derived columns for `n_metrics` present metrics.
    #[inline]
    pub fn derived_column_count(&self, n_metrics: usize) -> usize {
        let calendar = if self.enable_time_features {
            CalendarField::all().len()
        } else {
            0
        };
        calendar + n_metrics * (self.lags.len() + self.rolling_windows.len())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.lags.contains(&0) {
            return Err("features.lags must all be > 0".to_string());
        }
        if self.rolling_windows.contains(&0) {
            return Err("features.rolling_windows must all be > 0".to_string());
        }
        if has_duplicates(&self.lags) {
            return Err(format!("features.lags contains duplicates: {:?}", self.lags));
        }
        if has_duplicates(&self.rolling_windows) {
            return Err(format!(
                "features.rolling_windows contains duplicates: {:?}",
                self.rolling_windows
            ));
        }
        Ok(())
    }
}

fn has_duplicates(values: &[usize]) -> bool {
    values
        .iter()
        .enumerate()
        .any(|(i, v)| values[..i].contains(v))
}

/// Calendar value for one instant.
pub fn calendar_value(field: CalendarField, t: &crate::frame::Timestamp) -> f64 {
    match field {
        CalendarField::Hour => t.hour() as f64,
        CalendarField::DayOfWeek => t.weekday().num_days_from_monday() as f64,
        CalendarField::IsWeekend => {
            if t.weekday().num_days_from_monday() >= 5 {
                1.0
            } else {
                0.0
            }
        }
        CalendarField::MinuteOfDay => (t.hour() * 60 + t.minute()) as f64,
    }
}

/// Appends calendar, lag and rolling-mean columns.
#[derive(Debug, Clone, Default)]
pub struct FeatureEngineer {
    config: FeatureConfig,
}

impl FeatureEngineer {
    /// Create a feature engineer from configuration.
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Return a copy of `frame` with derived columns appended.
    ///
    /// Metrics not present in the frame are skipped.
    pub fn apply(&self, frame: &TimeFrame, metrics: &[String]) -> Result<TimeFrame> {
        let mut out = frame.clone();

        if self.config.enable_time_features {
            for &field in CalendarField::all() {
                let values = frame
                    .index()
                    .iter()
                    .map(|t| Some(calendar_value(field, t)))
                    .collect();
                out.push_column(ColumnDef::Calendar(field), values)?;
            }
        }

        let present: Vec<&str> = metrics
            .iter()
            .map(String::as_str)
            .filter(|m| frame.has_column(&ColumnDef::metric(*m)))
            .collect();

        for metric in &present {
            let source = ColumnDef::metric(*metric);
            for &lag in &self.config.lags {
                if let Some(values) = frame.shift(&source, lag as isize) {
                    out.push_column(ColumnDef::lag(*metric, lag), values)?;
                }
            }
        }

        for metric in &present {
            let source = ColumnDef::metric(*metric);
            for &window in &self.config.rolling_windows {
                if let Some(values) = frame.rolling_mean(&source, window) {
                    out.push_column(ColumnDef::rolling_mean(*metric, window), values)?;
                }
            }
        }

        log::debug!(
            "Feature engineering added {} columns for {} metrics",
            out.n_columns() - frame.n_columns(),
            present.len()
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Timestamp;
    use chrono::{TimeZone, Utc};

    fn frame(n: u32) -> TimeFrame {
        // 2024-01-05 is a Friday
        let index: Vec<Timestamp> = (0..n)
            .map(|i| Utc.with_ymd_and_hms(2024, 1, 5, 23, 58, 0).unwrap() + chrono::Duration::minutes(i as i64))
            .collect();
        let mut frame = TimeFrame::new(index).unwrap();
        frame
            .push_column(
                ColumnDef::metric("cpu"),
                (0..n).map(|i| Some(i as f64 * 10.0)).collect(),
            )
            .unwrap();
        frame
    }

    #[test]
    fn test_calendar_features() {
        let enriched = FeatureEngineer::new(FeatureConfig::default().with_lags(vec![]).with_rolling_windows(vec![]))
            .apply(&frame(3), &[])
            .unwrap();

        let hour = enriched.values(&ColumnDef::Calendar(CalendarField::Hour)).unwrap();
        let dow = enriched.values(&ColumnDef::Calendar(CalendarField::DayOfWeek)).unwrap();
        let weekend = enriched.values(&ColumnDef::Calendar(CalendarField::IsWeekend)).unwrap();
        let minute = enriched.values(&ColumnDef::Calendar(CalendarField::MinuteOfDay)).unwrap();

        assert_eq!(hour, &[Some(23.0), Some(23.0), Some(0.0)]);
        assert_eq!(dow, &[Some(4.0), Some(4.0), Some(5.0)]);
        assert_eq!(weekend, &[Some(0.0), Some(0.0), Some(1.0)]);
        assert_eq!(minute, &[Some(1438.0), Some(1439.0), Some(0.0)]);
    }

    #[test]
    fn test_lag_matches_earlier_row() {
        let f = frame(20);
        let config = FeatureConfig::default()
            .with_time_features(false)
            .with_lags(vec![1, 5])
            .with_rolling_windows(vec![]);
        let enriched = FeatureEngineer::new(config).apply(&f, &["cpu".to_string()]).unwrap();
        let raw = f.values(&ColumnDef::metric("cpu")).unwrap();

        for k in [1usize, 5] {
            let lag = enriched.values(&ColumnDef::lag("cpu", k)).unwrap();
            for n in 0..20 {
                if n < k {
                    assert_eq!(lag[n], None);
                } else {
                    assert_eq!(lag[n], raw[n - k]);
                }
            }
        }
    }

    #[test]
    fn test_rolling_mean_trailing() {
        let f = frame(6);
        let config = FeatureConfig::default()
            .with_time_features(false)
            .with_lags(vec![])
            .with_rolling_windows(vec![3]);
        let enriched = FeatureEngineer::new(config).apply(&f, &["cpu".to_string()]).unwrap();
        let rolled = enriched.values(&ColumnDef::rolling_mean("cpu", 3)).unwrap();

        assert_eq!(&rolled[..2], &[None, None]);
        assert!((rolled[2].unwrap() - 10.0).abs() < 1e-10);
        assert!((rolled[5].unwrap() - 40.0).abs() < 1e-10);
    }

    #[test]
    fn test_column_order_and_missing_metric() {
        let f = frame(4);
        let config = FeatureConfig::default()
            .with_lags(vec![2, 1])
            .with_rolling_windows(vec![2]);
        let metrics = vec!["cpu".to_string(), "absent".to_string()];
        let enriched = FeatureEngineer::new(config.clone()).apply(&f, &metrics).unwrap();

        let names = enriched.schema().unwrap().names();
        assert_eq!(
            names,
            vec![
                "cpu",
                "hour",
                "day_of_week",
                "is_weekend",
                "minute_of_day",
                "cpu_lag_2",
                "cpu_lag_1",
                "cpu_rolling_mean_2"
            ]
        );
        assert_eq!(enriched.n_columns() - f.n_columns(), config.derived_column_count(1));
        // Input untouched
        assert_eq!(f.n_columns(), 1);
    }

    #[test]
    fn test_validation() {
        assert!(FeatureConfig::default().validate().is_ok());
        assert!(FeatureConfig::default().with_lags(vec![0]).validate().is_err());
        assert!(FeatureConfig::default().with_rolling_windows(vec![0]).validate().is_err());
        assert!(FeatureConfig::default().with_lags(vec![1, 1]).validate().is_err());
    }
}

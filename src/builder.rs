//! Fluent builder for pipeline configuration.
//!
//! Programmatic alternative to loading a [`PreprocessorConfig`] from a file.
//!
//! # Quick Start
//!
//! ```ignore
//! use metrics_preprocessor::PipelineBuilder;
//!
//! let pipeline = PipelineBuilder::new()
//!     .input_glob("exports/*.csv")
//!     .output_dir("out/")
//!     .metrics(["cpu", "mem"])
//!     .resample("5min")
//!     .lags(vec![1, 12])
//!     .window(24, 1)
//!     .target("cpu", vec![6, 12])
//!     .build()?;
//!
//! let output = pipeline.run()?;
//! ```
//!
//! # Column Count Reference
//!
//! For `M` metrics present in the data:
//!
//! | Group | Count |
//! |-------|-------|
//! | Raw metrics | M |
//! | Calendar (if enabled) | 4 |
//! | Lags | M × lags |
//! | Rolling means | M × windows |
//! | Targets | horizons |

use crate::config::{InterpolationMethod, PreprocessorConfig};
use crate::error::Result;
use crate::features::FeatureConfig;
use crate::pipeline::Pipeline;
use crate::preprocessing::{AnomalyConfig, ScalerFitScope};
use crate::split::DatasetSplitConfig;
use std::path::PathBuf;

/// Fluent builder for [`PreprocessorConfig`] and [`Pipeline`].
///
/// Starts from the defaults; every setter overrides one field. Validation
/// happens once, in [`build_config`](Self::build_config).
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    config: PreprocessorConfig,
}

impl PipelineBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn from_config(config: PreprocessorConfig) -> Self {
        Self { config }
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Glob pattern for raw CSV files.
    pub fn input_glob(mut self, pattern: impl Into<String>) -> Self {
        self.config.input_glob = pattern.into();
        self
    }

    /// Header names of the timestamp, metric and value columns.
    pub fn columns(
        mut self,
        timestamp: impl Into<String>,
        metric: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.config.timestamp_column = timestamp.into();
        self.config.metric_column = metric.into();
        self.config.value_column = value.into();
        self
    }

    /// Metrics to keep, in output column order.
    pub fn metrics<I, S>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.metrics = metrics.into_iter().map(Into::into).collect();
        self
    }

    // =========================================================================
    // Processing
    // =========================================================================

    /// Resampling period, e.g. `30s` or `1min`.
    pub fn resample(mut self, rule: impl Into<String>) -> Self {
        self.config.resample_rule = rule.into();
        self
    }

    /// Gap-filling method.
    pub fn interpolation(mut self, method: InterpolationMethod) -> Self {
        self.config.interpolation_method = method;
        self
    }

    /// Z-score threshold for anomaly removal.
    pub fn anomaly_threshold(mut self, threshold: f64) -> Self {
        self.config.anomaly = AnomalyConfig {
            enabled: true,
            zscore_threshold: threshold,
        };
        self
    }

    /// Keep every row regardless of z-score.
    pub fn without_anomaly_filter(mut self) -> Self {
        self.config.anomaly.enabled = false;
        self
    }

    /// Replace the whole feature configuration.
    pub fn features(mut self, features: FeatureConfig) -> Self {
        self.config.features = features;
        self
    }

    /// Enable or disable calendar columns.
    pub fn time_features(mut self, enabled: bool) -> Self {
        self.config.features.enable_time_features = enabled;
        self
    }

    /// Lag offsets in samples.
    pub fn lags(mut self, lags: Vec<usize>) -> Self {
        self.config.features.lags = lags;
        self
    }

    /// Rolling-mean window sizes in samples.
    pub fn rolling_windows(mut self, windows: Vec<usize>) -> Self {
        self.config.features.rolling_windows = windows;
        self
    }

    /// Target metric and forecast horizons; the first horizon is primary.
    pub fn target(mut self, metric: impl Into<String>, horizons: Vec<usize>) -> Self {
        self.config.sliding_window.target_metric = metric.into();
        self.config.sliding_window.forecast_steps = horizons;
        self
    }

    /// Sequence length and stride.
    pub fn window(mut self, sequence_length: usize, stride: usize) -> Self {
        self.config.sliding_window.sequence_length = sequence_length;
        self.config.sliding_window.stride = stride;
        self
    }

    /// Chronological split ratios.
    pub fn splits(mut self, train: f64, validation: f64, test: f64) -> Self {
        self.config.splits = DatasetSplitConfig::new(train, validation, test);
        self
    }

    /// Columns to standardize (empty = raw metrics).
    pub fn scaler_features<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.scaler_features = names.into_iter().map(Into::into).collect();
        self
    }

    /// Rows used to fit the scaler.
    pub fn scaler_fit_scope(mut self, scope: ScalerFitScope) -> Self {
        self.config.scaler_fit_scope = scope;
        self
    }

    // =========================================================================
    // Output
    // =========================================================================

    /// Output directory.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = crate::config::expand_home(&dir.into());
        self
    }

    // =========================================================================
    // Build
    // =========================================================================

    /// Validate and return the configuration.
    pub fn build_config(self) -> Result<PreprocessorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Build a ready-to-run [`Pipeline`].
    pub fn build(self) -> Result<Pipeline> {
        Pipeline::new(self.build_config()?)
    }

    /// Derived columns per the current configuration, before targets.
    pub fn derived_column_count(&self) -> usize {
        self.config.features.derived_column_count(self.config.metrics.len())
    }

    /// Get a summary of the current configuration.
    pub fn summary(&self) -> String {
        let c = &self.config;
        format!(
            "PipelineBuilder Summary:\n\
             - Metrics: {}\n\
             - Resample: {} ({:?})\n\
             - Derived columns: {}\n\
             - Anomaly filter: {}\n\
             - Target: {} @ {:?}\n\
             - Window: {} rows, stride {}\n\
             - Splits: {}/{}/{}\n\
             - Scaler fit: {}",
            c.metrics.join(", "),
            c.resample_rule,
            c.interpolation_method,
            self.derived_column_count(),
            if c.anomaly.enabled {
                format!("|z| <= {}", c.anomaly.zscore_threshold)
            } else {
                "disabled".to_string()
            },
            c.sliding_window.target_metric,
            c.sliding_window.forecast_steps,
            c.sliding_window.sequence_length,
            c.sliding_window.stride,
            c.splits.train,
            c.splits.validation,
            c.splits.test,
            c.scaler_fit_scope.as_str(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrepError;

    #[test]
    fn test_builder_default() {
        let config = PipelineBuilder::new().build_config().unwrap();
        assert_eq!(config, PreprocessorConfig::default());
    }

    #[test]
    fn test_builder_overrides() {
        let config = PipelineBuilder::new()
            .input_glob("in/*.csv")
            .metrics(["cpu", "mem"])
            .resample("30s")
            .lags(vec![2])
            .rolling_windows(vec![4])
            .time_features(false)
            .target("cpu", vec![3, 6])
            .window(10, 2)
            .splits(0.6, 0.2, 0.2)
            .scaler_fit_scope(ScalerFitScope::TrainOnly)
            .build_config()
            .unwrap();

        assert_eq!(config.input_glob, "in/*.csv");
        assert_eq!(config.metrics, vec!["cpu", "mem"]);
        assert_eq!(config.resample_rule, "30s");
        assert_eq!(config.features.lags, vec![2]);
        assert!(!config.features.enable_time_features);
        assert_eq!(config.sliding_window.forecast_steps, vec![3, 6]);
        assert_eq!(config.sliding_window.stride, 2);
        assert!((config.splits.train - 0.6).abs() < 1e-10);
        assert_eq!(config.scaler_fit_scope, ScalerFitScope::TrainOnly);
    }

    #[test]
    fn test_builder_rejects_invalid() {
        let err = PipelineBuilder::new().splits(0.5, 0.5, 0.5).build_config().unwrap_err();
        assert!(matches!(err, PrepError::InvalidSplitConfig { .. }));

        let err = PipelineBuilder::new().window(0, 1).build_config().unwrap_err();
        assert!(err.is_config_error());

        let err = PipelineBuilder::new()
            .metrics(Vec::<String>::new())
            .build_config()
            .unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_builder_summary() {
        let builder = PipelineBuilder::new().metrics(["cpu"]).without_anomaly_filter();
        // 4 calendar + 3 lags + 2 rolling
        assert_eq!(builder.derived_column_count(), 9);
        let summary = builder.summary();
        assert!(summary.contains("Anomaly filter: disabled"));
        assert!(summary.contains("full_dataset"));
    }
}

//! Pipeline configuration management.
//!
//! This module provides the single configuration object for a preprocessing
//! run. It is constructed once (from a file or programmatically) and passed by
//! value into [`Pipeline::new`](crate::Pipeline::new); no stage reads any
//! ambient or global setting.
//!
//! # Features
//!
//! - **Defaults**: Every field has a default, so partial files are valid
//! - **Formats**: YAML, TOML or JSON, chosen by file extension
//! - **Validation**: Checked on load and again before a run touches any file
//! - **Home expansion**: A leading `~` in `output_dir` expands to `$HOME`
//!
//! # Example
//!
//! ```ignore
//! use metrics_preprocessor::PreprocessorConfig;
//!
//! // Load (format from extension) and validate
//! let config = PreprocessorConfig::load("configs/preprocess.yaml")?;
//!
//! // Write a starter file
//! PreprocessorConfig::default().save("configs/default.toml")?;
//! ```

use crate::error::{PrepError, Result};
use crate::features::FeatureConfig;
use crate::preprocessing::{parse_period, AnomalyConfig, ScalerFitScope};
use crate::schema::{CalendarField, ColumnDef, DatasetSchema, TIMESTAMP_COLUMN};
use crate::sequence_builder::SlidingWindowConfig;
use crate::split::DatasetSplitConfig;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Gap-filling method used by the resampler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    /// Linear in elapsed time between the surrounding valid values
    #[default]
    Time,

    /// Linear in row position between the surrounding valid values
    Linear,
}

/// Configuration file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.yaml` / `.yml`
    Yaml,
    /// `.toml`
    Toml,
    /// `.json`
    Json,
}

impl ConfigFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            _ => Err(PrepError::config(format!(
                "Unsupported config extension for {} (expected .yaml, .yml, .toml or .json)",
                path.display()
            ))),
        }
    }
}

/// Unified preprocessing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessorConfig {
    /// Glob pattern for raw input CSV files
    pub input_glob: String,

    /// Header of the timestamp column in raw files
    pub timestamp_column: String,

    /// Header of the metric-name column in raw files
    pub metric_column: String,

    /// Header of the value column in raw files
    pub value_column: String,

    /// Directory for all output artifacts
    #[serde(deserialize_with = "deserialize_output_dir")]
    pub output_dir: PathBuf,

    /// Resampling period, e.g. `1min`
    pub resample_rule: String,

    /// Gap-filling method for resampling
    pub interpolation_method: InterpolationMethod,

    /// Column names to standardize (empty = raw metric columns)
    pub scaler_features: Vec<String>,

    /// Rows used to fit the scaler
    pub scaler_fit_scope: ScalerFitScope,

    /// Metric names to keep from the raw input
    pub metrics: Vec<String>,

    /// Feature engineering
    pub features: FeatureConfig,

    /// Anomaly filtering
    pub anomaly: AnomalyConfig,

    /// Sequence windows and targets
    pub sliding_window: SlidingWindowConfig,

    /// Chronological split ratios
    pub splits: DatasetSplitConfig,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            input_glob: "data/raw/*.csv".to_string(),
            timestamp_column: "timestamp".to_string(),
            metric_column: "metric".to_string(),
            value_column: "value".to_string(),
            output_dir: PathBuf::from("data/processed"),
            resample_rule: "1min".to_string(),
            interpolation_method: InterpolationMethod::Time,
            scaler_features: Vec::new(),
            scaler_fit_scope: ScalerFitScope::FullDataset,
            metrics: vec![
                "cpu_metrics".to_string(),
                "memory_metrics".to_string(),
                "request_rate".to_string(),
            ],
            features: FeatureConfig::default(),
            anomaly: AnomalyConfig::default(),
            sliding_window: SlidingWindowConfig::default(),
            splits: DatasetSplitConfig::default(),
        }
    }
}

fn deserialize_output_dir<'de, D>(deserializer: D) -> std::result::Result<PathBuf, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = PathBuf::deserialize(deserializer)?;
    Ok(expand_home(&raw))
}

/// Expand a leading `~` to the user's home directory.
///
/// Paths without a leading `~`, or with no `HOME` set, are returned as-is.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

impl PreprocessorConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parsed resampling period.
    pub fn resample_period(&self) -> Result<chrono::Duration> {
        parse_period(&self.resample_rule).map_err(PrepError::Config)
    }

    /// Validate the configuration.
    ///
    /// Fails with [`PrepError::Config`] or [`PrepError::InvalidSplitConfig`].
    pub fn validate(&self) -> Result<()> {
        if self.input_glob.trim().is_empty() {
            return Err(PrepError::config("input_glob must not be empty"));
        }
        for (field, value) in [
            ("timestamp_column", &self.timestamp_column),
            ("metric_column", &self.metric_column),
            ("value_column", &self.value_column),
        ] {
            if value.trim().is_empty() {
                return Err(PrepError::config(format!("{field} must not be empty")));
            }
        }
        if self.metrics.is_empty() {
            return Err(PrepError::config("metrics must not be empty"));
        }
        if let Some(dup) = self
            .metrics
            .iter()
            .enumerate()
            .find(|(i, m)| self.metrics[..*i].contains(m))
            .map(|(_, m)| m)
        {
            return Err(PrepError::config(format!("metrics lists '{dup}' twice")));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(PrepError::config("output_dir must not be empty"));
        }

        self.resample_period()?;
        self.features.validate()?;
        self.anomaly.validate()?;
        self.sliding_window.validate()?;
        self.splits.validate()?;

        if !self.metrics.contains(&self.sliding_window.target_metric) {
            return Err(PrepError::config(format!(
                "sliding_window.target_metric '{}' is not one of the configured metrics",
                self.sliding_window.target_metric
            )));
        }

        DatasetSchema::from_defs(&self.planned_columns()).map_err(|e| {
            PrepError::config(format!("metric names collide with derived columns: {e}"))
        })?;
        Ok(())
    }

    /// Every column the pipeline can produce for this configuration, plus
    /// the exported timestamp column.
    pub fn planned_columns(&self) -> Vec<ColumnDef> {
        let mut defs = vec![ColumnDef::metric(TIMESTAMP_COLUMN)];
        defs.extend(self.metrics.iter().map(ColumnDef::metric));
        if self.features.enable_time_features {
            defs.extend(CalendarField::all().iter().copied().map(ColumnDef::Calendar));
        }
        for metric in &self.metrics {
            defs.extend(self.features.lags.iter().map(|&lag| ColumnDef::lag(metric, lag)));
        }
        for metric in &self.metrics {
            defs.extend(
                self.features
                    .rolling_windows
                    .iter()
                    .map(|&window| ColumnDef::rolling_mean(metric, window)),
            );
        }
        let target = &self.sliding_window.target_metric;
        defs.extend(
            self.sliding_window
                .forecast_steps
                .iter()
                .map(|&horizon| ColumnDef::target(target, horizon)),
        );
        defs
    }

    /// Parse configuration text in the given format and validate it.
    pub fn from_str_format(contents: &str, format: ConfigFormat) -> Result<Self> {
        if contents.trim().is_empty() {
            return Err(PrepError::config("Preprocessor config is empty"));
        }
        let config: PreprocessorConfig = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(contents)
                .map_err(|e| PrepError::config(format!("malformed YAML: {e}")))?,
            ConfigFormat::Toml => toml::from_str(contents)
                .map_err(|e| PrepError::config(format!("malformed TOML: {e}")))?,
            ConfigFormat::Json => serde_json::from_str(contents)
                .map_err(|e| PrepError::config(format!("malformed JSON: {e}")))?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, picking the format from the file extension.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let config = PreprocessorConfig::load("configs/preprocess.yaml")?;
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let contents = fs::read_to_string(path)?;
        Self::from_str_format(&contents, format)
    }

    /// Load configuration from a YAML file.
    pub fn load_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_str_format(&fs::read_to_string(path)?, ConfigFormat::Yaml)
    }

    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_str_format(&fs::read_to_string(path)?, ConfigFormat::Toml)
    }

    /// Load configuration from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_str_format(&fs::read_to_string(path)?, ConfigFormat::Json)
    }

    /// Save configuration, picking the format from the file extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        match ConfigFormat::from_path(path)? {
            ConfigFormat::Yaml => self.save_yaml(path),
            ConfigFormat::Toml => self.save_toml(path),
            ConfigFormat::Json => self.save_json(path),
        }
    }

    /// Save configuration to a YAML file.
    pub fn save_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Save configuration to a JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

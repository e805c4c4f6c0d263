//! Error types for the preprocessing pipeline.
//!
//! Errors fall into three groups:
//!
//! - **Configuration**: raised by [`PreprocessorConfig::validate`](crate::PreprocessorConfig::validate)
//!   before any file is touched. Not retryable without fixing the config.
//! - **Input**: missing files, columns, or unparsable cells. The run aborts.
//! - **Infrastructure**: IO and encoder failures, wrapped via `#[from]`.
//!
//! Data-quality conditions (empty splits, short series) are *not* errors.
//! They are reported through [`ValidationResult`](crate::ValidationResult).

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PrepError>;

/// Errors produced by the preprocessing pipeline.
#[derive(Debug, Error)]
pub enum PrepError {
    /// Malformed or semantically invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Split ratios outside (0, 1) or not summing to 1.0.
    #[error("Invalid split configuration: train={train} validation={validation} test={test} (must each be in (0, 1) and sum to 1.0)")]
    InvalidSplitConfig {
        /// Train ratio
        train: f64,
        /// Validation ratio
        validation: f64,
        /// Test ratio
        test: f64,
    },

    /// Input glob matched nothing.
    #[error("No input files matched glob: {pattern}")]
    NoInputFiles {
        /// The glob pattern that was searched
        pattern: String,
    },

    /// A required column is missing from an input file or a frame.
    #[error("Missing column '{column}' in {source_name}")]
    MissingColumn {
        /// Name of the missing column
        column: String,
        /// File path or frame description
        source_name: String,
    },

    /// A timestamp cell could not be parsed.
    #[error("Unparsable timestamp '{value}' in {}", .path.display())]
    InvalidTimestamp {
        /// Raw cell contents
        value: String,
        /// File the cell came from
        path: PathBuf,
    },

    /// A value cell could not be parsed as f64.
    #[error("Unparsable value '{value}' in {}", .path.display())]
    InvalidValue {
        /// Raw cell contents
        value: String,
        /// File the cell came from
        path: PathBuf,
    },

    /// Naive and zoned timestamps were mixed within one run.
    #[error("Input mixes timezone-naive and timezone-aware timestamps (first naive value: '{naive}', first zoned value: '{zoned}')")]
    MixedTimezones {
        /// First naive timestamp seen
        naive: String,
        /// First zoned timestamp seen
        zoned: String,
    },

    /// The configured target metric never appears in the input.
    #[error("Target metric '{0}' not present in loaded data")]
    MissingTargetMetric(String),

    /// A frame invariant was violated (length mismatch, unordered index, duplicate column).
    #[error("Frame error: {0}")]
    Frame(String),

    /// Array shape construction failed.
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Glob pattern error.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// Glob iteration error (unreadable directory entry).
    #[error("Glob entry error: {0}")]
    GlobEntry(#[from] glob::GlobError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML serialization error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// `.npy` encoding error.
    #[error("NPY write error: {0}")]
    Npy(#[from] ndarray_npy::WriteNpyError),

    /// `.npz` container error.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl PrepError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a missing-column error.
    pub fn missing_column(column: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
            source_name: source_name.into(),
        }
    }

    /// True for errors raised by configuration validation.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::InvalidSplitConfig { .. })
    }
}

impl From<String> for PrepError {
    fn from(message: String) -> Self {
        Self::Config(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PrepError::NoInputFiles {
            pattern: "data/raw/*.csv".to_string(),
        };
        assert_eq!(err.to_string(), "No input files matched glob: data/raw/*.csv");

        let err = PrepError::missing_column("metric", "raw.csv");
        assert_eq!(err.to_string(), "Missing column 'metric' in raw.csv");

        let err = PrepError::InvalidSplitConfig {
            train: 0.5,
            validation: 0.5,
            test: 0.5,
        };
        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn test_config_error_classification() {
        assert!(PrepError::config("metrics must not be empty").is_config_error());
        assert!(PrepError::InvalidSplitConfig {
            train: 0.7,
            validation: 0.2,
            test: 0.2
        }
        .is_config_error());
        assert!(!PrepError::MissingTargetMetric("cpu".to_string()).is_config_error());
    }

    #[test]
    fn test_string_lifts_to_config_error() {
        let err: PrepError = "stride must be > 0".to_string().into();
        assert!(matches!(err, PrepError::Config(ref m) if m == "stride must be > 0"));
    }
}

//! Dataset Validation Module
//!
//! Data-quality checks run by the pipeline on the processed dataset. None of
//! these conditions abort a run; they are collected into a
//! [`ValidationResult`] returned alongside the outputs.
//!
//! # Validation Categories
//!
//! 1. **Index**: Strictly increasing timestamps, uniform cadence
//! 2. **Values**: Remaining nulls, NaN/Inf, all-null columns
//! 3. **Splits**: Empty dataset, splits too short for one sequence
//!
//! # Usage
//!
//! ```ignore
//! use metrics_preprocessor::validation::DatasetValidator;
//!
//! let validator = DatasetValidator::new().with_expected_period(period);
//! let result = validator.validate_frame(&frame);
//!
//! if !result.is_valid() {
//!     for warning in result.warnings() {
//!         println!("Warning: {}", warning);
//!     }
//! }
//! ```

use crate::frame::{TimeFrame, Timestamp};
use crate::split::{SplitKind, SplitRanges};
use chrono::Duration;
use std::fmt;

/// Validation result for a single check.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    /// Data is valid
    Valid,
    /// Data has minor issues (warnings)
    Warning(String),
    /// Data has serious issues (errors)
    Error(String),
}

impl ValidationLevel {
    /// Check if this result indicates valid data.
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationLevel::Valid)
    }

    /// Check if this result is a warning.
    pub fn is_warning(&self) -> bool {
        matches!(self, ValidationLevel::Warning(_))
    }

    /// Check if this result is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, ValidationLevel::Error(_))
    }
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationLevel::Valid => write!(f, "Valid"),
            ValidationLevel::Warning(msg) => write!(f, "Warning: {msg}"),
            ValidationLevel::Error(msg) => write!(f, "Error: {msg}"),
        }
    }
}

/// Aggregated validation result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    results: Vec<(String, ValidationLevel)>,
}

impl ValidationResult {
    /// Create a new empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validation result.
    pub fn add(&mut self, check_name: &str, level: ValidationLevel) {
        self.results.push((check_name.to_string(), level));
    }

    /// Append every check of `other`.
    pub fn merge(&mut self, other: ValidationResult) {
        self.results.extend(other.results);
    }

    /// Check if all validations passed (no errors or warnings).
    pub fn is_valid(&self) -> bool {
        self.results.iter().all(|(_, level)| level.is_valid())
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.results.iter().any(|(_, level)| level.is_error())
    }

    /// Check if there are any warnings.
    pub fn has_warnings(&self) -> bool {
        self.results.iter().any(|(_, level)| level.is_warning())
    }

    /// All warnings as `check: message`.
    pub fn warnings(&self) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|(name, level)| match level {
                ValidationLevel::Warning(msg) => Some(format!("{name}: {msg}")),
                _ => None,
            })
            .collect()
    }

    /// All errors as `check: message`.
    pub fn errors(&self) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|(name, level)| match level {
                ValidationLevel::Error(msg) => Some(format!("{name}: {msg}")),
                _ => None,
            })
            .collect()
    }

    /// Level recorded for `check_name`, if that check ran.
    pub fn level(&self, check_name: &str) -> Option<&ValidationLevel> {
        self.results
            .iter()
            .find(|(name, _)| name == check_name)
            .map(|(_, level)| level)
    }

    /// Get all results.
    pub fn all_results(&self) -> &[(String, ValidationLevel)] {
        &self.results
    }

    /// Get the number of checks performed.
    pub fn check_count(&self) -> usize {
        self.results.len()
    }

    /// Get the number of passed checks.
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|(_, l)| l.is_valid()).count()
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let passed = self.passed_count();
        let total = self.check_count();
        writeln!(f, "Validation: {passed}/{total} checks passed")?;

        for (name, level) in &self.results {
            if !level.is_valid() {
                writeln!(f, "  - {name}: {level}")?;
            }
        }

        Ok(())
    }
}

/// Which checks the validator runs.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Expected spacing between consecutive rows, if uniform
    pub expected_period: Option<Duration>,

    /// Minimum rows a split needs (usually the sequence length)
    pub min_split_rows: usize,

    /// Check for remaining nulls
    pub check_nulls: bool,

    /// Check for NaN/Inf values
    pub check_nan_inf: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            expected_period: None,
            min_split_rows: 1,
            check_nulls: true,
            check_nan_inf: true,
        }
    }
}

/// Data-quality validator for processed datasets.
#[derive(Debug, Clone, Default)]
pub struct DatasetValidator {
    config: ValidationConfig,
}

impl DatasetValidator {
    /// Create a new validator with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator with custom configuration.
    pub fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Check that rows are exactly `period` apart.
    pub fn with_expected_period(mut self, period: Duration) -> Self {
        self.config.expected_period = Some(period);
        self
    }

    /// Warn about splits with fewer than `rows` rows.
    pub fn with_min_split_rows(mut self, rows: usize) -> Self {
        self.config.min_split_rows = rows;
        self
    }

    /// Validate the index and values of a frame.
    pub fn validate_frame(&self, frame: &TimeFrame) -> ValidationResult {
        let mut result = validate_timestamps(frame.index(), self.config.expected_period);

        if frame.is_empty() {
            result.add(
                "dataset_rows",
                ValidationLevel::Warning("Dataset has no rows".to_string()),
            );
            return result;
        }
        result.add("dataset_rows", ValidationLevel::Valid);

        let all_null: Vec<String> = frame
            .columns()
            .iter()
            .filter(|c| c.is_all_null())
            .map(|c| c.def.name())
            .collect();
        if all_null.is_empty() {
            result.add("all_null_columns", ValidationLevel::Valid);
        } else {
            result.add(
                "all_null_columns",
                ValidationLevel::Warning(format!("All-null columns: {}", all_null.join(", "))),
            );
        }

        if self.config.check_nulls {
            let nulls = frame.null_count();
            if nulls > 0 {
                result.add(
                    "null_values",
                    ValidationLevel::Warning(format!("{nulls} null cells remain")),
                );
            } else {
                result.add("null_values", ValidationLevel::Valid);
            }
        }

        if self.config.check_nan_inf {
            self.validate_finite(frame, &mut result);
        }

        result
    }

    /// Validate split sizes against the minimum row count.
    pub fn validate_splits(&self, ranges: &SplitRanges) -> ValidationResult {
        let mut result = ValidationResult::new();

        for &kind in SplitKind::all() {
            let rows = ranges.get(kind).len();
            let check = format!("{kind}_split_rows");
            if rows == 0 {
                result.add(&check, ValidationLevel::Warning(format!("{kind} split is empty")));
            } else if rows < self.config.min_split_rows {
                result.add(
                    &check,
                    ValidationLevel::Warning(format!(
                        "{kind} split has {rows} rows, fewer than {} needed for one sequence",
                        self.config.min_split_rows
                    )),
                );
            } else {
                result.add(&check, ValidationLevel::Valid);
            }
        }

        result
    }

    fn validate_finite(&self, frame: &TimeFrame, result: &mut ValidationResult) {
        let mut found = false;
        for column in frame.columns() {
            let bad = column
                .values
                .iter()
                .flatten()
                .filter(|v| !v.is_finite())
                .count();
            if bad > 0 {
                found = true;
                result.add(
                    &format!("finite_{}", column.def.name()),
                    ValidationLevel::Error(format!("{bad} NaN/Inf values")),
                );
            }
        }

        if !found {
            result.add("nan_inf_check", ValidationLevel::Valid);
        }
    }
}

/// Validate a timestamp index for strict monotonicity and, optionally, a
/// uniform spacing of `expected_period`.
pub fn validate_timestamps(timestamps: &[Timestamp], expected_period: Option<Duration>) -> ValidationResult {
    let mut result = ValidationResult::new();

    if timestamps.is_empty() {
        result.add(
            "timestamps",
            ValidationLevel::Warning("No timestamps to validate".to_string()),
        );
        return result;
    }

    match timestamps.windows(2).position(|w| w[1] <= w[0]) {
        Some(i) => result.add(
            "timestamp_ordering",
            ValidationLevel::Error(format!(
                "Non-increasing timestamp at index {}: {} <= {}",
                i + 1,
                timestamps[i + 1],
                timestamps[i]
            )),
        ),
        None => result.add("timestamp_ordering", ValidationLevel::Valid),
    }

    if let Some(period) = expected_period {
        let irregular = timestamps
            .windows(2)
            .filter(|w| w[1] - w[0] != period)
            .count();
        if irregular > 0 {
            result.add(
                "timestamp_cadence",
                ValidationLevel::Warning(format!(
                    "{irregular} gaps differ from the {}s period",
                    period.num_milliseconds() as f64 / 1000.0
                )),
            );
        } else {
            result.add("timestamp_cadence", ValidationLevel::Valid);
        }
    }

    result
}

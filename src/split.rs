//! Chronological train/validation/test splitting.
//!
//! Rows are partitioned by position into three contiguous blocks, never
//! shuffled:
//!
//! ```text
//! train_end = floor(n * train)
//! val_end   = floor(n * (train + validation))
//!
//! [0, train_end) | [train_end, val_end) | [val_end, n)
//!      train            validation            test
//! ```
//!
//! The three blocks cover every row exactly once and keep time order across
//! the boundaries. An empty dataset yields three empty splits.

use crate::error::{PrepError, Result};
use crate::frame::TimeFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Tolerance for the ratio sum.
pub const SPLIT_SUM_TOLERANCE: f64 = 1e-6;

// ============================================================================
// Split Configuration
// ============================================================================

/// Split ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSplitConfig {
    /// Fraction of rows for training, in (0, 1)
    pub train: f64,

    /// Fraction of rows for validation, in (0, 1)
    pub validation: f64,

    /// Fraction of rows for testing, in (0, 1)
    pub test: f64,
}

impl Default for DatasetSplitConfig {
    fn default() -> Self {
        Self {
            train: 0.7,
            validation: 0.15,
            test: 0.15,
        }
    }
}

impl DatasetSplitConfig {
    /// Create a split configuration.
    pub fn new(train: f64, validation: f64, test: f64) -> Self {
        Self {
            train,
            validation,
            test,
        }
    }

    /// Sum of the three ratios.
    pub fn total(&self) -> f64 {
        self.train + self.validation + self.test
    }

    /// Validate ratios: each in (0, 1), summing to 1.0 within tolerance.
    pub fn validate(&self) -> Result<()> {
        let in_range = |r: f64| r > 0.0 && r < 1.0;
        let valid = in_range(self.train)
            && in_range(self.validation)
            && in_range(self.test)
            && (self.total() - 1.0).abs() <= SPLIT_SUM_TOLERANCE;

        if valid {
            Ok(())
        } else {
            Err(PrepError::InvalidSplitConfig {
                train: self.train,
                validation: self.validation,
                test: self.test,
            })
        }
    }
}

// ============================================================================
// Split Kinds
// ============================================================================

/// One of the three chronological splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitKind {
    /// Earliest rows
    Train,
    /// Middle rows
    Validation,
    /// Latest rows
    Test,
}

impl SplitKind {
    /// All splits in chronological order.
    pub fn all() -> &'static [SplitKind] {
        &[SplitKind::Train, SplitKind::Validation, SplitKind::Test]
    }

    /// File-name stem.
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitKind::Train => "train",
            SplitKind::Validation => "validation",
            SplitKind::Test => "test",
        }
    }
}

impl fmt::Display for SplitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Splitter
// ============================================================================

/// Row ranges of the three splits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitRanges {
    /// Train rows
    pub train: Range<usize>,
    /// Validation rows
    pub validation: Range<usize>,
    /// Test rows
    pub test: Range<usize>,
}

impl SplitRanges {
    /// Range for one split.
    pub fn get(&self, kind: SplitKind) -> Range<usize> {
        match kind {
            SplitKind::Train => self.train.clone(),
            SplitKind::Validation => self.validation.clone(),
            SplitKind::Test => self.test.clone(),
        }
    }

    /// Total rows covered.
    pub fn total(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }
}

/// Chronological splitter.
#[derive(Debug, Clone)]
pub struct Splitter {
    config: DatasetSplitConfig,
}

impl Splitter {
    /// Create a splitter, validating the ratios.
    pub fn new(config: DatasetSplitConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Compute split ranges for `n` rows.
    pub fn ranges(&self, n: usize) -> SplitRanges {
        let train_end = floor_fraction(n, self.config.train);
        let val_end = floor_fraction(n, self.config.train + self.config.validation).max(train_end);

        SplitRanges {
            train: 0..train_end,
            validation: train_end..val_end,
            test: val_end..n,
        }
    }

    /// Split `frame` into `(kind, slice)` pairs in chronological order.
    pub fn split(&self, frame: &TimeFrame) -> Vec<(SplitKind, TimeFrame)> {
        let ranges = self.ranges(frame.len());
        SplitKind::all()
            .iter()
            .map(|&kind| (kind, frame.slice_rows(ranges.get(kind))))
            .collect()
    }
}

fn floor_fraction(n: usize, ratio: f64) -> usize {
    // Absorb representation error such as 100 * 0.85 = 84.999...
    let raw = (n as f64 * ratio + 1e-9).floor();
    (raw.max(0.0) as usize).min(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sizes() {
        let splitter = Splitter::new(DatasetSplitConfig::default()).unwrap();

        let r = splitter.ranges(100);
        assert_eq!((r.train.len(), r.validation.len(), r.test.len()), (70, 15, 15));

        let r = splitter.ranges(197);
        assert_eq!(r.train, 0..137);
        assert_eq!(r.validation, 137..167);
        assert_eq!(r.test, 167..197);
    }

    #[test]
    fn test_split_covers_every_row() {
        let splitter = Splitter::new(DatasetSplitConfig::new(0.6, 0.25, 0.15)).unwrap();
        for n in 0..300 {
            let r = splitter.ranges(n);
            assert_eq!(r.total(), n);
            assert_eq!(r.train.start, 0);
            assert_eq!(r.train.end, r.validation.start);
            assert_eq!(r.validation.end, r.test.start);
            assert_eq!(r.test.end, n);
        }
    }

    #[test]
    fn test_empty_dataset() {
        let splitter = Splitter::new(DatasetSplitConfig::default()).unwrap();
        let splits = splitter.split(&TimeFrame::default());
        assert_eq!(splits.len(), 3);
        assert!(splits.iter().all(|(_, f)| f.is_empty()));
    }

    #[test]
    fn test_invalid_ratios_rejected() {
        assert!(DatasetSplitConfig::new(0.5, 0.5, 0.5).validate().is_err());
        assert!(DatasetSplitConfig::new(0.8, 0.2, 0.0).validate().is_err());
        assert!(DatasetSplitConfig::new(1.0, 0.0, 0.0).validate().is_err());
        assert!(DatasetSplitConfig::new(0.7, 0.15, 0.1500001).validate().is_ok());
        assert!(DatasetSplitConfig::new(0.7, 0.15, 0.16).validate().is_err());

        let err = Splitter::new(DatasetSplitConfig::new(0.7, 0.2, 0.2)).unwrap_err();
        assert!(matches!(err, PrepError::InvalidSplitConfig { .. }));
    }

    #[test]
    fn test_split_kind_names() {
        let names: Vec<&str> = SplitKind::all().iter().map(SplitKind::as_str).collect();
        assert_eq!(names, vec!["train", "validation", "test"]);
        assert!(SplitKind::Train < SplitKind::Test);
    }
}

//! Sliding-window sequence building.
//!
//! Slides a window of `sequence_length` consecutive rows with step `stride`
//! over one split's feature columns:
//!
//! ```text
//! rows:     0 1 2 3 4 5 6 7
//! L=4 S=2:  [0 1 2 3]
//!               [2 3 4 5]
//!                   [4 5 6 7]
//! ```
//!
//! Each window is paired with the primary target value and the timestamp of
//! its **last** row. The number of windows for `R` rows is
//! `max(0, floor((R - L) / S) + 1)`; a split shorter than `L` yields an
//! empty but well-shaped batch `[0, L, F]`.
//!
//! Windows never cross split boundaries because the builder is invoked once
//! per split frame.

use crate::error::{PrepError, Result};
use crate::frame::{TimeFrame, Timestamp};
use crate::schema::ColumnDef;
use ndarray::{Array1, Array3};
use serde::{Deserialize, Serialize};

// ============================================================================
// Configuration
// ============================================================================

/// Sliding-window and target configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlidingWindowConfig {
    /// Rows per sequence (L)
    pub sequence_length: usize,

    /// Target horizons in samples; the first is the primary horizon
    pub forecast_steps: Vec<usize>,

    /// Rows between consecutive window starts (S)
    pub stride: usize,

    /// Metric whose future value is forecast
    pub target_metric: String,
}

impl Default for SlidingWindowConfig {
    fn default() -> Self {
        Self {
            sequence_length: 30,
            forecast_steps: vec![5, 15, 30],
            stride: 1,
            target_metric: "cpu_metrics".to_string(),
        }
    }
}

impl SlidingWindowConfig {
    /// Create a configuration.
    pub fn new(sequence_length: usize, forecast_steps: Vec<usize>, target_metric: impl Into<String>) -> Self {
        Self {
            sequence_length,
            forecast_steps,
            target_metric: target_metric.into(),
            ..Default::default()
        }
    }

    /// Set the stride.
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    /// Primary horizon (first forecast step).
    pub fn primary_horizon(&self) -> Option<usize> {
        self.forecast_steps.first().copied()
    }

    /// Primary target column.
    pub fn primary_target(&self) -> Option<ColumnDef> {
        self.primary_horizon()
            .map(|h| ColumnDef::target(self.target_metric.as_str(), h))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.sequence_length == 0 {
            return Err("sliding_window.sequence_length must be > 0".to_string());
        }
        if self.stride == 0 {
            return Err("sliding_window.stride must be > 0".to_string());
        }
        if self.forecast_steps.is_empty() {
            return Err("sliding_window.forecast_steps must not be empty".to_string());
        }
        if self.forecast_steps.contains(&0) {
            return Err("sliding_window.forecast_steps must all be > 0".to_string());
        }
        if self
            .forecast_steps
            .iter()
            .enumerate()
            .any(|(i, h)| self.forecast_steps[..i].contains(h))
        {
            return Err(format!(
                "sliding_window.forecast_steps contains duplicates: {:?}",
                self.forecast_steps
            ));
        }
        if self.target_metric.trim().is_empty() {
            return Err("sliding_window.target_metric must not be empty".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// Output
// ============================================================================

/// Sequence tensors for one split.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceBatch {
    /// `[N, L, F]` feature windows
    pub sequences: Array3<f64>,

    /// `[N]` primary target at each window's last row
    pub targets: Array1<f64>,

    /// Time of each window's last row
    pub timestamps: Vec<Timestamp>,

    /// Names of the F feature columns, in tensor order
    pub feature_columns: Vec<String>,

    /// Name of the primary target column
    pub target_column: String,
}

impl SequenceBatch {
    /// Number of sequences (N).
    #[inline]
    pub fn len(&self) -> usize {
        self.sequences.shape()[0]
    }

    /// True if the batch holds no sequences.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Window length (L).
    pub fn sequence_length(&self) -> usize {
        self.sequences.shape()[1]
    }

    /// Feature count (F).
    pub fn feature_count(&self) -> usize {
        self.sequences.shape()[2]
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Number of windows of length `length` with step `stride` over `rows` rows.
///
/// # Example
///
/// ```
/// use metrics_preprocessor::sequence_builder::sequence_count;
///
/// assert_eq!(sequence_count(10, 5, 1), 6);
/// assert_eq!(sequence_count(10, 5, 2), 3);
/// assert_eq!(sequence_count(4, 5, 1), 0);
/// ```
#[inline]
pub fn sequence_count(rows: usize, length: usize, stride: usize) -> usize {
    if length == 0 || stride == 0 || rows < length {
        return 0;
    }
    (rows - length) / stride + 1
}

/// Builds [`SequenceBatch`]es from split frames.
#[derive(Debug, Clone)]
pub struct SequenceBuilder {
    sequence_length: usize,
    stride: usize,
}

impl SequenceBuilder {
    /// Create a builder for windows of `sequence_length` rows, step `stride`.
    pub fn new(sequence_length: usize, stride: usize) -> Self {
        Self {
            sequence_length,
            stride,
        }
    }

    /// Create a builder from the sliding-window configuration.
    pub fn from_config(config: &SlidingWindowConfig) -> Self {
        Self::new(config.sequence_length, config.stride)
    }

    /// Expected number of sequences for a split of `rows` rows.
    pub fn expected_count(&self, rows: usize) -> usize {
        sequence_count(rows, self.sequence_length, self.stride)
    }

    /// Slide the window over `frame`.
    ///
    /// `features` are packed in the given order along the last tensor axis.
    /// Nulls become NaN.
    ///
    /// # Errors
    ///
    /// [`PrepError::MissingColumn`] if `target` or any feature column is not
    /// in the frame.
    pub fn build(
        &self,
        frame: &TimeFrame,
        features: &[ColumnDef],
        target: &ColumnDef,
    ) -> Result<SequenceBatch> {
        let target_values = frame
            .values(target)
            .ok_or_else(|| PrepError::missing_column(target.name(), "dataset split"))?;

        let positions = features
            .iter()
            .map(|def| {
                frame
                    .position(def)
                    .ok_or_else(|| PrepError::missing_column(def.name(), "dataset split"))
            })
            .collect::<Result<Vec<usize>>>()?;

        let (l, f) = (self.sequence_length, positions.len());
        let n = self.expected_count(frame.len());
        let matrix = frame.to_array(&positions);

        let mut data = Vec::with_capacity(n * l * f);
        let mut targets = Vec::with_capacity(n);
        let mut timestamps = Vec::with_capacity(n);

        for start in (0..n).map(|i| i * self.stride) {
            let end = start + l;
            data.extend(matrix.slice(ndarray::s![start..end, ..]).iter().copied());
            targets.push(target_values[end - 1].unwrap_or(f64::NAN));
            timestamps.push(frame.index()[end - 1]);
        }

        Ok(SequenceBatch {
            sequences: Array3::from_shape_vec((n, l, f), data)?,
            targets: Array1::from_vec(targets),
            timestamps,
            feature_columns: features.iter().map(ColumnDef::name).collect(),
            target_column: target.name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn frame(n: usize) -> TimeFrame {
        let index = (0..n as i64)
            .map(|m| Utc.timestamp_opt(1_704_067_200 + m * 60, 0).unwrap())
            .collect();
        let mut frame = TimeFrame::new(index).unwrap();
        frame
            .push_column(ColumnDef::metric("cpu"), (0..n).map(|i| Some(i as f64)).collect())
            .unwrap();
        frame
            .push_column(
                ColumnDef::metric("mem"),
                (0..n).map(|i| Some(100.0 + i as f64)).collect(),
            )
            .unwrap();
        frame
            .push_column(
                ColumnDef::target("cpu", 2),
                (0..n).map(|i| Some(1000.0 + i as f64)).collect(),
            )
            .unwrap();
        frame
    }

    fn features() -> Vec<ColumnDef> {
        vec![ColumnDef::metric("cpu"), ColumnDef::metric("mem")]
    }

    #[test]
    fn test_sequence_count_formula() {
        for rows in 0..40 {
            for l in 1..8 {
                for s in 1..5 {
                    let expected = if rows < l { 0 } else { (rows - l) / s + 1 };
                    assert_eq!(sequence_count(rows, l, s), expected);
                }
            }
        }
    }

    #[test]
    fn test_windows_and_targets() {
        let f = frame(10);
        let target = ColumnDef::target("cpu", 2);
        let batch = SequenceBuilder::new(4, 3).build(&f, &features(), &target).unwrap();

        assert_eq!(batch.sequences.shape(), &[3, 4, 2]);
        assert_eq!(batch.len(), sequence_count(10, 4, 3));

        // Window k starts at row 3k
        for k in 0..3 {
            let start = 3 * k;
            for t in 0..4 {
                assert_eq!(batch.sequences[[k, t, 0]], (start + t) as f64);
                assert_eq!(batch.sequences[[k, t, 1]], 100.0 + (start + t) as f64);
            }
            assert_eq!(batch.targets[k], 1000.0 + (start + 3) as f64);
            assert_eq!(batch.timestamps[k], f.index()[start + 3]);
        }
        assert_eq!(batch.feature_columns, vec!["cpu", "mem"]);
        assert_eq!(batch.target_column, "target_cpu_t+2");
    }

    #[test]
    fn test_short_split_yields_empty_batch() {
        let f = frame(3);
        let batch = SequenceBuilder::new(5, 1)
            .build(&f, &features(), &ColumnDef::target("cpu", 2))
            .unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.sequences.shape(), &[0, 5, 2]);
        assert_eq!(batch.targets.len(), 0);
        assert!(batch.timestamps.is_empty());
    }

    #[test]
    fn test_missing_target_column() {
        let f = frame(10);
        let err = SequenceBuilder::new(2, 1)
            .build(&f, &features(), &ColumnDef::target("cpu", 9))
            .unwrap_err();
        assert!(matches!(err, PrepError::MissingColumn { ref column, .. } if column == "target_cpu_t+9"));
    }

    #[test]
    fn test_sliding_window_validation() {
        assert!(SlidingWindowConfig::default().validate().is_ok());
        assert!(SlidingWindowConfig::new(0, vec![1], "cpu").validate().is_err());
        assert!(SlidingWindowConfig::new(5, vec![], "cpu").validate().is_err());
        assert!(SlidingWindowConfig::new(5, vec![0], "cpu").validate().is_err());
        assert!(SlidingWindowConfig::new(5, vec![2, 2], "cpu").validate().is_err());
        assert!(SlidingWindowConfig::new(5, vec![1], "cpu").with_stride(0).validate().is_err());
        assert_eq!(
            SlidingWindowConfig::default().primary_target(),
            Some(ColumnDef::target("cpu_metrics", 5))
        );
    }
}

//! End-to-end preprocessing pipeline.
//!
//! Connects every stage in a fixed order over one in-memory [`TimeFrame`]:
//!
//! ```text
//! CSV files → RawLoader → Resampler → AnomalyFilter → FeatureEngineer
//!          → TargetBuilder → drop nulls → Splitter → Scaler
//!          → SequenceBuilder (per split) → Persister
//! ```
//!
//! The configuration is validated in [`Pipeline::new`], before any file is
//! touched. [`Pipeline::process`] runs the in-memory stages on an already
//! loaded frame and [`Pipeline::persist`] writes the result, so the stages
//! can be exercised without the filesystem.
//!
//! # Scaler Fit Scope
//!
//! `full_dataset` (default) fits the scaler on every row of every split, so
//! validation and test statistics leak into the training inputs.
//! `train_only` fits on train rows only. Either way the transform is applied
//! to all three splits and the policy is recorded in `scaler.json` and
//! `metadata.json`.
//!
//! # Example
//!
//! ```ignore
//! use metrics_preprocessor::prelude::*;
//!
//! let config = PreprocessorConfig::load("configs/preprocess.yaml")?;
//! let output = Pipeline::new(config)?.run()?;
//! println!("{}", output.validation);
//! ```
//!
//! # Output Structure
//!
//! | Field | Type | Description |
//! |-------|------|-------------|
//! | `files` | `Vec<PathBuf>` | Files written, metadata last |
//! | `stats` | `PipelineStats` | Row counts per stage and split |
//! | `scaler` | `ScalerState` | Fitted parameters |
//! | `metadata` | `DatasetMetadata` | Contents of `metadata.json` |
//! | `validation` | `ValidationResult` | Data-quality findings |

use crate::config::PreprocessorConfig;
use crate::error::{PrepError, Result};
use crate::export::{DatasetMetadata, Persister, SplitMetadata};
use crate::features::FeatureEngineer;
use crate::frame::TimeFrame;
use crate::labeling::TargetBuilder;
use crate::loader::RawLoader;
use crate::preprocessing::{
    select_scaler_columns, AnomalyFilter, Resampler, ScalerFitScope, ScalerState,
};
use crate::schema::{ColumnDef, SCHEMA_VERSION};
use crate::sequence_builder::{SequenceBatch, SequenceBuilder};
use crate::split::{SplitKind, Splitter};
use crate::validation::{DatasetValidator, ValidationResult};
use chrono::Duration;
use log::{info, warn};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Row counts observed while running the stages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineStats {
    /// Rows after pivoting the raw records
    pub rows_loaded: usize,

    /// Rows after resampling
    pub rows_resampled: usize,

    /// Rows removed by the anomaly filter
    pub anomaly_rows_removed: usize,

    /// Rows dropped for nulls introduced by lags, rolling means and targets
    pub rows_dropped_nulls: usize,

    /// Rows in the final dataset
    pub dataset_rows: usize,

    /// Rows per split
    pub split_rows: BTreeMap<SplitKind, usize>,

    /// Sequences per split
    pub split_sequences: BTreeMap<SplitKind, usize>,
}

/// Result of the in-memory stages, ready to persist.
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    /// Scaled splits in chronological order
    pub splits: Vec<(SplitKind, TimeFrame)>,

    /// Sequence tensors per split
    pub sequences: Vec<(SplitKind, SequenceBatch)>,

    /// Fitted scaler
    pub scaler: ScalerState,

    /// Sequence feature columns, in tensor order
    pub feature_columns: Vec<ColumnDef>,

    /// All target columns
    pub target_columns: Vec<ColumnDef>,

    /// Target stored with the sequences
    pub primary_target: ColumnDef,

    /// Row counts
    pub stats: PipelineStats,

    /// Data-quality findings
    pub validation: ValidationResult,
}

impl PreparedDataset {
    /// Split frame by kind.
    pub fn split(&self, kind: SplitKind) -> Option<&TimeFrame> {
        self.splits.iter().find(|(k, _)| *k == kind).map(|(_, f)| f)
    }

    /// Sequence batch by kind.
    pub fn batch(&self, kind: SplitKind) -> Option<&SequenceBatch> {
        self.sequences.iter().find(|(k, _)| *k == kind).map(|(_, b)| b)
    }
}

/// Output of a complete run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Directory holding every artifact
    pub output_dir: PathBuf,

    /// Files written, in write order
    pub files: Vec<PathBuf>,

    /// Row counts
    pub stats: PipelineStats,

    /// Fitted scaler
    pub scaler: ScalerState,

    /// What was written to `metadata.json`
    pub metadata: DatasetMetadata,

    /// Data-quality findings
    pub validation: ValidationResult,
}

/// Preprocessing pipeline for one configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PreprocessorConfig,
    period: Duration,
    splitter: Splitter,
}

impl Pipeline {
    /// Validate `config` and create a pipeline.
    ///
    /// # Errors
    ///
    /// [`PrepError::Config`] or [`PrepError::InvalidSplitConfig`]; nothing
    /// is read or written.
    pub fn new(config: PreprocessorConfig) -> Result<Self> {
        config.validate()?;
        let period = config.resample_period()?;
        let splitter = Splitter::new(config.splits.clone())?;
        Ok(Self {
            config,
            period,
            splitter,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &PreprocessorConfig {
        &self.config
    }

    /// Load, process and persist.
    pub fn run(&self) -> Result<PipelineOutput> {
        info!("Loading raw metrics from {}", self.config.input_glob);
        let raw = RawLoader::from_config(&self.config).load()?;
        let prepared = self.process(raw)?;
        self.persist(&prepared)
    }

    /// Run every in-memory stage on a pivoted raw frame.
    pub fn process(&self, raw: TimeFrame) -> Result<PreparedDataset> {
        let config = &self.config;
        let metrics = &config.metrics;
        let mut stats = PipelineStats {
            rows_loaded: raw.len(),
            ..Default::default()
        };

        let resampled = Resampler::new(self.period, config.interpolation_method).apply(&raw)?;
        stats.rows_resampled = resampled.len();
        info!(
            "Resampled {} rows to {} rows at {}",
            raw.len(),
            resampled.len(),
            config.resample_rule
        );

        let (filtered, removed) = AnomalyFilter::new(config.anomaly.clone()).apply(&resampled, metrics);
        stats.anomaly_rows_removed = removed;

        let featured = FeatureEngineer::new(config.features.clone()).apply(&filtered, metrics)?;

        let window = &config.sliding_window;
        let targets = TargetBuilder::new(window.target_metric.as_str(), window.forecast_steps.clone());
        let labeled = targets.apply(&featured)?;

        let dataset = labeled.drop_nulls();
        stats.rows_dropped_nulls = labeled.len() - dataset.len();
        stats.dataset_rows = dataset.len();
        if dataset.is_empty() {
            warn!("Dataset is empty after dropping incomplete rows; all splits will be empty");
        } else {
            info!(
                "Dataset: {} rows x {} columns ({} incomplete rows dropped)",
                dataset.len(),
                dataset.n_columns(),
                stats.rows_dropped_nulls
            );
        }

        let ranges = self.splitter.ranges(dataset.len());

        let scaled_columns = select_scaler_columns(&dataset.schema()?, &config.scaler_features);
        let fit_rows = match config.scaler_fit_scope {
            ScalerFitScope::FullDataset => 0..dataset.len(),
            ScalerFitScope::TrainOnly => ranges.train.clone(),
        };
        info!(
            "Fitting scaler on {} rows ({}) over {} columns",
            fit_rows.len(),
            config.scaler_fit_scope.as_str(),
            scaled_columns.len()
        );
        let scaler = ScalerState::fit(&dataset, &scaled_columns, fit_rows, config.scaler_fit_scope);
        let mut scaled = dataset;
        scaler.apply(&mut scaled)?;

        let primary_target = targets
            .primary()
            .ok_or_else(|| PrepError::config("sliding_window.forecast_steps must not be empty"))?;
        let schema = scaled.schema()?;
        let feature_columns: Vec<ColumnDef> = schema
            .feature_positions()
            .into_iter()
            .map(|pos| schema.columns()[pos].clone())
            .collect();

        let builder = SequenceBuilder::from_config(window);
        let splits = self.splitter.split(&scaled);
        let mut sequences = Vec::with_capacity(splits.len());
        for (kind, split) in &splits {
            let batch = builder.build(split, &feature_columns, &primary_target)?;
            stats.split_rows.insert(*kind, split.len());
            stats.split_sequences.insert(*kind, batch.len());
            info!("{kind}: {} rows, {} sequences", split.len(), batch.len());
            sequences.push((*kind, batch));
        }

        let validator = DatasetValidator::new()
            .with_expected_period(self.period)
            .with_min_split_rows(window.sequence_length);
        let mut validation = validator.validate_frame(&scaled);
        validation.merge(validator.validate_splits(&ranges));
        for warning in validation.warnings() {
            warn!("{warning}");
        }

        Ok(PreparedDataset {
            splits,
            sequences,
            scaler,
            feature_columns,
            target_columns: targets.target_columns(),
            primary_target,
            stats,
            validation,
        })
    }

    /// Write every artifact of `prepared`; `metadata.json` goes last.
    pub fn persist(&self, prepared: &PreparedDataset) -> Result<PipelineOutput> {
        let persister = Persister::new(&self.config.output_dir);
        persister.prepare()?;

        let mut files = Vec::new();
        for (kind, split) in &prepared.splits {
            files.push(persister.write_split(*kind, split)?);
        }
        for (kind, batch) in &prepared.sequences {
            files.push(persister.write_sequences(*kind, batch)?);
        }
        files.push(persister.write_scaler(&prepared.scaler)?);

        let metadata = self.metadata(prepared);
        files.push(persister.write_metadata(&metadata)?);
        info!(
            "Wrote {} files to {}",
            files.len(),
            persister.output_dir().display()
        );

        Ok(PipelineOutput {
            output_dir: persister.output_dir().to_path_buf(),
            files,
            stats: prepared.stats.clone(),
            scaler: prepared.scaler.clone(),
            metadata,
            validation: prepared.validation.clone(),
        })
    }

    fn metadata(&self, prepared: &PreparedDataset) -> DatasetMetadata {
        let splits = prepared
            .splits
            .iter()
            .map(|(kind, frame)| {
                let sequences = prepared.batch(*kind).map_or(0, SequenceBatch::len);
                SplitMetadata::from_frame(*kind, frame, sequences)
            })
            .collect();

        DatasetMetadata {
            schema_version: SCHEMA_VERSION.to_string(),
            pipeline_version: env!("CARGO_PKG_VERSION").to_string(),
            export_timestamp: chrono::Utc::now().to_rfc3339(),
            resample_rule: self.config.resample_rule.clone(),
            scaler_policy: prepared.scaler.policy,
            metrics: self.config.metrics.clone(),
            feature_columns: prepared.feature_columns.iter().map(ColumnDef::name).collect(),
            target_columns: prepared.target_columns.iter().map(ColumnDef::name).collect(),
            primary_target: prepared.primary_target.name(),
            sequence_length: self.config.sliding_window.sequence_length,
            stride: self.config.sliding_window.stride,
            anomaly_rows_removed: prepared.stats.anomaly_rows_removed,
            splits,
        }
    }
}

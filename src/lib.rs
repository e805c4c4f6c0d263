//! Metrics Preprocessor
//!
//! Turns irregular long-format metric exports (`timestamp, metric, value`
//! rows) into fixed-cadence, feature-enriched, horizon-labelled datasets and
//! fixed-length sequence tensors for forecasting models.
//!
//! # Overview
//!
//! The pipeline is batch, offline and deterministic. Every stage consumes and
//! produces one in-memory [`TimeFrame`]:
//!
//! - **Loading**: CSV discovery by glob, timestamp parsing, pivot to wide form
//! - **Resampling**: fixed cadence with time-weighted interpolation
//! - **Cleaning**: row-wise z-score anomaly removal
//! - **Features**: calendar fields, lags, rolling means
//! - **Labeling**: future values of a target metric at several horizons
//! - **Splitting / Scaling**: chronological splits, per-column standardization
//! - **Sequences**: `[N, L, F]` sliding windows per split
//! - **Export**: CSV splits, `.npz` tensors, `scaler.json`, `metadata.json`
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Metrics Preprocessor                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  config          - PreprocessorConfig (YAML / TOML / JSON)      │
//! │  loader          - RawLoader, timestamp parsing, pivot          │
//! │  frame/          - TimeFrame and column operations              │
//! │  schema/         - Typed column descriptors                     │
//! │  preprocessing/  - Resampler, AnomalyFilter, Scaler             │
//! │  features/       - FeatureEngineer                              │
//! │  labeling/       - TargetBuilder                                │
//! │  split           - Chronological Splitter                       │
//! │  sequence_builder/ - Sliding-window SequenceBuilder             │
//! │  export/         - Persister and .npz writer                    │
//! │  validation      - Data-quality checks                          │
//! │  pipeline        - Orchestration                                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use metrics_preprocessor::{Pipeline, PreprocessorConfig};
//!
//! let config = PreprocessorConfig::load("configs/preprocess.yaml")?;
//! let output = Pipeline::new(config)?.run()?;
//!
//! for (split, rows) in &output.stats.split_rows {
//!     println!("{split}: {rows} rows");
//! }
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod export;
pub mod features;
pub mod frame;
pub mod labeling;
pub mod loader;
pub mod pipeline;
pub mod prelude;
pub mod preprocessing;
pub mod schema;
pub mod sequence_builder;
pub mod split;
pub mod validation;

// Re-exports - Errors
pub use error::{PrepError, Result};

// Re-exports - Config
pub use builder::PipelineBuilder;
pub use config::{ConfigFormat, InterpolationMethod, PreprocessorConfig};

// Re-exports - Data model
pub use frame::{Column, TimeFrame, Timestamp};
pub use schema::{CalendarField, ColumnDef, DatasetSchema, FeatureCategory};

// Re-exports - Stages
pub use features::{FeatureConfig, FeatureEngineer};
pub use labeling::TargetBuilder;
pub use loader::{RawLoader, RawRecord};
pub use preprocessing::{
    AnomalyConfig, AnomalyFilter, Resampler, ScalerFitScope, ScalerState,
};
pub use sequence_builder::{SequenceBatch, SequenceBuilder, SlidingWindowConfig};
pub use split::{DatasetSplitConfig, SplitKind, SplitRanges, Splitter};

// Re-exports - Export
pub use export::{verify_outputs, DatasetMetadata, Persister};

// Re-exports - Validation
pub use validation::{DatasetValidator, ValidationLevel, ValidationResult};

// Re-exports - Pipeline
pub use pipeline::{Pipeline, PipelineOutput, PipelineStats, PreparedDataset};

//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```ignore
//! use metrics_preprocessor::prelude::*;
//!
//! let pipeline = PipelineBuilder::new()
//!     .input_glob("exports/*.csv")
//!     .metrics(["cpu", "mem"])
//!     .target("cpu", vec![5])
//!     .build()?;
//! let output = pipeline.run()?;
//! ```
//!
//! # What's Included
//!
//! ## Core Pipeline
//! - [`Pipeline`], [`PipelineBuilder`], [`PipelineOutput`]
//! - [`PreprocessorConfig`] and its sub-configurations
//!
//! ## Data Model
//! - [`TimeFrame`], [`ColumnDef`], [`SplitKind`], [`SequenceBatch`]
//!
//! ## Stages
//! - [`RawLoader`], [`Resampler`], [`AnomalyFilter`], [`FeatureEngineer`]
//! - [`TargetBuilder`], [`Splitter`], [`ScalerState`], [`SequenceBuilder`]
//! - [`Persister`]
//!
//! ## Errors and Validation
//! - [`PrepError`], [`Result`], [`ValidationResult`]

// ============================================================================
// Core Pipeline
// ============================================================================

pub use crate::builder::PipelineBuilder;
pub use crate::config::{InterpolationMethod, PreprocessorConfig};
pub use crate::pipeline::{Pipeline, PipelineOutput, PipelineStats, PreparedDataset};

// ============================================================================
// Data Model
// ============================================================================

pub use crate::frame::{TimeFrame, Timestamp};
pub use crate::schema::{CalendarField, ColumnDef, DatasetSchema, FeatureCategory};
pub use crate::sequence_builder::{SequenceBatch, SlidingWindowConfig};
pub use crate::split::{DatasetSplitConfig, SplitKind};

// ============================================================================
// Stages
// ============================================================================

pub use crate::features::{FeatureConfig, FeatureEngineer};
pub use crate::labeling::TargetBuilder;
pub use crate::loader::RawLoader;
pub use crate::preprocessing::{
    AnomalyConfig, AnomalyFilter, Resampler, ScalerFitScope, ScalerState,
};
pub use crate::sequence_builder::SequenceBuilder;
pub use crate::split::Splitter;

// ============================================================================
// Export
// ============================================================================

pub use crate::export::{verify_outputs, DatasetMetadata, Persister};

// ============================================================================
// Errors and Validation
// ============================================================================

pub use crate::error::{PrepError, Result};
pub use crate::validation::{ValidationLevel, ValidationResult};

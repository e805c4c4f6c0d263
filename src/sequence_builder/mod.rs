//! Sequence generation for sequence models.
//!
//! Turns each chronological split into fixed-length windows over the feature
//! columns, paired with the primary forecast target.
//!
//! # Architecture
//!
//! - **SlidingWindowConfig**: Window length, stride, horizons, target metric
//! - **SequenceBuilder**: Stateless window slider, one call per split
//! - **SequenceBatch**: `[N, L, F]` tensor plus targets, timestamps, names
//!
//! # Example
//!
//! ```ignore
//! use metrics_preprocessor::sequence_builder::{SequenceBuilder, SlidingWindowConfig};
//!
//! let config = SlidingWindowConfig::default();
//! let builder = SequenceBuilder::from_config(&config);
//!
//! for (kind, split) in splits {
//!     let batch = builder.build(&split, &feature_columns, &primary_target)?;
//!     println!("{kind}: {} sequences", batch.len());
//! }
//! ```

mod builder;

pub use builder::{sequence_count, SequenceBatch, SequenceBuilder, SlidingWindowConfig};

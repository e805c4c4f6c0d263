//! Frame-level preprocessing stages.
//!
//! These stages run between loading and feature engineering (resampling,
//! anomaly filtering) and after splitting (scaling):
//!
//! - **Resampling**: Re-grid onto a fixed period
//!   - Epoch-aligned buckets, mean aggregation
//!   - Time-weighted interpolation of interior gaps
//!   - Forward/backward fill at the edges
//!
//! - **Anomaly filtering**: Z-score outlier row removal
//!   - Population std, zero std replaced by 1.0
//!   - Row-wise AND across metrics
//!
//! - **Scaling**: Standardization of a column subset
//!   - Configurable fit scope (full dataset or train split)
//!   - Serializable fitted state
//!
//! # Example
//!
//! ```ignore
//! use metrics_preprocessor::preprocessing::{AnomalyFilter, Resampler, parse_period};
//!
//! let resampled = Resampler::new(parse_period("1min")?, method).apply(&frame)?;
//! let (filtered, removed) = AnomalyFilter::new(config.anomaly.clone())
//!     .apply(&resampled, &config.metrics);
//! ```

pub mod anomaly;
pub mod resample;
pub mod scaler;

pub use anomaly::{AnomalyConfig, AnomalyFilter};
pub use resample::{parse_period, Resampler};
pub use scaler::{select_scaler_columns, ScalerFitScope, ScalerState};

//! Column Schema Module
//!
//! Typed column descriptors for the wide time-indexed dataset. Every column the
//! pipeline creates carries a [`ColumnDef`] naming its source metric, kind and
//! parameter, so later stages select columns by variant instead of by string.
//!
//! # Example
//!
//! ```
//! use metrics_preprocessor::schema::{ColumnDef, DatasetSchema, FeatureCategory};
//!
//! let defs = vec![ColumnDef::metric("cpu"), ColumnDef::lag("cpu", 1)];
//! let schema = DatasetSchema::from_defs(&defs).unwrap();
//!
//! assert_eq!(schema.position_by_name("cpu_lag_1"), Some(1));
//! assert_eq!(schema.columns()[1].category(), FeatureCategory::Lag);
//! ```

mod feature_def;

pub use feature_def::{CalendarField, ColumnDef, DatasetSchema, FeatureCategory};

/// Current dataset layout version, recorded in `metadata.json`
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Name of the materialized index column in tabular exports
pub const TIMESTAMP_COLUMN: &str = "timestamp";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_version() {
        assert!(!SCHEMA_VERSION.is_empty());
    }
}

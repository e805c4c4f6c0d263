//! Column definitions and schema types.
//!
//! This module defines the core types for column metadata:
//! - `FeatureCategory`: Kind of column (raw metric, calendar, lag, rolling, target)
//! - `CalendarField`: Calendar features derived from the time index
//! - `ColumnDef`: Typed descriptor for a single column
//! - `DatasetSchema`: Ordered collection of column definitions with name lookup

use crate::error::{PrepError, Result};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column category.
///
/// Used by the scaler and sequence builder to select column subsets without
/// parsing column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureCategory {
    /// Raw metric value after resampling
    Raw,

    /// Calendar feature derived from the timestamp
    Calendar,

    /// Past value of a metric shifted into the current row
    Lag,

    /// Trailing rolling mean of a metric
    Rolling,

    /// Future value of the target metric (label, never an input feature)
    Target,
}

/// Calendar features derived from the UTC time index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalendarField {
    /// Hour of day, 0..=23
    Hour,
    /// Day of week, 0 = Monday .. 6 = Sunday
    DayOfWeek,
    /// 1.0 on Saturday/Sunday, else 0.0
    IsWeekend,
    /// Minute of day, 0..=1439
    MinuteOfDay,
}

impl CalendarField {
    /// All calendar fields in output column order.
    pub fn all() -> &'static [CalendarField] {
        &[
            CalendarField::Hour,
            CalendarField::DayOfWeek,
            CalendarField::IsWeekend,
            CalendarField::MinuteOfDay,
        ]
    }

    /// Serialized column name.
    pub fn name(&self) -> &'static str {
        match self {
            CalendarField::Hour => "hour",
            CalendarField::DayOfWeek => "day_of_week",
            CalendarField::IsWeekend => "is_weekend",
            CalendarField::MinuteOfDay => "minute_of_day",
        }
    }
}

/// Typed descriptor for one dataset column.
///
/// Column names are only generated at the serialization boundary via
/// [`ColumnDef::name`]; everything inside the pipeline matches on the variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnDef {
    /// Raw metric column (e.g. `cpu_metrics`)
    Metric(String),

    /// Calendar feature (e.g. `hour`)
    Calendar(CalendarField),

    /// `metric` shifted forward by `lag` samples (`{metric}_lag_{lag}`)
    Lag { metric: String, lag: usize },

    /// Trailing mean over `window` samples (`{metric}_rolling_mean_{window}`)
    RollingMean { metric: String, window: usize },

    /// `metric` value `horizon` samples ahead (`target_{metric}_t+{horizon}`)
    Target { metric: String, horizon: usize },
}

impl ColumnDef {
    /// Raw metric column.
    pub fn metric(name: impl Into<String>) -> Self {
        ColumnDef::Metric(name.into())
    }

    /// Lag column for `metric`.
    pub fn lag(metric: impl Into<String>, lag: usize) -> Self {
        ColumnDef::Lag {
            metric: metric.into(),
            lag,
        }
    }

    /// Rolling-mean column for `metric`.
    pub fn rolling_mean(metric: impl Into<String>, window: usize) -> Self {
        ColumnDef::RollingMean {
            metric: metric.into(),
            window,
        }
    }

    /// Target column for `metric` at `horizon`.
    pub fn target(metric: impl Into<String>, horizon: usize) -> Self {
        ColumnDef::Target {
            metric: metric.into(),
            horizon,
        }
    }

    /// Column category.
    pub fn category(&self) -> FeatureCategory {
        match self {
            ColumnDef::Metric(_) => FeatureCategory::Raw,
            ColumnDef::Calendar(_) => FeatureCategory::Calendar,
            ColumnDef::Lag { .. } => FeatureCategory::Lag,
            ColumnDef::RollingMean { .. } => FeatureCategory::Rolling,
            ColumnDef::Target { .. } => FeatureCategory::Target,
        }
    }

    /// True for label columns.
    #[inline]
    pub fn is_target(&self) -> bool {
        matches!(self, ColumnDef::Target { .. })
    }

    /// Serialized column name.
    pub fn name(&self) -> String {
        match self {
            ColumnDef::Metric(m) => m.clone(),
            ColumnDef::Calendar(field) => field.name().to_string(),
            ColumnDef::Lag { metric, lag } => format!("{metric}_lag_{lag}"),
            ColumnDef::RollingMean { metric, window } => format!("{metric}_rolling_mean_{window}"),
            ColumnDef::Target { metric, horizon } => format!("target_{metric}_t+{horizon}"),
        }
    }
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Ordered column schema of a frame.
///
/// Keeps a name-to-index lookup so configured column names (e.g.
/// `scaler_features`) can be resolved against typed definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetSchema {
    /// Column definitions in frame order
    columns: Vec<ColumnDef>,

    /// Name-to-index lookup
    #[serde(skip)]
    name_index: AHashMap<String, usize>,
}

impl DatasetSchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schema from column definitions.
    ///
    /// Fails if two definitions serialize to the same name.
    pub fn from_defs<'a>(defs: impl IntoIterator<Item = &'a ColumnDef>) -> Result<Self> {
        let mut schema = Self::new();
        for def in defs {
            schema.push(def.clone())?;
        }
        Ok(schema)
    }

    /// Append a column definition.
    ///
    /// Names must be unique: a metric called `hour` and the calendar `hour`
    /// column cannot share a schema.
    pub fn push(&mut self, def: ColumnDef) -> Result<()> {
        let name = def.name();
        if let Some(&existing) = self.name_index.get(&name) {
            return Err(PrepError::Frame(format!(
                "column name '{name}' of {def:?} is already used by {:?}",
                self.columns[existing]
            )));
        }
        self.name_index.insert(name, self.columns.len());
        self.columns.push(def);
        Ok(())
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True if the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a column by serialized name.
    pub fn position_by_name(&self, name: &str) -> Option<usize> {
        self.name_index.get(name).copied()
    }

    /// All column definitions.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Positions of all input-feature (non-target) columns.
    pub fn feature_positions(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_target())
            .map(|(i, _)| i)
            .collect()
    }

    /// Serialized names in column order.
    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(ColumnDef::name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names() {
        assert_eq!(ColumnDef::metric("cpu").name(), "cpu");
        assert_eq!(ColumnDef::Calendar(CalendarField::MinuteOfDay).name(), "minute_of_day");
        assert_eq!(ColumnDef::lag("cpu", 5).name(), "cpu_lag_5");
        assert_eq!(ColumnDef::rolling_mean("cpu", 3).name(), "cpu_rolling_mean_3");
        assert_eq!(ColumnDef::target("cpu", 15).name(), "target_cpu_t+15");
    }

    #[test]
    fn test_categories() {
        assert_eq!(ColumnDef::metric("cpu").category(), FeatureCategory::Raw);
        assert_eq!(ColumnDef::lag("cpu", 1).category(), FeatureCategory::Lag);
        assert!(ColumnDef::target("cpu", 1).is_target());
        assert!(!ColumnDef::rolling_mean("cpu", 2).is_target());
    }

    #[test]
    fn test_schema_lookup() {
        let defs = vec![
            ColumnDef::metric("cpu"),
            ColumnDef::Calendar(CalendarField::Hour),
            ColumnDef::lag("cpu", 1),
            ColumnDef::target("cpu", 2),
        ];
        let schema = DatasetSchema::from_defs(&defs).unwrap();

        assert_eq!(schema.len(), 4);
        assert_eq!(schema.position_by_name("cpu_lag_1"), Some(2));
        assert_eq!(schema.position_by_name("target_cpu_t+2"), Some(3));
        assert_eq!(schema.position_by_name("missing"), None);
        assert_eq!(schema.feature_positions(), vec![0, 1, 2]);
    }

    #[test]
    fn test_schema_rejects_name_collisions() {
        let mut schema = DatasetSchema::new();
        schema.push(ColumnDef::Calendar(CalendarField::Hour)).unwrap();
        assert!(schema.push(ColumnDef::metric("hour")).is_err());

        schema.push(ColumnDef::lag("cpu", 1)).unwrap();
        let err = schema.push(ColumnDef::metric("cpu_lag_1")).unwrap_err();
        assert!(matches!(err, PrepError::Frame(ref msg) if msg.contains("cpu_lag_1")));
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.position_by_name("cpu_lag_1"), Some(1));
    }
}

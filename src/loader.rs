//! Raw long-format input loading.
//!
//! Reads every CSV file matching a glob (in sorted path order), keeps rows
//! whose metric is configured, and pivots them into a wide [`TimeFrame`]:
//!
//! ```text
//! timestamp,metric,value                     timestamp | cpu | mem
//! 00:00,cpu,0.5          ──► pivot ──►       00:00     | 0.5 | 200
//! 00:00,mem,200                              00:01     | 0.7 | null
//! 00:01,cpu,0.7
//! ```
//!
//! Duplicate `(timestamp, metric)` pairs are averaged, so the output index is
//! unique and strictly increasing.
//!
//! # Timestamps
//!
//! Accepted cell formats:
//!
//! | Format | Example | Kind |
//! |--------|---------|------|
//! | RFC 3339 / ISO-8601 with offset | `2024-01-01T00:00:00+02:00`, `...Z` | zoned |
//! | Same with a space separator | `2024-01-01 00:00:00+00:00` | zoned |
//! | Naive date-time | `2024-01-01 00:00:00`, `2024-01-01T00:00:00.5` | naive |
//! | Naive date | `2024-01-01` | naive |
//! | Epoch seconds | `1704067200`, `1704067200.25` | zoned |
//!
//! Zoned values are converted to UTC, naive values are taken as UTC. A run
//! mixing naive and zoned values fails with [`PrepError::MixedTimezones`].

use crate::error::{PrepError, Result};
use crate::frame::{TimeFrame, Timestamp};
use crate::schema::ColumnDef;
use ahash::AHashMap;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use csv::ReaderBuilder;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One long-format input row.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Instant normalized to UTC
    pub timestamp: Timestamp,
    /// Metric name
    pub metric: String,
    /// Observed value
    pub value: f64,
}

// ============================================================================
// Timestamp parsing
// ============================================================================

/// Whether a parsed timestamp carried its own time reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampKind {
    /// Had an offset or was an epoch value
    Zoned,
    /// Wall-clock time without offset, interpreted as UTC
    Naive,
}

const ZONED_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse one timestamp cell.
///
/// Returns `None` if no supported format matches.
///
/// # Example
///
/// ```
/// use metrics_preprocessor::loader::{parse_timestamp, TimestampKind};
///
/// let (ts, kind) = parse_timestamp("2024-01-01T02:00:00+02:00").unwrap();
/// assert_eq!(ts.to_rfc3339(), "2024-01-01T00:00:00+00:00");
/// assert_eq!(kind, TimestampKind::Zoned);
///
/// let (_, kind) = parse_timestamp("2024-01-01 00:00:00").unwrap();
/// assert_eq!(kind, TimestampKind::Naive);
/// ```
pub fn parse_timestamp(raw: &str) -> Option<(Timestamp, TimestampKind)> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some((dt.with_timezone(&Utc), TimestampKind::Zoned));
    }
    for fmt in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some((dt.with_timezone(&Utc), TimestampKind::Zoned));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some((Utc.from_utc_datetime(&naive), TimestampKind::Naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let naive = date.and_hms_opt(0, 0, 0)?;
        return Some((Utc.from_utc_datetime(&naive), TimestampKind::Naive));
    }

    parse_epoch_seconds(s).map(|ts| (ts, TimestampKind::Zoned))
}

fn parse_epoch_seconds(s: &str) -> Option<Timestamp> {
    if let Ok(secs) = s.parse::<i64>() {
        return Utc.timestamp_opt(secs, 0).single();
    }
    let secs: f64 = s.parse().ok()?;
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round() as u32;
    Utc.timestamp_opt(whole as i64, nanos.min(999_999_999)).single()
}

/// Tracks the first naive and first zoned timestamp seen in a run.
#[derive(Debug, Default)]
struct TimezoneTracker {
    naive: Option<String>,
    zoned: Option<String>,
}

impl TimezoneTracker {
    fn observe(&mut self, raw: &str, kind: TimestampKind) -> Result<()> {
        let slot = match kind {
            TimestampKind::Naive => &mut self.naive,
            TimestampKind::Zoned => &mut self.zoned,
        };
        if slot.is_none() {
            *slot = Some(raw.trim().to_string());
        }
        if let (Some(naive), Some(zoned)) = (&self.naive, &self.zoned) {
            return Err(PrepError::MixedTimezones {
                naive: naive.clone(),
                zoned: zoned.clone(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Loader
// ============================================================================

/// Loads and pivots long-format metric files.
#[derive(Debug, Clone)]
pub struct RawLoader {
    input_glob: String,
    timestamp_column: String,
    metric_column: String,
    value_column: String,
    metrics: Vec<String>,
}

impl RawLoader {
    /// Create a loader for `input_glob` keeping `metrics`, with the default
    /// `timestamp`/`metric`/`value` column names.
    pub fn new(input_glob: impl Into<String>, metrics: Vec<String>) -> Self {
        Self {
            input_glob: input_glob.into(),
            timestamp_column: "timestamp".to_string(),
            metric_column: "metric".to_string(),
            value_column: "value".to_string(),
            metrics,
        }
    }

    /// Override the input column names.
    pub fn with_columns(
        mut self,
        timestamp: impl Into<String>,
        metric: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.timestamp_column = timestamp.into();
        self.metric_column = metric.into();
        self.value_column = value.into();
        self
    }

    /// Build a loader from the pipeline configuration.
    pub fn from_config(config: &crate::PreprocessorConfig) -> Self {
        Self::new(config.input_glob.clone(), config.metrics.clone()).with_columns(
            config.timestamp_column.clone(),
            config.metric_column.clone(),
            config.value_column.clone(),
        )
    }

    /// Matching input files in sorted order.
    ///
    /// # Errors
    ///
    /// [`PrepError::NoInputFiles`] if nothing matches.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in glob::glob(&self.input_glob)? {
            let path = entry?;
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(PrepError::NoInputFiles {
                pattern: self.input_glob.clone(),
            });
        }
        Ok(files)
    }

    /// Read all configured-metric records from every matching file.
    ///
    /// Records are returned sorted by timestamp (stable, so file order breaks
    /// ties).
    pub fn load_records(&self) -> Result<Vec<RawRecord>> {
        let files = self.discover()?;
        let mut tracker = TimezoneTracker::default();
        let mut records = Vec::new();

        for path in &files {
            let kept = self.read_file(path, &mut tracker, &mut records)?;
            log::debug!("Read {} records from {}", kept, path.display());
        }

        records.sort_by_key(|r| r.timestamp);
        log::info!(
            "Loaded {} records from {} file(s) matching '{}'",
            records.len(),
            files.len(),
            self.input_glob
        );
        Ok(records)
    }

    /// Load and pivot into a wide frame.
    pub fn load(&self) -> Result<TimeFrame> {
        let records = self.load_records()?;
        pivot(&records, &self.metrics)
    }

    fn read_file(
        &self,
        path: &Path,
        tracker: &mut TimezoneTracker,
        out: &mut Vec<RawRecord>,
    ) -> Result<usize> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)?;
        let headers = reader.headers()?.clone();

        let source = path.display().to_string();
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| PrepError::missing_column(name, source.clone()))
        };
        let idx_ts = find(&self.timestamp_column)?;
        let idx_metric = find(&self.metric_column)?;
        let idx_value = find(&self.value_column)?;

        let mut kept = 0;
        let mut skipped_values = 0;
        for result in reader.records() {
            let record = result?;
            let metric = record.get(idx_metric).unwrap_or("");
            if !self.metrics.iter().any(|m| m == metric) {
                continue;
            }

            let raw_ts = record.get(idx_ts).unwrap_or("");
            let (timestamp, kind) =
                parse_timestamp(raw_ts).ok_or_else(|| PrepError::InvalidTimestamp {
                    value: raw_ts.to_string(),
                    path: path.to_path_buf(),
                })?;
            tracker.observe(raw_ts, kind)?;

            let raw_value = record.get(idx_value).unwrap_or("");
            let value = match parse_value(raw_value) {
                Ok(Some(v)) => v,
                Ok(None) => {
                    skipped_values += 1;
                    continue;
                }
                Err(()) => {
                    return Err(PrepError::InvalidValue {
                        value: raw_value.to_string(),
                        path: path.to_path_buf(),
                    })
                }
            };

            out.push(RawRecord {
                timestamp,
                metric: metric.to_string(),
                value,
            });
            kept += 1;
        }

        if skipped_values > 0 {
            log::warn!(
                "Skipped {} missing or non-finite values in {}",
                skipped_values,
                path.display()
            );
        }
        Ok(kept)
    }
}

/// Parse a value cell. Empty and non-finite cells are missing (`Ok(None)`).
fn parse_value(raw: &str) -> std::result::Result<Option<f64>, ()> {
    if raw.is_empty() {
        return Ok(None);
    }
    let v: f64 = raw.parse().map_err(|_| ())?;
    Ok(v.is_finite().then_some(v))
}

/// Pivot records into a wide frame with one column per present metric.
///
/// Columns follow the order of `metrics`; metrics without any record get no
/// column. Duplicate `(timestamp, metric)` pairs are averaged.
pub fn pivot(records: &[RawRecord], metrics: &[String]) -> Result<TimeFrame> {
    let slot_of: AHashMap<&str, usize> = metrics
        .iter()
        .enumerate()
        .map(|(i, m)| (m.as_str(), i))
        .collect();

    // timestamp -> per-metric (sum, count)
    let mut cells: BTreeMap<Timestamp, Vec<(f64, usize)>> = BTreeMap::new();
    let mut seen = vec![false; metrics.len()];

    for record in records {
        let Some(&slot) = slot_of.get(record.metric.as_str()) else {
            continue;
        };
        seen[slot] = true;
        let row = cells
            .entry(record.timestamp)
            .or_insert_with(|| vec![(0.0, 0); metrics.len()]);
        row[slot].0 += record.value;
        row[slot].1 += 1;
    }

    for (metric, present) in metrics.iter().zip(&seen) {
        if !present {
            log::warn!("Configured metric '{}' not found in input", metric);
        }
    }

    let mut frame = TimeFrame::new(cells.keys().copied().collect())?;
    for (slot, metric) in metrics.iter().enumerate() {
        if !seen[slot] {
            continue;
        }
        let values = cells
            .values()
            .map(|row| {
                let (sum, count) = row[slot];
                (count > 0).then(|| sum / count as f64)
            })
            .collect();
        frame.push_column(ColumnDef::metric(metric.as_str()), values)?;
    }
    Ok(frame)
}

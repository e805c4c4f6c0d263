//! Fixed-cadence resampling.
//!
//! Re-grids a [`TimeFrame`] onto buckets of a fixed period and repairs gaps:
//!
//! ```text
//! raw rows ──► bucket mean ──► interpolate interior gaps ──► ffill ──► bfill
//! ```
//!
//! Buckets are aligned to whole multiples of the period since the Unix epoch,
//! so a `1min` grid always lands on `hh:mm:00` regardless of where the input
//! starts. Each bucket takes the mean of the non-null source values falling
//! inside `[start, start + period)`.
//!
//! # Period Strings
//!
//! `resample_rule` accepts pandas-style offsets:
//!
//! | Rule | Period |
//! |------|--------|
//! | `500ms`, `500L` | 500 milliseconds |
//! | `30s`, `30S` | 30 seconds |
//! | `1min`, `5T` | minutes |
//! | `1h`, `1H` | hours |
//! | `1d`, `1D` | days |
//!
//! A missing multiplier means 1 (`min` == `1min`).

use crate::config::InterpolationMethod;
use crate::error::{PrepError, Result};
use crate::frame::{ops, TimeFrame, Timestamp};
use chrono::{Duration, TimeZone, Utc};

/// Parse a pandas-style period string into a positive duration.
///
/// # Example
///
/// ```
/// use metrics_preprocessor::preprocessing::parse_period;
///
/// assert_eq!(parse_period("1min").unwrap(), chrono::Duration::minutes(1));
/// assert_eq!(parse_period("15S").unwrap(), chrono::Duration::seconds(15));
/// assert!(parse_period("fortnight").is_err());
/// ```
pub fn parse_period(rule: &str) -> std::result::Result<Duration, String> {
    let rule = rule.trim();
    let split = rule
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rule.len());
    let (digits, unit) = rule.split_at(split);

    let count: i64 = if digits.is_empty() {
        1
    } else {
        digits
            .parse()
            .map_err(|_| format!("resample_rule '{rule}' has an invalid multiplier"))?
    };
    if count <= 0 {
        return Err(format!("resample_rule '{rule}' must be a positive period"));
    }

    let period = match unit {
        "ms" | "L" => Duration::try_milliseconds(count),
        "s" | "S" => Duration::try_seconds(count),
        "min" | "T" => Duration::try_minutes(count),
        "h" | "H" => Duration::try_hours(count),
        "d" | "D" => Duration::try_days(count),
        "" => return Err(format!("resample_rule '{rule}' is missing a unit")),
        other => {
            return Err(format!(
                "resample_rule '{rule}' has unsupported unit '{other}' (expected ms, s, min, h or d)"
            ))
        }
    };
    period.ok_or_else(|| format!("resample_rule '{rule}' is out of range"))
}

/// Upper bound on the number of output buckets of a single resample.
pub const MAX_BUCKETS: i64 = 100_000_000;

/// Fixed-cadence resampler.
#[derive(Debug, Clone, Copy)]
pub struct Resampler {
    period: Duration,
    method: InterpolationMethod,
}

impl Resampler {
    /// Create a resampler for the given period and gap-filling method.
    pub fn new(period: Duration, method: InterpolationMethod) -> Self {
        Self { period, method }
    }

    /// Configured period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Re-grid `frame` onto the configured period and fill every gap.
    ///
    /// The output index is uniformly spaced from the bucket containing the
    /// first input row through the bucket containing the last one. A column
    /// with no valid value at all stays null (nothing to fill from).
    pub fn apply(&self, frame: &TimeFrame) -> Result<TimeFrame> {
        let step = self.period.num_milliseconds();
        if step <= 0 {
            return Err(PrepError::Frame(format!(
                "resample period must be positive, got {}ms",
                step
            )));
        }

        let (first, last) = match (frame.index().first(), frame.index().last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return rebuild_empty(frame),
        };

        let origin = bucket_start(first, step);
        let span = (bucket_start(last, step) - origin) / step + 1;
        if span > MAX_BUCKETS {
            return Err(PrepError::Frame(format!(
                "resampling {} .. {} at {}ms needs {} buckets (limit {})",
                first, last, step, span, MAX_BUCKETS
            )));
        }
        let n_buckets = span as usize;

        let mut index = Vec::with_capacity(n_buckets);
        for k in 0..n_buckets as i64 {
            let ms = origin + k * step;
            let ts = Utc.timestamp_millis_opt(ms).single().ok_or_else(|| {
                PrepError::Frame(format!("bucket start {ms}ms is out of range"))
            })?;
            index.push(ts);
        }

        // Source row -> bucket position, shared by every column
        let slots: Vec<usize> = frame
            .index()
            .iter()
            .map(|t| ((bucket_start(*t, step) - origin) / step) as usize)
            .collect();

        let x: Vec<f64> = match self.method {
            InterpolationMethod::Time => index
                .iter()
                .map(|t| t.timestamp_millis() as f64)
                .collect(),
            InterpolationMethod::Linear => (0..n_buckets).map(|i| i as f64).collect(),
        };

        let mut out = TimeFrame::new(index)?;
        for column in frame.columns() {
            let mut sums = vec![0.0; n_buckets];
            let mut counts = vec![0usize; n_buckets];
            for (slot, value) in slots.iter().zip(&column.values) {
                if let Some(v) = value {
                    sums[*slot] += v;
                    counts[*slot] += 1;
                }
            }

            let bucketed: Vec<Option<f64>> = sums
                .iter()
                .zip(&counts)
                .map(|(s, &c)| if c > 0 { Some(s / c as f64) } else { None })
                .collect();

            let mut filled = ops::interpolate(&bucketed, &x);
            ops::forward_fill(&mut filled);
            ops::backward_fill(&mut filled);

            if filled.iter().any(Option::is_none) {
                log::warn!("Column '{}' has no valid values to resample from", column.def);
            }
            out.push_column(column.def.clone(), filled)?;
        }

        log::debug!(
            "Resampled {} rows onto {} buckets of {}ms",
            frame.len(),
            out.len(),
            step
        );
        Ok(out)
    }
}

fn bucket_start(t: Timestamp, step: i64) -> i64 {
    t.timestamp_millis().div_euclid(step) * step
}

fn rebuild_empty(frame: &TimeFrame) -> Result<TimeFrame> {
    let mut out = TimeFrame::new(Vec::new())?;
    for def in frame.defs() {
        out.push_column(def.clone(), Vec::new())?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnDef;

    fn at(h: u32, m: u32, s: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_parse_period_units() {
        assert_eq!(parse_period("500ms").unwrap(), Duration::milliseconds(500));
        assert_eq!(parse_period("30s").unwrap(), Duration::seconds(30));
        assert_eq!(parse_period("5T").unwrap(), Duration::minutes(5));
        assert_eq!(parse_period("min").unwrap(), Duration::minutes(1));
        assert_eq!(parse_period("2H").unwrap(), Duration::hours(2));
        assert_eq!(parse_period("1D").unwrap(), Duration::days(1));
    }

    #[test]
    fn test_parse_period_rejects_garbage() {
        assert!(parse_period("").is_err());
        assert!(parse_period("0min").is_err());
        assert!(parse_period("10").is_err());
        assert!(parse_period("3weeks").is_err());
    }

    #[test]
    fn test_parse_period_overflow_is_error() {
        for rule in ["999999999999999999d", "999999999999999999h", "9223372036854775807s"] {
            let err = parse_period(rule).unwrap_err();
            assert!(err.contains("out of range"), "{rule}: {err}");
        }
        // Larger than i64 fails at the multiplier
        assert!(parse_period("99999999999999999999999ms").is_err());
    }

    #[test]
    fn test_bucket_limit() {
        let index = vec![Utc.timestamp_opt(0, 0).unwrap(), at(0, 0, 0)];
        let mut frame = TimeFrame::new(index).unwrap();
        frame
            .push_column(ColumnDef::metric("cpu"), vec![Some(1.0), Some(2.0)])
            .unwrap();

        let err = Resampler::new(Duration::milliseconds(1), InterpolationMethod::Time)
            .apply(&frame)
            .unwrap_err();
        assert!(matches!(err, PrepError::Frame(ref msg) if msg.contains("buckets")));

        // The same span is fine on a daily grid
        let out = Resampler::new(Duration::days(1), InterpolationMethod::Time)
            .apply(&frame)
            .unwrap();
        assert_eq!(out.len(), 19_724);
    }

    #[test]
    fn test_bucket_mean_and_alignment() {
        let index = vec![at(0, 0, 10), at(0, 0, 40), at(0, 2, 5)];
        let mut frame = TimeFrame::new(index).unwrap();
        frame
            .push_column(ColumnDef::metric("cpu"), vec![Some(1.0), Some(3.0), Some(6.0)])
            .unwrap();

        let out = Resampler::new(Duration::minutes(1), InterpolationMethod::Time)
            .apply(&frame)
            .unwrap();

        assert_eq!(out.index(), &[at(0, 0, 0), at(0, 1, 0), at(0, 2, 0)]);
        let cpu = out.values(&ColumnDef::metric("cpu")).unwrap();
        assert_eq!(cpu[0], Some(2.0));
        assert_eq!(cpu[1], Some(4.0)); // interpolated between 2.0 and 6.0
        assert_eq!(cpu[2], Some(6.0));
    }

    #[test]
    fn test_uniform_spacing_and_no_nulls() {
        let index = vec![at(0, 0, 0), at(0, 7, 0), at(0, 9, 30)];
        let mut frame = TimeFrame::new(index).unwrap();
        frame
            .push_column(ColumnDef::metric("cpu"), vec![Some(1.0), None, Some(2.0)])
            .unwrap();
        frame
            .push_column(ColumnDef::metric("mem"), vec![None, Some(5.0), None])
            .unwrap();

        let out = Resampler::new(Duration::minutes(1), InterpolationMethod::Time)
            .apply(&frame)
            .unwrap();

        assert_eq!(out.len(), 10);
        for w in out.index().windows(2) {
            assert_eq!(w[1] - w[0], Duration::minutes(1));
        }
        assert_eq!(out.null_count(), 0);

        // Edge fill copies the only valid value to both ends
        let mem = out.values(&ColumnDef::metric("mem")).unwrap();
        assert!(mem.iter().all(|v| *v == Some(5.0)));
    }

    #[test]
    fn test_empty_frame_keeps_columns() {
        let mut frame = TimeFrame::new(Vec::new()).unwrap();
        frame.push_column(ColumnDef::metric("cpu"), Vec::new()).unwrap();

        let out = frame
            .resample(Duration::minutes(1), InterpolationMethod::Linear)
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(out.n_columns(), 1);
    }
}

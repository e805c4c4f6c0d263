//! Column primitives over ordered `(instant, value)` sequences.
//!
//! All functions take a column as `&[Option<f64>]` where `None` is the null
//! marker, and return a new column of the same length. They operate on sample
//! positions, never on timestamps, except [`interpolate`] which takes the
//! x-coordinates explicitly.

/// Shift a column by `by` samples.
///
/// Positive `by` moves values forward in time (lag): `out[i] = values[i - by]`,
/// first `by` entries null. Negative `by` pulls future values back (lead):
/// `out[i] = values[i + |by|]`, last `|by|` entries null.
///
/// # Example
///
/// ```
/// use metrics_preprocessor::frame::ops::shift;
///
/// let col = vec![Some(1.0), Some(2.0), Some(3.0)];
/// assert_eq!(shift(&col, 1), vec![None, Some(1.0), Some(2.0)]);
/// assert_eq!(shift(&col, -2), vec![Some(3.0), None, None]);
/// ```
pub fn shift(values: &[Option<f64>], by: isize) -> Vec<Option<f64>> {
    let n = values.len();
    let offset = by.unsigned_abs();

    (0..n)
        .map(|i| {
            if by >= 0 {
                if i >= offset {
                    values[i - offset]
                } else {
                    None
                }
            } else if i + offset < n {
                values[i + offset]
            } else {
                None
            }
        })
        .collect()
}

/// Trailing rolling mean over `window` samples ending at each row.
///
/// A position is null when fewer than `window` samples precede it (inclusive)
/// or when any sample in the window is null.
///
/// # Example
///
/// ```
/// use metrics_preprocessor::frame::ops::rolling_mean;
///
/// let col = vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
/// assert_eq!(rolling_mean(&col, 2), vec![None, Some(1.5), Some(2.5), Some(3.5)]);
/// ```
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    if window == 0 {
        return vec![None; n];
    }

    (0..n)
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            let mut sum = 0.0;
            for v in slice {
                sum += (*v)?;
            }
            Some(sum / window as f64)
        })
        .collect()
}

/// Mean of the non-null entries, `None` if there are none.
pub fn mean(values: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Population (ddof = 0) standard deviation of the non-null entries.
pub fn population_std(values: &[Option<f64>]) -> Option<f64> {
    let m = mean(values)?;
    let (sum_sq, count) = values
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(s, c), v| (s + (v - m) * (v - m), c + 1));
    Some((sum_sq / count as f64).sqrt())
}

/// Linearly interpolate interior nulls using explicit x-coordinates.
///
/// Each null run bounded on both sides by valid values is filled by linear
/// interpolation in `x`. Leading and trailing null runs are left untouched.
///
/// # Panics
///
/// Panics if `x.len() != values.len()`.
pub fn interpolate(values: &[Option<f64>], x: &[f64]) -> Vec<Option<f64>> {
    assert_eq!(values.len(), x.len(), "x-coordinates must match column length");

    let mut out = values.to_vec();
    let mut prev: Option<usize> = None;

    for i in 0..values.len() {
        if values[i].is_none() {
            continue;
        }
        if let Some(p) = prev {
            if i > p + 1 {
                let (x0, y0) = (x[p], values[p].unwrap_or_default());
                let (x1, y1) = (x[i], values[i].unwrap_or_default());
                let span = x1 - x0;
                for (j, slot) in out.iter_mut().enumerate().take(i).skip(p + 1) {
                    let w = if span == 0.0 { 0.0 } else { (x[j] - x0) / span };
                    *slot = Some(y0 + (y1 - y0) * w);
                }
            }
        }
        prev = Some(i);
    }

    out
}

/// Propagate the last valid value forward over nulls.
pub fn forward_fill(values: &mut [Option<f64>]) {
    let mut last = None;
    for v in values.iter_mut() {
        match v {
            Some(x) => last = Some(*x),
            None => *v = last,
        }
    }
}

/// Propagate the next valid value backward over nulls.
pub fn backward_fill(values: &mut [Option<f64>]) {
    let mut next = None;
    for v in values.iter_mut().rev() {
        match v {
            Some(x) => next = Some(*x),
            None => *v = next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_lag_and_lead() {
        let col: Vec<Option<f64>> = (0..5).map(|i| Some(i as f64)).collect();

        let lag = shift(&col, 2);
        assert_eq!(lag[..2], [None, None]);
        for i in 2..5 {
            assert_eq!(lag[i], col[i - 2]);
        }

        let lead = shift(&col, -2);
        for i in 0..3 {
            assert_eq!(lead[i], col[i + 2]);
        }
        assert_eq!(lead[3..], [None, None]);

        assert_eq!(shift(&col, 0), col);
        assert_eq!(shift(&col, 10), vec![None; 5]);
    }

    #[test]
    fn test_rolling_mean_null_propagation() {
        let col = vec![Some(1.0), None, Some(3.0), Some(5.0), Some(7.0)];
        let rolled = rolling_mean(&col, 2);
        assert_eq!(rolled, vec![None, None, None, Some(4.0), Some(6.0)]);

        assert_eq!(rolling_mean(&col, 0), vec![None; 5]);
        assert_eq!(rolling_mean(&col, 1), col);
    }

    #[test]
    fn test_mean_and_std_skip_nulls() {
        let col = vec![Some(2.0), None, Some(4.0), Some(4.0), Some(4.0), Some(5.0), Some(5.0), Some(7.0), Some(9.0)];
        assert_eq!(mean(&col), Some(5.0));
        assert!((population_std(&col).unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(mean(&[None, None]), None);
        assert_eq!(population_std(&[]), None);
    }

    #[test]
    fn test_interpolate_interior_only() {
        let col = vec![None, Some(0.0), None, None, Some(3.0), None];
        let x = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let out = interpolate(&col, &x);
        assert_eq!(out, vec![None, Some(0.0), Some(1.0), Some(2.0), Some(3.0), None]);
    }

    #[test]
    fn test_interpolate_uses_x_spacing() {
        let col = vec![Some(0.0), None, Some(10.0)];
        let x = [0.0, 9.0, 10.0];
        let out = interpolate(&col, &x);
        assert!((out[1].unwrap() - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_edge_fills() {
        let mut col = vec![None, Some(1.0), None, Some(2.0), None];
        forward_fill(&mut col);
        assert_eq!(col, vec![None, Some(1.0), Some(1.0), Some(2.0), Some(2.0)]);
        backward_fill(&mut col);
        assert_eq!(col[0], Some(1.0));
    }
}

//! Rolling-window extremes and lagged percentage change.
//!
//! A window of size n ends at the current row and is defined only once n rows
//! exist and all of them are defined.

use crate::domain::indicator::{Column, ratio};

fn rolling(values: &[Option<f64>], window: usize, pick: fn(f64, f64) -> f64) -> Column {
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            values[i + 1 - window..=i]
                .iter()
                .try_fold(None, |acc: Option<f64>, v| {
                    let v = (*v)?;
                    Some(Some(acc.map_or(v, |a| pick(a, v))))
                })
                .flatten()
        })
        .collect()
}

/// Lowest value over the trailing `window` rows.
pub fn rolling_min(values: &[Option<f64>], window: usize) -> Column {
    rolling(values, window, f64::min)
}

/// Highest value over the trailing `window` rows.
pub fn rolling_max(values: &[Option<f64>], window: usize) -> Column {
    rolling(values, window, f64::max)
}

/// `(X[i] - X[i-n]) / X[i-n] * 100`; undefined for the first n rows or a zero base.
pub fn pct_change(values: &[Option<f64>], periods: usize) -> Column {
    (0..values.len())
        .map(|i| {
            if i < periods {
                return None;
            }
            let cur = values[i]?;
            let base = values[i - periods]?;
            ratio(cur - base, base).map(|r| r * 100.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::lift;

    #[test]
    fn rolling_min_warmup_and_values() {
        let out = rolling_min(&lift([5.0, 3.0, 4.0, 1.0, 2.0]), 3);
        assert_eq!(out, vec![None, None, Some(3.0), Some(1.0), Some(1.0)]);
    }

    #[test]
    fn rolling_max_warmup_and_values() {
        let out = rolling_max(&lift([5.0, 3.0, 4.0, 1.0, 2.0]), 2);
        assert_eq!(out, vec![None, Some(5.0), Some(4.0), Some(4.0), Some(2.0)]);
    }

    #[test]
    fn rolling_undefined_in_window_is_undefined() {
        let out = rolling_max(&[Some(1.0), None, Some(3.0), Some(2.0)], 2);
        assert_eq!(out, vec![None, None, None, Some(3.0)]);
    }

    #[test]
    fn rolling_window_longer_than_series() {
        let out = rolling_min(&lift([1.0, 2.0]), 10);
        assert_eq!(out, vec![None, None]);
    }

    #[test]
    fn pct_change_basic() {
        let out = pct_change(&lift([10.0, 11.0, 12.0]), 2);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert!((out[2].unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn pct_change_zero_base_is_undefined() {
        let out = pct_change(&lift([0.0, 5.0]), 1);
        assert_eq!(out, vec![None, None]);
    }
}

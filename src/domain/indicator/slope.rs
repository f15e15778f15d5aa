//! Least-squares linear regression slope over a trailing window.
//!
//! For x = 0..n-1 over the last n values:
//! slope = (n*Σxy - Σx*Σy) / (n*Σx² - (Σx)²)

use crate::domain::indicator::Column;

pub fn linreg_slope(values: &[Option<f64>], period: usize) -> Column {
    let n = period as f64;
    let sum_x = n * (n - 1.0) / 2.0;
    let sum_x2 = (n - 1.0) * n * (2.0 * n - 1.0) / 6.0;
    let divisor = n * sum_x2 - sum_x * sum_x;

    (0..values.len())
        .map(|i| {
            if period < 2 || i + 1 < period {
                return None;
            }
            let mut sum_y = 0.0;
            let mut sum_xy = 0.0;
            for (x, v) in values[i + 1 - period..=i].iter().enumerate() {
                let y = (*v)?;
                sum_y += y;
                sum_xy += x as f64 * y;
            }
            Some((n * sum_xy - sum_x * sum_y) / divisor)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::lift;

    #[test]
    fn slope_of_line() {
        // y = 2x + 1
        let input = lift((0..10).map(|x| 2.0 * x as f64 + 1.0));
        let out = linreg_slope(&input, 5);
        assert!(out[..4].iter().all(Option::is_none));
        for v in &out[4..] {
            assert!((v.unwrap() - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn slope_of_flat_series_is_zero() {
        let out = linreg_slope(&lift([3.0; 21]), 21);
        assert!(out[20].unwrap().abs() < 1e-12);
    }

    #[test]
    fn slope_undefined_input_in_window() {
        let out = linreg_slope(&[Some(1.0), None, Some(3.0)], 2);
        assert_eq!(out, vec![None, None, None]);
    }

    #[test]
    fn slope_period_below_two_is_undefined() {
        assert_eq!(linreg_slope(&lift([1.0, 2.0]), 1), vec![None, None]);
    }
}

//! Column-wise indicator primitives.
//!
//! Every primitive maps a [`Column`] (one value per trading day, `None` for an
//! undefined value) to a column of the same length. Nothing here is 0-filled;
//! callers apply a [`WarmupFill`] once an indicator's columns are final.

pub mod ema;
pub mod ewm;
pub mod rolling;
pub mod slope;

/// One value per row; `None` is the undefined sentinel.
pub type Column = Vec<Option<f64>>;

/// What to publish for rows whose value is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WarmupFill {
    #[default]
    Zero,
}

impl WarmupFill {
    pub fn value(self) -> f64 {
        match self {
            WarmupFill::Zero => 0.0,
        }
    }

    pub fn apply(self, column: &[Option<f64>]) -> Vec<f64> {
        column.iter().map(|v| v.unwrap_or(self.value())).collect()
    }

    /// Signal flags carry no undefined state: an undefined comparison is 0.
    pub fn apply_flags(self, flags: &[Option<bool>]) -> Vec<u8> {
        flags
            .iter()
            .map(|f| match f {
                Some(true) => 1,
                _ => self.value() as u8,
            })
            .collect()
    }
}

/// Lift raw values into a column, treating non-finite values as undefined.
pub fn lift(values: impl IntoIterator<Item = f64>) -> Column {
    values
        .into_iter()
        .map(|v| if v.is_finite() { Some(v) } else { None })
        .collect()
}

/// `num / den`, undefined on a zero or non-finite denominator.
pub fn ratio(num: f64, den: f64) -> Option<f64> {
    if den == 0.0 || !den.is_finite() || !num.is_finite() {
        None
    } else {
        Some(num / den)
    }
}

/// Element-wise comparison; undefined when either side is undefined.
pub fn compare(
    left: &[Option<f64>],
    right: &[Option<f64>],
    op: impl Fn(f64, f64) -> bool,
) -> Vec<Option<bool>> {
    left.iter()
        .zip(right)
        .map(|(l, r)| match (l, r) {
            (Some(l), Some(r)) => Some(op(*l, *r)),
            _ => None,
        })
        .collect()
}

/// Compare each value with the prior row's value.
pub fn compare_prev(column: &[Option<f64>], op: impl Fn(f64, f64) -> bool) -> Vec<Option<bool>> {
    (0..column.len())
        .map(|i| {
            if i == 0 {
                return None;
            }
            match (column[i], column[i - 1]) {
                (Some(cur), Some(prev)) => Some(op(cur, prev)),
                _ => None,
            }
        })
        .collect()
}

/// `(value - low) / (high - low) * scale`, undefined when the range is empty.
pub fn position_in_range(
    value: &[Option<f64>],
    low: &[Option<f64>],
    high: &[Option<f64>],
    scale: f64,
) -> Column {
    value
        .iter()
        .zip(low)
        .zip(high)
        .map(|((v, lo), hi)| match (v, lo, hi) {
            (Some(v), Some(lo), Some(hi)) => ratio(v - lo, hi - lo).map(|r| r * scale),
            _ => None,
        })
        .collect()
}

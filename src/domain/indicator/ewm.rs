//! Span-parameterised exponential weighted mean.
//!
//! alpha = 2/(span+1). Each output is the weighted mean of every defined
//! input so far, the input k rows back weighted by (1-alpha)^k:
//!
//!   M[i] = sum((1-alpha)^k * X[i-k]) / sum((1-alpha)^k)
//!
//! Undefined inputs contribute nothing but still age the weights, so an
//! undefined input after the first defined one repeats the previous mean.

use crate::domain::indicator::Column;

pub fn ewm_mean(values: &[Option<f64>], span: usize) -> Column {
    let decay = 1.0 - 2.0 / (span as f64 + 1.0);
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    values
        .iter()
        .map(|value| {
            weighted_sum *= decay;
            weight_total *= decay;
            if let Some(x) = *value {
                weighted_sum += x;
                weight_total += 1.0;
            }
            (weight_total > 0.0).then(|| weighted_sum / weight_total)
        })
        .collect()
}

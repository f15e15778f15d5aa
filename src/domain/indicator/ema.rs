//! Exponential Moving Average, SMA-seeded.
//!
//! k = 2/(n+1), seed with the SMA of the first n defined inputs, then
//! EMA[i] = X[i]*k + EMA[i-1]*(1-k).
//! Leading undefined inputs are skipped; output is undefined until the seed.
//! An undefined input after the seed makes every later value undefined.

use crate::domain::indicator::Column;

pub fn calculate_ema(values: &[Option<f64>], period: usize) -> Column {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }

    let Some(start) = values.iter().position(Option::is_some) else {
        return out;
    };

    let k = 2.0 / (period as f64 + 1.0);
    let mut sum = 0.0;
    let mut ema = 0.0;

    for (offset, value) in values[start..].iter().enumerate() {
        let i = start + offset;
        let Some(x) = *value else {
            break;
        };
        if offset < period - 1 {
            sum += x;
        } else if offset == period - 1 {
            sum += x;
            ema = sum / period as f64;
            out[i] = Some(ema);
        } else {
            ema = x * k + ema * (1.0 - k);
            out[i] = Some(ema);
        }
    }

    out
}

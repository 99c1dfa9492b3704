//! Exponential Moving Average (EMA).
//!
//! Seed: the first close (not an SMA).
//! k = 2 / (period + 1); EMA[t] = close[t] * k + EMA[t-1] * (1 - k).
//! Edge cases: series shorter than `period` → last close; empty → NaN.

/// EMA of the most recent close.
pub fn ema(closes: &[f64], period: usize) -> f64 {
    let Some(&first) = closes.first() else {
        return f64::NAN;
    };
    if closes.len() < period {
        return closes[closes.len() - 1];
    }
    let k = 2.0 / (period as f64 + 1.0);
    closes[1..]
        .iter()
        .fold(first, |prev, &close| close * k + prev * (1.0 - k))
}

//! On-Balance Volume (OBV).
//!
//! Starts at 0 on the first bar. Each later bar adds its volume on a strictly
//! higher close, subtracts it on a strictly lower close, and carries the
//! previous value on an equal close. One output per bar.

pub fn obv(closes: &[f64], volumes: &[f64]) -> Vec<f64> {
    let n = closes.len().min(volumes.len());
    if n == 0 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(n);
    let mut running = 0.0;
    out.push(running);
    for i in 1..n {
        if closes[i] > closes[i - 1] {
            running += volumes[i];
        } else if closes[i] < closes[i - 1] {
            running -= volumes[i];
        }
        out.push(running);
    }
    out
}

/// Change of the last OBV value versus `lookback` values earlier.
///
/// Returns `None` when the series holds fewer than `lookback` values; compares
/// the last value against index `len - lookback`.
pub fn obv_change(series: &[f64], lookback: usize) -> Option<f64> {
    if lookback == 0 || series.len() < lookback {
        return None;
    }
    let last = series[series.len() - 1];
    Some(last - series[series.len() - lookback])
}

/// One-bar OBV change relative to the previous absolute OBV.
/// Zero when the previous value is zero or there are fewer than two values.
pub fn obv_strength(series: &[f64]) -> f64 {
    let n = series.len();
    if n < 2 {
        return 0.0;
    }
    let prev = series[n - 2];
    if prev == 0.0 {
        return 0.0;
    }
    (series[n - 1] - prev).abs() / prev.abs()
}

//! Average True Range (ATR).
//!
//! TR = max(high - low, |high - prev_close|, |low - prev_close|), defined from
//! the second bar on. ATR = simple mean of the trailing `period` TR values.
//! Edge cases: fewer than two bars → 0; fewer than `period` TR values → mean
//! of those available.

/// True range of one bar given the previous close.
pub fn true_range(high: f64, low: f64, prev_close: Option<f64>) -> f64 {
    let high_low = high - low;
    match prev_close {
        Some(pc) => high_low.max((high - pc).abs()).max((low - pc).abs()),
        None => high_low,
    }
}

pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> f64 {
    let n = highs.len().min(lows.len()).min(closes.len());
    if n < 2 || period == 0 {
        return 0.0;
    }

    let start = n.saturating_sub(period).max(1);
    let trs: Vec<f64> = (start..n)
        .map(|i| true_range(highs[i], lows[i], Some(closes[i - 1])))
        .collect();
    trs.iter().sum::<f64>() / trs.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    fn columns(closes: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let candles = make_candles(closes);
        (
            candles.iter().map(|c| c.high).collect(),
            candles.iter().map(|c| c.low).collect(),
            candles.iter().map(|c| c.close).collect(),
        )
    }

    #[test]
    fn true_range_uses_gap() {
        // Gap up: prev close 10, bar 15..13 → TR = 15 - 10 = 5
        assert_approx(true_range(15.0, 13.0, Some(10.0)), 5.0, DEFAULT_EPSILON);
        assert_approx(true_range(15.0, 13.0, None), 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn flat_prices_give_range() {
        // make_candles: high = close+1, low = close-1 on a flat series → TR = 2
        let (h, l, c) = columns(&[100.0; 30]);
        assert_approx(atr(&h, &l, &c, 14), 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn trailing_window_only() {
        // Early volatility should fall out of a 3-bar window.
        let (mut h, mut l, c) = columns(&[100.0; 10]);
        h[1] = 150.0;
        l[1] = 50.0;
        assert_approx(atr(&h, &l, &c, 3), 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn short_input() {
        assert_eq!(atr(&[1.0], &[0.5], &[0.8], 14), 0.0);
        let (h, l, c) = columns(&[100.0, 100.0, 100.0]);
        assert_approx(atr(&h, &l, &c, 14), 2.0, DEFAULT_EPSILON);
    }
}

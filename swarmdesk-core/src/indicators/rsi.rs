//! Relative Strength Index (RSI).
//!
//! Seed: simple average gain and loss over the first `period` changes.
//! Then Wilder smoothing: avg = (avg·(period−1) + current) / period.
//! RSI = 100 − 100 / (1 + avg_gain / avg_loss)
//! Lookback: period + 1 closes.
//! Edge cases: fewer than period + 1 closes → 50 (neutral); avg_loss == 0 → 100.

/// Value returned when there is not enough history.
pub const NEUTRAL_RSI: f64 = 50.0;

/// RSI of the most recent close.
pub fn rsi(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period + 1 {
        return NEUTRAL_RSI;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for w in closes[..=period].windows(2) {
        let change = w[1] - w[0];
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss -= change;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    let p = period as f64;
    for w in closes[period..].windows(2) {
        let change = w[1] - w[0];
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        avg_gain = (avg_gain * (p - 1.0) + gain) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss) / p;
    }

    if avg_loss == 0.0 {
        return 100.0;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn rsi_short_input_is_neutral() {
        assert_eq!(rsi(&[1.0, 2.0, 3.0], 14), NEUTRAL_RSI);
        assert_eq!(rsi(&[], 14), NEUTRAL_RSI);
    }

    #[test]
    fn rsi_all_gains() {
        let closes: Vec<f64> = (1..=20).map(f64::from).collect();
        assert_eq!(rsi(&closes, 14), 100.0);
    }

    #[test]
    fn rsi_all_losses() {
        let closes = [105.0, 104.0, 103.0, 102.0, 101.0, 100.0];
        assert_approx(rsi(&closes, 3), 0.0, 1e-9);
    }

    #[test]
    fn rsi_seed_value() {
        // Changes: +0.34, -0.25, -0.48
        // avg_gain = 0.34/3, avg_loss = 0.73/3
        // RSI = 100 - 100/(1 + 0.34/0.73)
        let closes = [44.0, 44.34, 44.09, 43.61];
        let expected = 100.0 - 100.0 / (1.0 + 0.34 / 0.73);
        assert_approx(rsi(&closes, 3), expected, 1e-9);
    }

    #[test]
    fn rsi_wilder_step() {
        // Seed as above, then one more change of +0.72.
        let closes = [44.0, 44.34, 44.09, 43.61, 44.33];
        let gain = (0.34 / 3.0 * 2.0 + 0.72) / 3.0;
        let loss = (0.73 / 3.0 * 2.0) / 3.0;
        let expected = 100.0 - 100.0 / (1.0 + gain / loss);
        assert_approx(rsi(&closes, 3), expected, 1e-9);
    }

    #[test]
    fn rsi_bounds() {
        let closes = [100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0];
        let v = rsi(&closes, 3);
        assert!((0.0..=100.0).contains(&v), "RSI out of bounds: {v}");
    }
}

//! Two-bar candle patterns evaluated on the most recent candle.
//!
//! - Bullish engulfing: previous red, current green, current open below the
//!   previous close and current close above the previous open.
//! - Bearish engulfing: the mirror image.
//! - Pin bar: a wick longer than twice the body. Directional pin bars require
//!   the long wick on the rejection side and a matching candle colour.

use crate::domain::Candle;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandlePatterns {
    pub bullish_engulfing: bool,
    pub bearish_engulfing: bool,
    pub pin_bar: bool,
    pub bullish_pin_bar: bool,
    pub bearish_pin_bar: bool,
}

impl CandlePatterns {
    /// Detect patterns on the last candle of `candles`. Fewer than two candles
    /// yields no patterns.
    pub fn detect(candles: &[Candle]) -> Self {
        let [.., prev, cur] = candles else {
            return Self::default();
        };

        let body = cur.body();
        let upper = cur.upper_wick();
        let lower = cur.lower_wick();

        Self {
            bullish_engulfing: prev.is_red()
                && cur.is_green()
                && cur.open < prev.close
                && cur.close > prev.open,
            bearish_engulfing: prev.is_green()
                && cur.is_red()
                && cur.open > prev.close
                && cur.close < prev.open,
            pin_bar: upper > body * 2.0 || lower > body * 2.0,
            bullish_pin_bar: lower > body * 2.0 && cur.is_green(),
            bearish_pin_bar: upper > body * 2.0 && cur.is_red(),
        }
    }

    pub fn bullish_reversal(&self) -> bool {
        self.bullish_engulfing || self.bullish_pin_bar
    }

    pub fn bearish_reversal(&self) -> bool {
        self.bearish_engulfing || self.bearish_pin_bar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn c(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            open_time: Utc::now(),
            open,
            high,
            low,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn bullish_engulfing() {
        let p = CandlePatterns::detect(&[c(10.0, 10.5, 8.5, 9.0), c(8.8, 10.8, 8.7, 10.6)]);
        assert!(p.bullish_engulfing);
        assert!(!p.bearish_engulfing);
    }

    #[test]
    fn bearish_engulfing() {
        let p = CandlePatterns::detect(&[c(9.0, 10.5, 8.9, 10.0), c(10.2, 10.3, 8.5, 8.8)]);
        assert!(p.bearish_engulfing);
        assert!(p.bearish_reversal());
    }

    #[test]
    fn hammer_is_bullish_pin_bar() {
        // body 0.2, lower wick 2.0
        let p = CandlePatterns::detect(&[c(10.0, 10.0, 10.0, 10.0), c(10.0, 10.25, 8.0, 10.2)]);
        assert!(p.pin_bar);
        assert!(p.bullish_pin_bar);
        assert!(!p.bearish_pin_bar);
    }

    #[test]
    fn shooting_star_is_bearish_pin_bar() {
        let p = CandlePatterns::detect(&[c(10.0, 10.0, 10.0, 10.0), c(10.2, 12.0, 9.95, 10.0)]);
        assert!(p.bearish_pin_bar);
    }

    #[test]
    fn single_candle_has_no_patterns() {
        assert_eq!(
            CandlePatterns::detect(&[c(1.0, 2.0, 0.5, 1.5)]),
            CandlePatterns::default()
        );
    }
}

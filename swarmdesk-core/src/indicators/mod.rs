//! Technical indicators.
//!
//! Every function here is pure: it reads plain slices (or candles) and returns
//! the value at the most recent bar, or a full series where a strategy needs
//! history (OBV). Short inputs degrade to a documented neutral value instead of
//! failing, so strategies can run on whatever history the data source returned.
//!
//! `IndicatorSnapshot` bundles everything the four personas read into one
//! struct computed once per evaluation.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod fibonacci;
pub mod obv;
pub mod patterns;
pub mod rsi;
pub mod snapshot;
pub mod swing;
pub mod volume;
pub mod vwap;

pub use atr::{atr, true_range};
pub use bollinger::{bollinger, Bands};
pub use ema::ema;
pub use fibonacci::FibLevels;
pub use obv::{obv, obv_change, obv_strength};
pub use patterns::CandlePatterns;
pub use rsi::rsi;
pub use snapshot::IndicatorSnapshot;
pub use swing::{swing_points, SwingPoint, SwingPoints};
pub use volume::VolumeStats;
pub use vwap::vwap;

/// Create synthetic candles from close prices for testing.
///
/// Generates plausible OHLCV: open = prev_close (or close for first candle),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<crate::domain::Candle> {
    use crate::domain::Candle;
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                open_time: base + chrono::Duration::hours(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

//! Weekly swing structure traded at Fibonacci retracement zones.
//!
//! Trend comes from EMA 10/30. Inside a trend the persona waits for price to
//! pull back into a retracement zone of the last swing range, with either a
//! structure break or heavy volume behind it and a candle confirming the turn.

use super::gates::{within, Confidence, GateTrail};
use super::{MarketContext, Strategy};
use crate::domain::{Action, Decision, Side, StrategyKind};
use crate::indicators::{FibLevels, IndicatorSnapshot};

const ZONE_TOLERANCE: f64 = 0.02;
const VOLUME_RATIO: f64 = 1.5;
/// Fallback window for the swing range when no swing points exist.
const RANGE_LOOKBACK: usize = 50;
/// Fallback bar distance for the structure level when fewer than two swings exist.
const STRUCTURE_LOOKBACK: usize = 10;

#[derive(Debug, Clone, Copy, Default)]
pub struct FibSwing;

impl Strategy for FibSwing {
    fn name(&self) -> &str {
        StrategyKind::FibonacciSwing.slug()
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::FibonacciSwing
    }

    fn evaluate(&self, ctx: &MarketContext<'_>) -> Decision {
        let snap = ctx.snapshot;
        let highs = ctx.series.highs();
        let lows = ctx.series.lows();
        let fib = swing_range(snap, &highs, &lows);

        let side = if snap.ema10 > snap.ema30 && snap.price > snap.ema30 {
            Side::Buy
        } else if snap.ema10 < snap.ema30 && snap.price < snap.ema30 {
            Side::Sell
        } else {
            return Decision::hold(
                0,
                format!(
                    "Weekly consolidation: EMA 10/30 flat. Price ranging between Fib 38.2% ({:.4}) and 78.6% ({:.4}).",
                    fib.level(0.382),
                    fib.level(0.786)
                ),
            );
        };

        let (rsi_low, rsi_high) = match side {
            Side::Buy => (45.0, 65.0),
            Side::Sell => (35.0, 55.0),
        };
        if !within(snap.rsi, rsi_low, rsi_high) {
            return Decision::hold(
                0,
                format!(
                    "Weekly: {side} trend but RSI {:.0} outside {rsi_low:.0}-{rsi_high:.0}. No clean entry.",
                    snap.rsi
                ),
            );
        }

        let mut gates = GateTrail::new();
        let volume = snap.volume.confirms(VOLUME_RATIO);
        let in_zone = gates.check("fib-zone", in_fib_zone(side, &fib, snap.price));
        let confirmed = gates.check(
            "structure-or-volume",
            structure_break(side, snap, &highs, &lows) || volume,
        );
        if !(in_zone && confirmed) {
            return Decision::hold(
                55,
                format!(
                    "Weekly: {side} trend but setup incomplete {}. Fib 61.8% at {:.4}.",
                    gates.summary(),
                    fib.level(0.618)
                ),
            );
        }

        let candle = match side {
            Side::Buy => snap.patterns.bullish_reversal() || snap.is_green(),
            Side::Sell => snap.patterns.bearish_reversal() || !snap.is_green(),
        };
        if !gates.check("candle", candle) {
            return Decision::hold(
                65,
                format!("Weekly Fib: at zone, waiting for {side} candle confirmation."),
            );
        }

        let confidence = Confidence::base(90).bonus(volume, 5);
        let target = match side {
            Side::Buy => fib.extension(1.618),
            Side::Sell => fib.extension_down(1.618),
        };
        Decision::new(
            Action::from(side),
            confidence.value(),
            format!(
                "Weekly Fib {side}: price {:.4} in retracement zone, EMA 10/30 aligned, {} {}. Target Fib ext 1.618 at {target:.4}.",
                snap.price,
                if volume { "high volume" } else { "structure break" },
                gates.summary()
            ),
        )
    }
}

/// Last swing range, or the extremes of the recent window without swings.
fn swing_range(snap: &IndicatorSnapshot, highs: &[f64], lows: &[f64]) -> FibLevels {
    let high = snap.swings.last_high().unwrap_or_else(|| {
        highs[highs.len().saturating_sub(RANGE_LOOKBACK)..]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    });
    let low = snap.swings.last_low().unwrap_or_else(|| {
        lows[lows.len().saturating_sub(RANGE_LOOKBACK)..]
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min)
    });
    FibLevels::new(high, low)
}

/// Near the 0.382 or 0.618 level, or inside the side's pocket: 0.618-0.786
/// for longs, 0.236-0.382 for shorts. The pockets are deliberately not
/// mirror images (the mirror of the long pocket would be 0.214-0.382); the
/// short pocket sits on the standard 0.236 level.
fn in_fib_zone(side: Side, fib: &FibLevels, price: f64) -> bool {
    let at_level =
        fib.near(0.382, price, ZONE_TOLERANCE) || fib.near(0.618, price, ZONE_TOLERANCE);
    match side {
        Side::Buy => at_level || fib.between(0.618, 0.786, price),
        Side::Sell => at_level || fib.between(0.236, 0.382, price),
    }
}

fn structure_break(side: Side, snap: &IndicatorSnapshot, highs: &[f64], lows: &[f64]) -> bool {
    let back = |values: &[f64]| {
        values
            .len()
            .checked_sub(STRUCTURE_LOOKBACK)
            .map(|i| values[i])
    };
    match side {
        Side::Buy => snap
            .swings
            .previous_high()
            .or_else(|| back(highs))
            .is_some_and(|level| snap.price > level),
        Side::Sell => snap
            .swings
            .previous_low()
            .or_else(|| back(lows))
            .is_some_and(|level| snap.price < level),
    }
}

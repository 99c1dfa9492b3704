//! 15m scalper: fast EMA 5/13 cross or 5>13>21 stack on a volume spike, with a
//! Bollinger band bounce rule for ranging tape.

use super::gates::{within, Confidence, GateTrail};
use super::{MarketContext, Strategy};
use crate::domain::{Action, Decision, Side, StrategyKind};
use crate::indicators::IndicatorSnapshot;

const SPIKE_RATIO: f64 = 1.8;
const MIN_BAND_WIDTH: f64 = 0.02;
const BAND_PROXIMITY: f64 = 0.005;
const MIN_CHANGE_PCT: f64 = 0.3;
const MIN_ATR_PCT: f64 = 0.5;
const OVERBOUGHT: f64 = 75.0;
const OVERSOLD: f64 = 25.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct Scalper;

impl Strategy for Scalper {
    fn name(&self) -> &str {
        StrategyKind::Scalper.slug()
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Scalper
    }

    fn evaluate(&self, ctx: &MarketContext<'_>) -> Decision {
        let snap = ctx.snapshot;
        let tape = Tape::read(snap);

        if tape.cross_up || tape.stack_up {
            return trend_scalp(Side::Buy, snap, &tape);
        }
        if tape.cross_down || tape.stack_down {
            return trend_scalp(Side::Sell, snap, &tape);
        }
        if tape.wide_bands && (tape.near_lower || tape.near_upper) {
            return band_bounce(snap, &tape);
        }
        Decision::hold(
            45,
            format!(
                "15m: no scalp signal. {}, {}.",
                if tape.wide_bands {
                    "no EMA cross"
                } else {
                    "bands too tight"
                },
                if tape.spike {
                    "price consolidating"
                } else {
                    "no volume spike"
                }
            ),
        )
    }
}

/// Everything the scalper reads off the last bar.
struct Tape {
    cross_up: bool,
    cross_down: bool,
    stack_up: bool,
    stack_down: bool,
    spike: bool,
    wide_bands: bool,
    near_upper: bool,
    near_lower: bool,
    strong_move: bool,
    enough_atr: bool,
}

impl Tape {
    fn read(snap: &IndicatorSnapshot) -> Self {
        let (price, e5, e13, e21) = (snap.price, snap.ema5, snap.ema13, snap.ema21);
        let upper = snap.bands.upper;
        let lower = snap.bands.lower;
        Self {
            cross_up: e5 > e13 && snap.prev_close.is_some_and(|p| p <= e13) && price > e13,
            cross_down: e5 < e13 && snap.prev_close.is_some_and(|p| p >= e13) && price < e13,
            stack_up: e5 > e13 && e13 > e21 && price > e5,
            stack_down: e5 < e13 && e13 < e21 && price < e5,
            spike: snap.volume.ratio > SPIKE_RATIO,
            wide_bands: snap.bands.width() > MIN_BAND_WIDTH,
            near_upper: price > upper * (1.0 - BAND_PROXIMITY)
                && price <= upper * (1.0 + BAND_PROXIMITY),
            near_lower: price < lower * (1.0 + BAND_PROXIMITY)
                && price >= lower * (1.0 - BAND_PROXIMITY),
            strong_move: snap.change_pct().abs() > MIN_CHANGE_PCT,
            enough_atr: snap.atr_pct > MIN_ATR_PCT,
        }
    }
}

fn trend_scalp(side: Side, snap: &IndicatorSnapshot, tape: &Tape) -> Decision {
    let (rsi_zone, extreme, cross, candle) = match side {
        Side::Buy => (
            within(snap.rsi, 55.0, OVERBOUGHT),
            snap.rsi > OVERBOUGHT,
            tape.cross_up,
            snap.patterns.bullish_reversal() || snap.is_green(),
        ),
        Side::Sell => (
            within(snap.rsi, OVERSOLD, 45.0),
            snap.rsi < OVERSOLD,
            tape.cross_down,
            snap.patterns.bearish_reversal() || !snap.is_green(),
        ),
    };
    let setup = if cross { "EMA 5/13 cross" } else { "EMA stack" };

    let mut gates = GateTrail::new();
    gates.check("rsi-momentum", rsi_zone && !extreme);
    gates.check("volume-spike", tape.spike);
    gates.check("atr", tape.enough_atr);
    if !gates.all_passed() {
        if extreme {
            return Decision::hold(
                50,
                format!(
                    "15m: {side} {setup} but RSI {:.0} at an extreme. Reversal risk, skip.",
                    snap.rsi
                ),
            );
        }
        return Decision::hold(60, format!("15m: {side} {setup}, waiting {}.", gates.summary()));
    }

    gates.check("momentum", tape.strong_move);
    gates.check("candle", candle);
    if !gates.all_passed() {
        return Decision::hold(
            70,
            format!("15m: {side} {setup} detected, waiting {}.", gates.summary()),
        );
    }

    let confidence = Confidence::base(88)
        .bonus(tape.spike, 5)
        .bonus(cross, 3)
        .bonus(tape.strong_move, 2);
    Decision::new(
        Action::from(side),
        confidence.value(),
        format!(
            "15m scalp {side}: {setup}, RSI {:.0}, volume spike {:.2}x, move {:+.2}%, ATR {:.2}%, VWAP {:.4}.",
            snap.rsi,
            snap.volume.ratio,
            snap.change_pct(),
            snap.atr_pct,
            snap.vwap
        ),
    )
}

fn band_bounce(snap: &IndicatorSnapshot, tape: &Tape) -> Decision {
    let green = snap.is_green();
    if tape.near_lower && within(snap.rsi, 30.0, 50.0) && tape.spike && green {
        return Decision::new(
            Action::Buy,
            Confidence::base(80).bonus(tape.spike, 5).value(),
            format!(
                "15m range scalp BUY: bounce off lower band {:.4}, RSI {:.0} recovering on a volume spike.",
                snap.bands.lower, snap.rsi
            ),
        );
    }
    if tape.near_upper && within(snap.rsi, 50.0, 70.0) && tape.spike && !green {
        return Decision::new(
            Action::Sell,
            Confidence::base(80).bonus(tape.spike, 5).value(),
            format!(
                "15m range scalp SELL: rejection at upper band {:.4}, RSI {:.0} weakening on a volume spike.",
                snap.bands.upper, snap.rsi
            ),
        );
    }
    Decision::hold(
        50,
        format!(
            "15m: price at {} band but {}.",
            if tape.near_lower { "lower" } else { "upper" },
            if tape.spike {
                "waiting for confirmation"
            } else {
                "no volume spike"
            }
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CandleSeries;
    use crate::indicators::{Bands, VolumeStats};
    use crate::strategy::test_support::series_from_closes;

    /// Fresh EMA 5/13 cross on a green bar with a volume spike.
    fn fixture() -> (CandleSeries, IndicatorSnapshot) {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i % 3) as f64).collect();
        let series = series_from_closes(&closes, 1000.0);
        let mut snap = IndicatorSnapshot::compute(&series).unwrap();
        snap.price = 101.0;
        snap.open = 100.0;
        snap.prev_close = Some(100.0);
        snap.ema5 = 100.6;
        snap.ema13 = 100.4;
        snap.ema21 = 100.8;
        snap.rsi = 62.0;
        snap.atr_pct = 0.8;
        snap.volume = VolumeStats {
            current: 2500.0,
            average: 1000.0,
            ratio: 2.5,
        };
        snap.patterns = Default::default();
        (series, snap)
    }

    fn run(series: &CandleSeries, snap: &IndicatorSnapshot) -> Decision {
        Scalper.evaluate(&MarketContext::new(series, snap))
    }

    #[test]
    fn fast_cross_with_spike_buys() {
        let (series, snap) = fixture();
        let d = run(&series, &snap);
        assert_eq!(d.action, Action::Buy);
        // 88 + spike 5 + cross 3 + momentum 2
        assert_eq!(d.confidence, 98);
    }

    #[test]
    fn overbought_cross_holds_at_50() {
        let (series, mut snap) = fixture();
        snap.rsi = 80.0;
        let d = run(&series, &snap);
        assert!(d.is_hold());
        assert_eq!(d.confidence, 50);
    }

    #[test]
    fn missing_spike_holds_at_60() {
        let (series, mut snap) = fixture();
        snap.volume.ratio = 1.2;
        let d = run(&series, &snap);
        assert!(d.is_hold());
        assert_eq!(d.confidence, 60);
        assert!(d.rationale.contains("volume-spike:no"));
    }

    #[test]
    fn small_move_holds_at_70() {
        let (series, mut snap) = fixture();
        snap.prev_close = Some(100.9);
        snap.ema13 = 100.95;
        snap.ema5 = 100.97;
        let d = run(&series, &snap);
        assert!(d.is_hold());
        assert_eq!(d.confidence, 70);
    }

    #[test]
    fn lower_band_bounce_buys_at_85() {
        let (series, mut snap) = fixture();
        // No cross, no stack.
        snap.ema5 = 101.5;
        snap.ema13 = 101.2;
        snap.ema21 = 101.4;
        snap.prev_close = Some(101.5);
        snap.bands = Bands {
            upper: 104.0,
            middle: 102.5,
            lower: 101.0,
        };
        snap.rsi = 40.0;
        let d = run(&series, &snap);
        assert_eq!(d.action, Action::Buy);
        assert_eq!(d.confidence, 85);
    }

    #[test]
    fn quiet_tape_holds_at_45() {
        let (series, mut snap) = fixture();
        snap.ema5 = 101.0;
        snap.ema13 = 101.0;
        snap.ema21 = 101.0;
        snap.bands = Bands {
            upper: 101.5,
            middle: 101.0,
            lower: 100.5,
        };
        let d = run(&series, &snap);
        assert!(d.is_hold());
        assert_eq!(d.confidence, 45);
    }
}

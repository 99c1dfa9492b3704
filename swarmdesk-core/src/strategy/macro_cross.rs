//! Daily EMA 50/200 golden and death cross with retest, volume and OBV.

use super::gates::{within, Confidence, GateTrail};
use super::{MarketContext, Strategy};
use crate::domain::{Action, Decision, Side, StrategyKind};
use crate::indicators::{obv_change, IndicatorSnapshot};

const RETEST_BARS: usize = 10;
const RETEST_TOLERANCE: f64 = 0.015;
const VOLUME_RATIO: f64 = 1.3;
const OBV_LOOKBACK: usize = 10;

#[derive(Debug, Clone, Copy, Default)]
pub struct MacroCross;

impl Strategy for MacroCross {
    fn name(&self) -> &str {
        StrategyKind::MacroCross.slug()
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::MacroCross
    }

    fn evaluate(&self, ctx: &MarketContext<'_>) -> Decision {
        let snap = ctx.snapshot;
        let golden = snap.ema50 > snap.ema200;
        let death = snap.ema50 < snap.ema200;

        // Golden cross retests on lows, death cross on highs.
        let touches = if golden {
            ctx.series.lows()
        } else {
            ctx.series.highs()
        };
        let retest = retested(&touches, snap.ema50);

        if golden && (snap.price > snap.ema50 || retest) {
            evaluate_side(Side::Buy, snap, retest)
        } else if death && (snap.price < snap.ema50 || retest) {
            evaluate_side(Side::Sell, snap, retest)
        } else {
            let cross = if golden {
                "bullish"
            } else if death {
                "bearish"
            } else {
                "neutral"
            };
            Decision::hold(
                45,
                format!(
                    "Daily chop: price around EMA 200 ({:.4}), EMA 50/200 {cross}. Waiting for cross confirmation.",
                    snap.ema200
                ),
            )
        }
    }
}

fn evaluate_side(side: Side, snap: &IndicatorSnapshot, retest: bool) -> Decision {
    let cross = match side {
        Side::Buy => "Golden cross",
        Side::Sell => "Death cross",
    };
    let mut gates = GateTrail::new();

    let (rsi_ok, beyond_ema20) = match side {
        Side::Buy => (within(snap.rsi, 40.0, 65.0), snap.price > snap.ema20),
        Side::Sell => (within(snap.rsi, 35.0, 60.0), snap.price < snap.ema20),
    };
    let rsi_ok = gates.check("rsi-band", rsi_ok);
    let momentum = gates.check("ema20-or-retest", beyond_ema20 || retest);
    if !(rsi_ok && momentum) {
        return Decision::hold(
            60,
            format!(
                "Daily: {cross} active but momentum not ready {}. RSI {:.0}.",
                gates.summary(),
                snap.rsi
            ),
        );
    }

    let volume = gates.check("volume", snap.volume.confirms(VOLUME_RATIO));
    let obv_agrees = obv_change(&snap.obv, OBV_LOOKBACK).is_some_and(|delta| match side {
        Side::Buy => delta > 0.0,
        Side::Sell => delta < 0.0,
    });
    let beyond_all = match side {
        Side::Buy => snap.price > snap.ema20 && snap.price > snap.ema50 && snap.price > snap.ema200,
        Side::Sell => snap.price < snap.ema20 && snap.price < snap.ema50 && snap.price < snap.ema200,
    };
    let flow = gates.check("obv-or-ema-stack", obv_agrees || beyond_all);
    if !(volume && flow) {
        return Decision::hold(
            70,
            format!(
                "Daily: {cross} trend, waiting for confirmation {}. {}",
                gates.summary(),
                if retest { "Retest complete." } else { "Waiting for EMA 50 retest." }
            ),
        );
    }

    let engulfing = match side {
        Side::Buy => snap.patterns.bullish_engulfing,
        Side::Sell => snap.patterns.bearish_engulfing,
    };
    let confidence = Confidence::base(93)
        .bonus(retest, 2)
        .bonus(volume, 3)
        .bonus(engulfing, 2);
    Decision::new(
        Action::from(side),
        confidence.value(),
        format!(
            "Daily {cross}: price {:.4} {} EMA 50 ({:.4}), RSI {:.0}, volume {:.2}x, OBV {} {}.",
            snap.price,
            if retest { "retested" } else { "beyond" },
            snap.ema50,
            snap.rsi,
            snap.volume.ratio,
            if obv_agrees { "agreeing" } else { "flat" },
            gates.summary()
        ),
    )
}

/// Any of the last few touches within tolerance of the EMA 50.
fn retested(touches: &[f64], ema50: f64) -> bool {
    if ema50 == 0.0 {
        return false;
    }
    touches[touches.len().saturating_sub(RETEST_BARS)..]
        .iter()
        .any(|p| (p - ema50).abs() / ema50 < RETEST_TOLERANCE)
}

//! 4h Bollinger squeeze breakout, confirmed by On-Balance Volume.
//!
//! A squeeze is a band width under 70% of the mean width of the early
//! history windows. Nothing trades unless ATR is at least 1.5% of price. With
//! a squeeze the persona plays the band breakout; without one it plays
//! mid-band momentum.

use super::gates::{within, Confidence, GateTrail};
use super::{MarketContext, Strategy};
use crate::domain::{Action, Decision, Side, StrategyKind};
use crate::indicators::snapshot::{BB_MULTIPLIER, BB_PERIOD};
use crate::indicators::{bollinger, obv_change, obv_strength, IndicatorSnapshot};

const SQUEEZE_FACTOR: f64 = 0.7;
/// Mean width used when the series is too short for any history window.
const FALLBACK_WIDTH: f64 = 0.05;
const HISTORY_END: usize = 50;
const MIN_ATR_PCT: f64 = 1.5;
const VOLUME_RATIO: f64 = 1.3;
const OBV_LOOKBACK: usize = 5;
const OBV_STRENGTH: f64 = 0.1;

#[derive(Debug, Clone, Copy, Default)]
pub struct VolatilitySqueeze;

impl Strategy for VolatilitySqueeze {
    fn name(&self) -> &str {
        StrategyKind::VolatilitySqueeze.slug()
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::VolatilitySqueeze
    }

    fn evaluate(&self, ctx: &MarketContext<'_>) -> Decision {
        let snap = ctx.snapshot;
        let width = snap.bands.width();
        let mean_width = mean_history_width(&ctx.series.closes());
        let squeeze = width < mean_width * SQUEEZE_FACTOR;
        let volatile = snap.atr_pct > MIN_ATR_PCT;

        if !volatile {
            return Decision::hold(
                40,
                format!(
                    "4h low volatility: ATR {:.2}% below {MIN_ATR_PCT}%. Skipping.",
                    snap.atr_pct
                ),
            );
        }

        let flow = ObvFlow::read(snap);
        if squeeze {
            breakout(snap, &flow, width, mean_width)
        } else {
            momentum(snap, &flow)
        }
    }
}

struct ObvFlow {
    rising: bool,
    falling: bool,
    strength: f64,
    volume: bool,
}

impl ObvFlow {
    fn read(snap: &IndicatorSnapshot) -> Self {
        let delta = obv_change(&snap.obv, OBV_LOOKBACK);
        Self {
            rising: delta.is_some_and(|d| d > 0.0),
            falling: delta.is_some_and(|d| d < 0.0),
            strength: obv_strength(&snap.obv),
            volume: snap.volume.confirms(VOLUME_RATIO),
        }
    }

    /// Rising OBV on confirmed volume, or a sharp one-bar OBV jump.
    fn confirms_long(&self) -> bool {
        (self.rising && self.volume) || self.strength > OBV_STRENGTH
    }
}

fn breakout(snap: &IndicatorSnapshot, flow: &ObvFlow, width: f64, mean_width: f64) -> Decision {
    let side = if snap.price > snap.bands.upper {
        Some(Side::Buy)
    } else if snap.price < snap.bands.lower {
        Some(Side::Sell)
    } else {
        None
    };

    let mut gates = GateTrail::new();
    if let Some(side) = side {
        let (rsi_ok, obv_ok) = match side {
            Side::Buy => (within(snap.rsi, 55.0, 75.0), flow.confirms_long()),
            Side::Sell => (within(snap.rsi, 25.0, 45.0), flow.falling),
        };
        gates.check("rsi-band", rsi_ok);
        gates.check("obv", obv_ok);
        if gates.all_passed() {
            return Decision::new(
                Action::from(side),
                Confidence::base(88).bonus(flow.volume, 5).value(),
                format!(
                    "4h squeeze {side}: width {:.2}% vs mean {:.2}%, price {:.4} through band, RSI {:.0} {}.",
                    width * 100.0,
                    mean_width * 100.0,
                    snap.price,
                    snap.rsi,
                    gates.summary()
                ),
            );
        }
    }

    Decision::hold(
        60,
        format!(
            "4h squeeze: width {:.2}% under mean, waiting for breakout {}.",
            width * 100.0,
            gates.summary()
        ),
    )
}

fn momentum(snap: &IndicatorSnapshot, flow: &ObvFlow) -> Decision {
    let mut buy = GateTrail::new();
    buy.check("above-mid", snap.price > snap.ema20);
    buy.check("rsi-band", within(snap.rsi, 50.0, 70.0));
    buy.check("obv-rising", flow.rising);
    buy.check("volume", flow.volume);
    if buy.all_passed() {
        return Decision::new(
            Action::Buy,
            Confidence::base(75).bonus(flow.confirms_long(), 10).value(),
            format!(
                "4h momentum BUY: price above mid band, RSI {:.0}, OBV rising ({:.1}%). Target upper band {:.4}.",
                snap.rsi,
                flow.strength * 100.0,
                snap.bands.upper
            ),
        );
    }

    let mut sell = GateTrail::new();
    sell.check("below-mid", snap.price < snap.ema20);
    sell.check("rsi-band", within(snap.rsi, 30.0, 50.0));
    sell.check("obv-falling", flow.falling);
    sell.check("volume", flow.volume);
    if sell.all_passed() {
        return Decision::new(
            Action::Sell,
            Confidence::base(75)
                .bonus(flow.strength > OBV_STRENGTH, 10)
                .value(),
            format!(
                "4h momentum SELL: price below mid band, RSI {:.0}, OBV falling. Target lower band {:.4}.",
                snap.rsi, snap.bands.lower
            ),
        );
    }

    Decision::hold(
        0,
        format!(
            "4h range: price inside bands, RSI {:.0}. buy {} sell {}",
            snap.rsi,
            buy.summary(),
            sell.summary()
        ),
    )
}

/// Mean Bollinger width over the windows ending at bars 20 up to 49.
fn mean_history_width(closes: &[f64]) -> f64 {
    let end = closes.len().min(HISTORY_END);
    let widths: Vec<f64> = (BB_PERIOD..end)
        .map(|i| bollinger(&closes[..=i], BB_PERIOD, BB_MULTIPLIER).width())
        .collect();
    if widths.is_empty() {
        return FALLBACK_WIDTH;
    }
    widths.iter().sum::<f64>() / widths.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CandleSeries;
    use crate::indicators::{Bands, VolumeStats};
    use crate::strategy::test_support::series_from_closes;

    /// Choppy 100/110 history; bands narrowed to 2% so the last bar is a squeeze.
    fn fixture() -> (CandleSeries, IndicatorSnapshot) {
        let closes: Vec<f64> = (0..60)
            .map(|i| if i % 2 == 0 { 100.0 } else { 110.0 })
            .collect();
        let series = series_from_closes(&closes, 1000.0);
        let mut snap = IndicatorSnapshot::compute(&series).unwrap();
        snap.bands = Bands {
            upper: 101.0,
            middle: 100.0,
            lower: 99.0,
        };
        snap.atr_pct = 3.0;
        snap.rsi = 60.0;
        snap.price = 102.0;
        snap.obv = (0..60).map(|i| i as f64 * 100.0).collect();
        snap.volume = VolumeStats {
            current: 2000.0,
            average: 1000.0,
            ratio: 2.0,
        };
        (series, snap)
    }

    fn run(series: &CandleSeries, snap: &IndicatorSnapshot) -> Decision {
        VolatilitySqueeze.evaluate(&MarketContext::new(series, snap))
    }

    #[test]
    fn squeeze_breakout_up_buys() {
        let (series, snap) = fixture();
        let d = run(&series, &snap);
        assert_eq!(d.action, Action::Buy);
        assert_eq!(d.confidence, 93);
    }

    #[test]
    fn squeeze_breakdown_sells() {
        let (series, mut snap) = fixture();
        snap.price = 98.0;
        snap.rsi = 35.0;
        snap.obv = (0..60).map(|i| -(i as f64) * 100.0).collect();
        let d = run(&series, &snap);
        assert_eq!(d.action, Action::Sell);
        assert_eq!(d.confidence, 93);
    }

    #[test]
    fn squeeze_inside_bands_holds_at_60() {
        let (series, mut snap) = fixture();
        snap.price = 100.0;
        let d = run(&series, &snap);
        assert!(d.is_hold());
        assert_eq!(d.confidence, 60);
    }

    #[test]
    fn momentum_without_squeeze() {
        let (series, mut snap) = fixture();
        snap.bands = Bands {
            upper: 130.0,
            middle: 100.0,
            lower: 70.0,
        };
        snap.ema20 = 100.0;
        snap.price = 105.0;
        let d = run(&series, &snap);
        assert_eq!(d.action, Action::Buy);
        assert_eq!(d.confidence, 85);
    }

    #[test]
    fn no_edge_without_squeeze_holds_at_zero() {
        let (series, mut snap) = fixture();
        snap.bands = Bands {
            upper: 130.0,
            middle: 100.0,
            lower: 70.0,
        };
        snap.ema20 = 100.0;
        snap.price = 105.0;
        snap.rsi = 80.0;
        let d = run(&series, &snap);
        assert!(d.is_hold());
        assert_eq!(d.confidence, 0);
    }

    #[test]
    fn low_atr_skips() {
        let (series, mut snap) = fixture();
        snap.atr_pct = 1.0;
        let d = run(&series, &snap);
        assert!(d.is_hold());
        assert_eq!(d.confidence, 40);
    }

    #[test]
    fn short_history_uses_fallback_width() {
        assert_eq!(mean_history_width(&[100.0; 15]), FALLBACK_WIDTH);
        let choppy: Vec<f64> = (0..60)
            .map(|i| if i % 2 == 0 { 100.0 } else { 110.0 })
            .collect();
        let mean = mean_history_width(&choppy);
        assert!((mean - 20.0 / 105.0).abs() < 1e-9);
    }
}

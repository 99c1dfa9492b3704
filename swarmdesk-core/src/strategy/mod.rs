//! Persona strategies: turn one candidate's candles into a Decision.
//!
//! Each persona is an ordered list of named gates feeding a confidence
//! accumulator. A branch produces BUY or SELL only when every gate on it
//! passes; otherwise the persona returns HOLD with a diagnostic score and a
//! rationale naming the gate that failed.
//!
//! Strategies are pure: they see the candle series and its indicator snapshot,
//! never the agent's balance or open positions.

pub mod fib_swing;
pub mod gates;
pub mod macro_cross;
pub mod scalper;
pub mod squeeze;

pub use fib_swing::FibSwing;
pub use gates::{Confidence, GateTrail};
pub use macro_cross::MacroCross;
pub use scalper::Scalper;
pub use squeeze::VolatilitySqueeze;

use crate::domain::{CandleSeries, Decision, NewsEvent, StrategyKind};
use crate::indicators::IndicatorSnapshot;
use crate::news::NewsSafetyFilter;
use tracing::debug;

/// Minimum confidence for a non-HOLD decision to reach the sizer.
pub const DEFAULT_MIN_CONFIDENCE: u8 = 75;

/// Read-only market view handed to a strategy.
#[derive(Debug, Clone, Copy)]
pub struct MarketContext<'a> {
    pub series: &'a CandleSeries,
    pub snapshot: &'a IndicatorSnapshot,
}

impl<'a> MarketContext<'a> {
    pub fn new(series: &'a CandleSeries, snapshot: &'a IndicatorSnapshot) -> Self {
        Self { series, snapshot }
    }

    pub fn symbol(&self) -> &str {
        self.series.symbol()
    }
}

/// Trait for persona decision policies.
pub trait Strategy: Send + Sync {
    /// Human-readable name (e.g., "macro-cross").
    fn name(&self) -> &str;

    fn kind(&self) -> StrategyKind;

    /// Evaluate the most recent candle. Must not panic on short series.
    fn evaluate(&self, ctx: &MarketContext<'_>) -> Decision;
}

/// Create the strategy for a persona kind.
pub fn build_strategy(kind: StrategyKind) -> Box<dyn Strategy> {
    match kind {
        StrategyKind::FibonacciSwing => Box::new(FibSwing),
        StrategyKind::MacroCross => Box::new(MacroCross),
        StrategyKind::VolatilitySqueeze => Box::new(VolatilitySqueeze),
        StrategyKind::Scalper => Box::new(Scalper),
    }
}

/// Full decision pipeline for one candidate: strategy, news filter, then the
/// confidence threshold.
pub fn decide(
    strategy: &dyn Strategy,
    ctx: &MarketContext<'_>,
    news: Option<&NewsEvent>,
    filter: &NewsSafetyFilter,
    min_confidence: u8,
) -> Decision {
    let raw = strategy.evaluate(ctx);
    debug!(
        strategy = strategy.name(),
        symbol = ctx.symbol(),
        action = %raw.action,
        confidence = raw.confidence,
        "raw decision"
    );
    let filtered = filter.apply(raw, ctx.symbol(), news);
    apply_threshold(filtered, min_confidence)
}

/// Downgrade a non-HOLD decision below `min_confidence` to HOLD.
pub fn apply_threshold(decision: Decision, min_confidence: u8) -> Decision {
    if decision.is_hold() || decision.confidence >= min_confidence {
        return decision;
    }
    Decision::hold(
        decision.confidence.into(),
        format!(
            "Signal detected but confidence ({}%) below threshold ({min_confidence}%). {}",
            decision.confidence, decision.rationale
        ),
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::{Candle, CandleSeries, Interval};
    use chrono::TimeZone;

    /// Build a series from (open, high, low, close, volume) rows.
    pub fn series_from_rows(rows: &[(f64, f64, f64, f64, f64)]) -> CandleSeries {
        let base = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let candles = rows
            .iter()
            .enumerate()
            .map(|(i, &(open, high, low, close, volume))| Candle {
                open_time: base + chrono::Duration::hours(i as i64),
                open,
                high,
                low,
                close,
                volume,
            })
            .collect();
        CandleSeries::from_candles("TESTUSDT", Interval::OneHour, candles).unwrap()
    }

    /// Smooth series from closes: open = prev close, ±0.5% wicks, flat volume.
    pub fn series_from_closes(closes: &[f64], volume: f64) -> CandleSeries {
        let rows: Vec<_> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open = if i == 0 { close } else { closes[i - 1] };
                let high = open.max(close) * 1.005;
                let low = open.min(close) * 0.995;
                (open, high, low, close, volume)
            })
            .collect();
        series_from_rows(&rows)
    }
}

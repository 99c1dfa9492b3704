//! End-to-end scenarios through the public API.
//!
//! 1. ATR sizing: entry 100, ATR 2, ×1.5, R 2 → SL 97 / TP 106, banded, R:R ≥ 1
//! 2. Liquidation: BUY at ROI −92% forfeits margin, balance unchanged by the close
//! 3. News veto: an opposing headline turns a BUY into HOLD 0 before sizing
//! 4. Full pass: synthetic candles → snapshot → every persona decides without panicking

use chrono::Utc;
use swarmdesk_core::data::{MarketDataSource, PriceBook, PriceTick, SyntheticSource};
use swarmdesk_core::domain::{
    Action, Agent, Decision, Interval, NewsEvent, Outcome, Persona, Side, StrategyKind, Trend,
};
use swarmdesk_core::indicators::IndicatorSnapshot;
use swarmdesk_core::ledger::Ledger;
use swarmdesk_core::monitor::{ExitReason, PositionMonitor};
use swarmdesk_core::news::NewsSafetyFilter;
use swarmdesk_core::sizing::{raw_levels, OrderTicket, RiskSizer, SizingConfig};
use swarmdesk_core::strategy::{build_strategy, decide, MarketContext, Strategy, DEFAULT_MIN_CONFIDENCE};

// ── Helpers ──────────────────────────────────────────────────────────

fn synthetic_series(symbol: &str, interval: Interval) -> swarmdesk_core::domain::CandleSeries {
    let source = SyntheticSource::new(9, [(symbol.to_string(), 250.0)]);
    source.latest_prices().unwrap();
    source.candles(symbol, interval, 200).unwrap()
}

struct AlwaysBuy;

impl Strategy for AlwaysBuy {
    fn name(&self) -> &str {
        "always-buy"
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Scalper
    }

    fn evaluate(&self, _ctx: &MarketContext<'_>) -> Decision {
        Decision::new(Action::Buy, 95, "all gates passed")
    }
}

// ── 1. ATR sizing ────────────────────────────────────────────────────

#[test]
fn squeeze_sizing_scenario() {
    let persona = Persona::preset(StrategyKind::VolatilitySqueeze);
    let raw = raw_levels(Side::Buy, 100.0, 2.0, &persona.risk);
    assert!((raw.stop_loss - 97.0).abs() < 1e-9);
    assert!((raw.take_profit - 106.0).abs() < 1e-9);

    let decision = Decision::new(Action::Buy, 90, "squeeze breakout");
    let ticket = RiskSizer::new(SizingConfig::default())
        .size(&persona, &decision, "SOLUSDT", 100.0, 2.0, 100.0)
        .unwrap();
    let sl_pct = ticket.stop_distance() / 100.0;
    let tp_pct = ticket.target_distance() / 100.0;
    assert!(sl_pct >= persona.risk.min_tp_pct - 1e-12 && sl_pct <= persona.risk.max_tp_pct + 1e-12);
    assert!(tp_pct >= persona.risk.min_tp_pct - 1e-12 && tp_pct <= persona.risk.max_tp_pct + 1e-12);
    assert!(ticket.target_distance() >= ticket.stop_distance());
    assert!((ticket.stop_loss - 97.0).abs() < 1e-9);
    assert!((ticket.take_profit - 106.0).abs() < 1e-9);
}

// ── 2. Liquidation ───────────────────────────────────────────────────

#[test]
fn liquidation_forfeits_margin() {
    let agent = Agent::new(Persona::preset(StrategyKind::VolatilitySqueeze), 100.0);
    let id = agent.id.clone();
    let ledger = Ledger::new(vec![agent], 1);
    let ticket = OrderTicket {
        symbol: "DOGEUSDT".into(),
        side: Side::Buy,
        entry_price: 100.0,
        take_profit: 110.0,
        stop_loss: 85.0,
        margin: 10.0,
        leverage: 10,
        confidence: 90,
        rationale: "test".into(),
    };
    ledger.open_position(&id, &ticket, Utc::now()).unwrap();
    let before_close = ledger.with_agent(&id, |a| a.balance).unwrap();
    assert_eq!(before_close, 90.0);

    // −9.2% × 10x = −92% ROI
    let book = PriceBook::from([(
        "DOGEUSDT".to_string(),
        PriceTick {
            price: 90.8,
            trend: Trend::Down,
        },
    )]);
    let settled = ledger
        .monitor_agent(&id, &book, &PositionMonitor::default(), Utc::now())
        .unwrap();
    assert_eq!(settled.len(), 1);
    assert_eq!(settled[0].reason, ExitReason::Liquidation);
    assert_eq!(settled[0].outcome, Outcome::Liquidation);
    assert_eq!(settled[0].pnl, -10.0);

    let (balance, losses, liquidations) = ledger
        .with_agent(&id, |a| (a.balance, a.counters.losses, a.counters.liquidations))
        .unwrap();
    assert_eq!(balance, before_close);
    assert_eq!(losses, 1);
    assert_eq!(liquidations, 1);
}

// ── 3. News veto ─────────────────────────────────────────────────────

#[test]
fn opposing_news_vetoes_before_sizing() {
    let series = synthetic_series("BTCUSDT", Interval::OneHour);
    let snapshot = IndicatorSnapshot::compute(&series).unwrap();
    let ctx = MarketContext::new(&series, &snapshot);
    let news = NewsEvent {
        id: "x".into(),
        headline: "Exchange Hack Rumours".into(),
        summary: String::new(),
        symbol: "BTCUSDT".into(),
        bias: Side::Sell,
    };

    let decision = decide(
        &AlwaysBuy,
        &ctx,
        Some(&news),
        &NewsSafetyFilter::default(),
        DEFAULT_MIN_CONFIDENCE,
    );
    assert_eq!(decision.action, Action::Hold);
    assert_eq!(decision.confidence, 0);
    assert!(decision.rationale.contains("SAFETY LOCK"));
    assert!(decision.rationale.contains("Exchange Hack Rumours"));

    let err = RiskSizer::new(SizingConfig::default())
        .size(
            &Persona::preset(StrategyKind::Scalper),
            &decision,
            "BTCUSDT",
            snapshot.price,
            snapshot.atr,
            100.0,
        )
        .unwrap_err();
    assert_eq!(err, swarmdesk_core::sizing::SizingRejection::NotActionable);
}

// ── 4. Full pass ─────────────────────────────────────────────────────

#[test]
fn every_persona_decides_on_synthetic_candles() {
    for persona in Persona::roster() {
        let series = synthetic_series("ETHUSDT", persona.interval);
        let snapshot = IndicatorSnapshot::compute(&series).unwrap();
        let ctx = MarketContext::new(&series, &snapshot);
        let strategy = build_strategy(persona.kind);
        let decision = decide(
            strategy.as_ref(),
            &ctx,
            None,
            &NewsSafetyFilter::default(),
            DEFAULT_MIN_CONFIDENCE,
        );
        assert!(decision.confidence <= 100);
        assert!(!decision.rationale.is_empty(), "{} gave no rationale", persona.name);
        if !decision.is_hold() {
            assert!(decision.confidence >= DEFAULT_MIN_CONFIDENCE);
        }
    }
}

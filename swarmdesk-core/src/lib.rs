//! SwarmDesk Core: domain types, indicators, persona strategies, risk sizing,
//! the position ledger and its monitor, and market data sources.
//!
//! This crate contains everything an agent does on one tick:
//! - Indicators over OHLCV candle series
//! - Four persona strategies built from named gates and a confidence score
//! - News safety filter (veto or confirm)
//! - Risk sizer turning a decision into an order ticket with exit levels
//! - Ledger of per-agent wallets and open positions, one mutex per agent
//! - Position monitor state machine with a stop ratchet
//! - Market data sources with ordered fallback

pub mod data;
pub mod domain;
pub mod indicators;
pub mod ledger;
pub mod monitor;
pub mod news;
pub mod rng;
pub mod sizing;
pub mod strategy;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything shared across rayon workers is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Agent>();
        require_sync::<domain::Agent>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::CandleSeries>();
        require_sync::<domain::CandleSeries>();
        require_send::<domain::Decision>();
        require_sync::<domain::Decision>();
        require_send::<domain::NewsEvent>();
        require_sync::<domain::NewsEvent>();

        // Shared services
        require_send::<ledger::Ledger>();
        require_sync::<ledger::Ledger>();
        require_send::<monitor::PositionMonitor>();
        require_sync::<monitor::PositionMonitor>();
        require_send::<sizing::RiskSizer>();
        require_sync::<sizing::RiskSizer>();
        require_send::<news::NewsSafetyFilter>();
        require_sync::<news::NewsSafetyFilter>();
        require_send::<data::MarketFeed>();
        require_sync::<data::MarketFeed>();
        require_send::<rng::RngHierarchy>();
        require_sync::<rng::RngHierarchy>();
        require_send::<rng::FlavorRng>();

        // Strategies
        require_send::<Box<dyn strategy::Strategy>>();
        require_sync::<Box<dyn strategy::Strategy>>();
        require_send::<strategy::FibSwing>();
        require_sync::<strategy::MacroCross>();
        require_sync::<strategy::VolatilitySqueeze>();
        require_sync::<strategy::Scalper>();
    }

    /// Architecture contract: strategies see market data only, never a wallet.
    ///
    /// `Strategy::evaluate` takes a `MarketContext` (series + snapshot) and
    /// nothing else, so balance and open positions cannot leak into a signal.
    #[test]
    fn strategy_trait_has_no_wallet_parameter() {
        fn _check_trait_object_builds(
            s: &dyn strategy::Strategy,
            ctx: &strategy::MarketContext<'_>,
        ) -> domain::Decision {
            s.evaluate(ctx)
        }
    }
}

//! Position monitor: the per-tick state machine for one open position.
//!
//! ```text
//! OPEN(not trailing) ──ROI > 10% and trend/5% move──▶ OPEN(trailing)
//!        │                                                  │
//!        └────────── liquidation | TP | SL ─────────────────┴──▶ CLOSED
//! ```
//!
//! The monitor only mutates the position (PnL, stop, trailing flag) and
//! reports an exit. Settlement against the agent lives in `settlement`.

pub mod ratchet;
pub mod settlement;

pub use ratchet::StopRatchet;
pub use settlement::{settle, ExitReason, Settlement};

use crate::domain::{Position, Side, Trend};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// ROI% above which trailing may activate.
    pub trail_activation_roi: f64,
    /// Price move from entry (fraction) that activates trailing without trend support.
    pub breakout_move: f64,
    /// Minimum buffer past entry for the activation stop.
    pub breakeven_buffer: f64,
    /// Margin fraction locked in at activation, divided by leverage.
    pub lock_in: f64,
    /// Trailing distance from price while trailing.
    pub trail_distance: f64,
    /// ROI% at or below which the position is liquidated.
    pub liquidation_roi: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            trail_activation_roi: 10.0,
            breakout_move: 0.05,
            breakeven_buffer: 0.001,
            lock_in: 0.03,
            trail_distance: 0.02,
            liquidation_roi: -90.0,
        }
    }
}

/// What happened to a position on one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Hold,
    /// Trailing just switched on; stop moved to the lock-in level.
    TrailingActivated { stop: f64 },
    /// Trailing stop tightened.
    StopTightened { stop: f64 },
    Exit(ExitReason),
}

#[derive(Debug, Clone, Default)]
pub struct PositionMonitor {
    config: MonitorConfig,
}

impl PositionMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Advance one position by one tick at `price`.
    ///
    /// Trailing updates happen before exit checks, so a stop moved this tick
    /// can close the position on the same tick.
    pub fn step(&self, position: &mut Position, price: f64, trend: Trend) -> Step {
        let cfg = &self.config;
        position.unrealized_pnl = position.pnl_at(price);
        let roi = position.roi_pct_at(price);

        let mut step = Step::Hold;
        if !position.is_trailing {
            if roi > cfg.trail_activation_roi && self.activation_move(position, price, trend) {
                position.is_trailing = true;
                let stop = self.ratchet(position, self.lock_in_stop(position));
                step = Step::TrailingActivated { stop };
            }
        } else {
            let candidate = price * (1.0 - position.side.sign() * cfg.trail_distance);
            let ratchet = StopRatchet::with_initial_level(position.side, position.stop_loss);
            if ratchet.would_tighten(candidate) {
                let stop = self.ratchet(position, candidate);
                step = Step::StopTightened { stop };
            }
        }

        if roi <= cfg.liquidation_roi {
            return Step::Exit(ExitReason::Liquidation);
        }
        if position.take_profit_hit(price) {
            return Step::Exit(ExitReason::TakeProfit);
        }
        if position.stop_loss_hit(price) {
            return Step::Exit(ExitReason::StopLoss);
        }
        step
    }

    fn activation_move(&self, position: &Position, price: f64, trend: Trend) -> bool {
        let entry = position.entry_price;
        let beyond = match position.side {
            Side::Buy => price > entry * (1.0 + self.config.breakout_move),
            Side::Sell => price < entry * (1.0 - self.config.breakout_move),
        };
        trend.favours(position.side) || beyond
    }

    /// Stop that locks in a small gain: at least `breakeven_buffer` past entry.
    fn lock_in_stop(&self, position: &Position) -> f64 {
        let entry = position.entry_price;
        let lev = f64::from(position.leverage.max(1));
        let buffer = self.config.breakeven_buffer;
        let lock = self.config.lock_in / lev;
        match position.side {
            Side::Buy => (entry * (1.0 + buffer)).max(entry * (1.0 + lock)),
            Side::Sell => (entry * (1.0 - buffer)).min(entry * (1.0 - lock)),
        }
    }

    fn ratchet(&self, position: &mut Position, proposed: f64) -> f64 {
        let mut ratchet = StopRatchet::with_initial_level(position.side, position.stop_loss);
        position.stop_loss = ratchet.apply(proposed);
        position.stop_loss
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::sample_position;

    #[test]
    fn pnl_and_roi_follow_price() {
        let m = PositionMonitor::default();
        let mut p = sample_position(Side::Buy);
        assert_eq!(m.step(&mut p, 101.0, Trend::Flat), Step::Hold);
        // 1% × margin 10 × lev 10
        assert!((p.unrealized_pnl - 1.0).abs() < 1e-9);
    }

    #[test]
    fn trailing_activates_with_trend() {
        let m = PositionMonitor::default();
        let mut p = sample_position(Side::Buy);
        // ROI 20% with an up-trend
        let step = m.step(&mut p, 102.0, Trend::Up);
        assert!(p.is_trailing);
        // max(100.1, 100 * 1.003) = 100.3
        assert_eq!(step, Step::TrailingActivated { stop: p.stop_loss });
        assert!((p.stop_loss - 100.3).abs() < 1e-9);
    }

    #[test]
    fn no_activation_without_trend_or_breakout() {
        let m = PositionMonitor::default();
        let mut p = sample_position(Side::Buy);
        assert_eq!(m.step(&mut p, 102.0, Trend::Down), Step::Hold);
        assert!(!p.is_trailing);
    }

    #[test]
    fn breakout_move_activates_without_trend() {
        let m = PositionMonitor::default();
        let mut p = sample_position(Side::Sell);
        let step = m.step(&mut p, 94.0, Trend::Flat);
        assert!(matches!(step, Step::TrailingActivated { .. }));
        assert!((p.stop_loss - 99.7).abs() < 1e-9);
    }

    #[test]
    fn trailing_stop_only_tightens() {
        let m = PositionMonitor::default();
        let mut p = sample_position(Side::Buy);
        p.take_profit = 200.0;
        m.step(&mut p, 102.0, Trend::Up);
        let step = m.step(&mut p, 110.0, Trend::Up);
        assert!((p.stop_loss - 107.8).abs() < 1e-9);
        assert!(matches!(step, Step::StopTightened { .. }));

        // Pull back: candidate 105.84 is looser, stop stays.
        assert_eq!(m.step(&mut p, 108.0, Trend::Down), Step::Hold);
        assert!((p.stop_loss - 107.8).abs() < 1e-9);
    }

    #[test]
    fn exit_priority_liquidation_first() {
        let m = PositionMonitor::default();
        let mut p = sample_position(Side::Buy);
        // -9.2% × 10 = -92% ROI; also through SL.
        assert_eq!(
            m.step(&mut p, 90.8, Trend::Down),
            Step::Exit(ExitReason::Liquidation)
        );
    }

    #[test]
    fn take_profit_and_stop_loss() {
        let m = PositionMonitor::default();
        let mut p = sample_position(Side::Sell);
        assert_eq!(
            m.step(&mut p, 89.0, Trend::Down),
            Step::Exit(ExitReason::TakeProfit)
        );
        let mut p = sample_position(Side::Sell);
        assert_eq!(
            m.step(&mut p, 105.5, Trend::Up),
            Step::Exit(ExitReason::StopLoss)
        );
    }
}

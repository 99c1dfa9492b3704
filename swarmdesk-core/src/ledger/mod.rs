//! Position ledger: every agent's wallet and open positions.
//!
//! Each agent sits behind its own mutex. Every command (open, close, trail,
//! monitor) runs start to finish under that one lock, so a settlement can
//! never interleave with an open on the same agent while other agents
//! proceed in parallel.
//!
//! Accounting identity per agent, at every point between commands:
//! `equity == balance + Σ(margin + unrealized_pnl)`.

use crate::data::PriceBook;
use crate::domain::{Agent, AgentId, Position, PositionId};
use crate::monitor::{settle, ExitReason, PositionMonitor, Settlement, Step, StopRatchet};
use crate::sizing::OrderTicket;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_MAX_OPEN_POSITIONS: usize = 1;

#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("unknown agent: {0}")]
    UnknownAgent(AgentId),

    #[error("{agent} has no open position {position}")]
    UnknownPosition { agent: AgentId, position: PositionId },

    #[error("{agent} already holds {max} open position(s)")]
    AtCapacity { agent: AgentId, max: usize },

    #[error("{agent} cannot lock {margin:.2} margin with balance {balance:.2}")]
    InsufficientBalance {
        agent: AgentId,
        margin: f64,
        balance: f64,
    },

    #[error("ticket for {symbol} has exit levels on the wrong side of entry")]
    Misoriented { symbol: String },
}

struct Slot {
    id: AgentId,
    agent: Mutex<Agent>,
}

pub struct Ledger {
    slots: Vec<Slot>,
    max_open_positions: usize,
}

impl Ledger {
    pub fn new(agents: Vec<Agent>, max_open_positions: usize) -> Self {
        Self {
            slots: agents
                .into_iter()
                .map(|agent| Slot {
                    id: agent.id.clone(),
                    agent: Mutex::new(agent),
                })
                .collect(),
            max_open_positions: max_open_positions.max(1),
        }
    }

    pub fn max_open_positions(&self) -> usize {
        self.max_open_positions
    }

    pub fn agent_ids(&self) -> Vec<AgentId> {
        self.slots.iter().map(|s| s.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn lock(&self, id: &AgentId) -> Result<MutexGuard<'_, Agent>, LedgerError> {
        self.slots
            .iter()
            .find(|s| &s.id == id)
            .map(|s| s.agent.lock().unwrap_or_else(PoisonError::into_inner))
            .ok_or_else(|| LedgerError::UnknownAgent(id.clone()))
    }

    /// Read-only view of one agent under its lock.
    pub fn with_agent<R>(&self, id: &AgentId, f: impl FnOnce(&Agent) -> R) -> Result<R, LedgerError> {
        Ok(f(&*self.lock(id)?))
    }

    /// Whether the agent has a free position slot.
    pub fn has_capacity(&self, id: &AgentId) -> Result<bool, LedgerError> {
        Ok(self.lock(id)?.positions.len() < self.max_open_positions)
    }

    /// Note what the agent looked at and why it did (or did not) act.
    pub fn record_scan(
        &self,
        id: &AgentId,
        symbol: Option<&str>,
        reason: impl Into<String>,
    ) -> Result<(), LedgerError> {
        let mut agent = self.lock(id)?;
        if let Some(symbol) = symbol {
            agent.last_symbol = Some(symbol.to_string());
        }
        agent.last_reason = reason.into();
        Ok(())
    }

    /// Open a position from a sized ticket, debiting its margin.
    pub fn open_position(
        &self,
        id: &AgentId,
        ticket: &OrderTicket,
        now: DateTime<Utc>,
    ) -> Result<Position, LedgerError> {
        let mut agent = self.lock(id)?;
        if agent.positions.len() >= self.max_open_positions {
            return Err(LedgerError::AtCapacity {
                agent: id.clone(),
                max: self.max_open_positions,
            });
        }
        if ticket.margin <= 0.0 || ticket.margin > agent.balance {
            return Err(LedgerError::InsufficientBalance {
                agent: id.clone(),
                margin: ticket.margin,
                balance: agent.balance,
            });
        }

        let position = Position {
            id: agent.next_position_id(),
            symbol: ticket.symbol.clone(),
            side: ticket.side,
            entry_price: ticket.entry_price,
            take_profit: ticket.take_profit,
            stop_loss: ticket.stop_loss,
            margin: ticket.margin,
            leverage: ticket.leverage,
            opened_at: now,
            is_trailing: false,
            unrealized_pnl: 0.0,
        };
        if !position.is_oriented() {
            return Err(LedgerError::Misoriented {
                symbol: ticket.symbol.clone(),
            });
        }

        agent.balance -= position.margin;
        agent.positions.push(position.clone());
        agent.last_symbol = Some(ticket.symbol.clone());
        agent.last_reason = ticket.rationale.clone();
        agent.refresh_status();

        info!(
            agent = %id,
            position = %position.id,
            symbol = %position.symbol,
            side = %position.side,
            entry = position.entry_price,
            tp = position.take_profit,
            sl = position.stop_loss,
            margin = position.margin,
            leverage = position.leverage,
            "position opened"
        );
        Ok(position)
    }

    /// Manual close at `price`, or at entry when no price is known.
    pub fn close_position(
        &self,
        id: &AgentId,
        position: &PositionId,
        price: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<Settlement, LedgerError> {
        let mut agent = self.lock(id)?;
        let entry = agent
            .position(position)
            .map(|p| p.entry_price)
            .ok_or_else(|| LedgerError::UnknownPosition {
                agent: id.clone(),
                position: position.clone(),
            })?;
        let exit = price.filter(|p| p.is_finite() && *p > 0.0).unwrap_or(entry);
        settle(&mut agent, position, exit, ExitReason::Manual, now).ok_or_else(|| {
            LedgerError::UnknownPosition {
                agent: id.clone(),
                position: position.clone(),
            }
        })
    }

    /// Propose a new stop; applied only if it tightens. Returns the stop in
    /// force afterwards.
    pub fn update_trailing_stop(
        &self,
        id: &AgentId,
        position: &PositionId,
        proposed: f64,
    ) -> Result<f64, LedgerError> {
        let mut agent = self.lock(id)?;
        let pos = agent
            .position_mut(position)
            .ok_or_else(|| LedgerError::UnknownPosition {
                agent: id.clone(),
                position: position.clone(),
            })?;
        let mut ratchet = StopRatchet::with_initial_level(pos.side, pos.stop_loss);
        pos.stop_loss = ratchet.apply(proposed);
        Ok(pos.stop_loss)
    }

    /// Run one monitor tick over every open position of `id` that has a
    /// price in `book`, settling the ones that exit.
    pub fn monitor_agent(
        &self,
        id: &AgentId,
        book: &PriceBook,
        monitor: &PositionMonitor,
        now: DateTime<Utc>,
    ) -> Result<Vec<Settlement>, LedgerError> {
        let mut agent = self.lock(id)?;
        let mut exits = Vec::new();
        for position in agent.positions.iter_mut() {
            let Some(tick) = book.get(&position.symbol) else {
                continue;
            };
            match monitor.step(position, tick.price, tick.trend) {
                Step::Hold => {}
                Step::TrailingActivated { stop } => {
                    info!(agent = %id, position = %position.id, stop, "trailing stop activated");
                }
                Step::StopTightened { stop } => {
                    debug!(agent = %id, position = %position.id, stop, "trailing stop tightened");
                }
                Step::Exit(reason) => exits.push((position.id.clone(), tick.price, reason)),
            }
        }

        Ok(exits
            .into_iter()
            .filter_map(|(position, price, reason)| settle(&mut agent, &position, price, reason, now))
            .collect())
    }

    /// Clone of every agent, in roster order.
    pub fn snapshot(&self) -> Vec<Agent> {
        self.slots
            .iter()
            .map(|s| s.agent.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .collect()
    }

    /// Replace agents whose id matches one in `agents`. Returns how many were
    /// restored; unknown ids are ignored.
    pub fn restore(&self, agents: Vec<Agent>) -> usize {
        let mut restored = 0;
        for incoming in agents {
            if let Some(slot) = self.slots.iter().find(|s| s.id == incoming.id) {
                *slot.agent.lock().unwrap_or_else(PoisonError::into_inner) = incoming;
                restored += 1;
            }
        }
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PriceTick;
    use crate::domain::{Outcome, Persona, Side, StrategyKind, Trend};

    fn ledger() -> (Ledger, AgentId) {
        let agent = Agent::new(Persona::preset(StrategyKind::VolatilitySqueeze), 100.0);
        let id = agent.id.clone();
        (Ledger::new(vec![agent], DEFAULT_MAX_OPEN_POSITIONS), id)
    }

    fn ticket(side: Side) -> OrderTicket {
        let (tp, sl) = match side {
            Side::Buy => (106.0, 97.0),
            Side::Sell => (94.0, 103.0),
        };
        OrderTicket {
            symbol: "SOLUSDT".into(),
            side,
            entry_price: 100.0,
            take_profit: tp,
            stop_loss: sl,
            margin: 10.0,
            leverage: 10,
            confidence: 90,
            rationale: "breakout".into(),
        }
    }

    fn book(price: f64, trend: Trend) -> PriceBook {
        PriceBook::from([("SOLUSDT".to_string(), PriceTick { price, trend })])
    }

    #[test]
    fn open_debits_margin() {
        let (ledger, id) = ledger();
        let pos = ledger.open_position(&id, &ticket(Side::Buy), Utc::now()).unwrap();
        let (balance, open, reason) = ledger
            .with_agent(&id, |a| (a.balance, a.positions.len(), a.last_reason.clone()))
            .unwrap();
        assert_eq!(balance, 90.0);
        assert_eq!(open, 1);
        assert_eq!(reason, "breakout");
        assert_eq!(pos.id.as_str(), format!("{id}-1"));
    }

    #[test]
    fn capacity_is_enforced() {
        let (ledger, id) = ledger();
        ledger.open_position(&id, &ticket(Side::Buy), Utc::now()).unwrap();
        assert!(!ledger.has_capacity(&id).unwrap());
        let err = ledger.open_position(&id, &ticket(Side::Sell), Utc::now()).unwrap_err();
        assert!(matches!(err, LedgerError::AtCapacity { max: 1, .. }));
    }

    #[test]
    fn rejects_margin_above_balance_and_bad_levels() {
        let (ledger, id) = ledger();
        let mut big = ticket(Side::Buy);
        big.margin = 150.0;
        assert!(matches!(
            ledger.open_position(&id, &big, Utc::now()),
            Err(LedgerError::InsufficientBalance { .. })
        ));

        let mut flipped = ticket(Side::Buy);
        flipped.take_profit = 95.0;
        assert!(matches!(
            ledger.open_position(&id, &flipped, Utc::now()),
            Err(LedgerError::Misoriented { .. })
        ));
        assert_eq!(ledger.with_agent(&id, |a| a.balance).unwrap(), 100.0);
    }

    #[test]
    fn manual_close_without_price_settles_flat() {
        let (ledger, id) = ledger();
        let pos = ledger.open_position(&id, &ticket(Side::Buy), Utc::now()).unwrap();
        let s = ledger.close_position(&id, &pos.id, None, Utc::now()).unwrap();
        assert_eq!(s.exit_price, 100.0);
        assert_eq!(s.reason, ExitReason::Manual);
        assert_eq!(ledger.with_agent(&id, |a| a.balance).unwrap(), 100.0);
    }

    #[test]
    fn manual_close_at_price_books_pnl() {
        let (ledger, id) = ledger();
        let pos = ledger.open_position(&id, &ticket(Side::Sell), Utc::now()).unwrap();
        let s = ledger.close_position(&id, &pos.id, Some(98.0), Utc::now()).unwrap();
        // 2% move × 10 margin × 10 leverage
        assert!((s.pnl - 2.0).abs() < 1e-9);
        assert_eq!(s.outcome, Outcome::Win);
        assert!((ledger.with_agent(&id, |a| a.balance).unwrap() - 102.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_ids_are_errors() {
        let (ledger, id) = ledger();
        let ghost = AgentId::new("ghost");
        assert_eq!(
            ledger.has_capacity(&ghost).unwrap_err(),
            LedgerError::UnknownAgent(ghost)
        );
        let missing = PositionId::from("nope");
        assert!(matches!(
            ledger.close_position(&id, &missing, Some(1.0), Utc::now()),
            Err(LedgerError::UnknownPosition { .. })
        ));
    }

    #[test]
    fn trailing_updates_only_tighten() {
        let (ledger, id) = ledger();
        let pos = ledger.open_position(&id, &ticket(Side::Buy), Utc::now()).unwrap();
        assert_eq!(ledger.update_trailing_stop(&id, &pos.id, 99.0).unwrap(), 99.0);
        assert_eq!(ledger.update_trailing_stop(&id, &pos.id, 96.0).unwrap(), 99.0);
    }

    #[test]
    fn monitor_settles_take_profit() {
        let (ledger, id) = ledger();
        ledger.open_position(&id, &ticket(Side::Buy), Utc::now()).unwrap();
        let monitor = PositionMonitor::default();

        let none = ledger
            .monitor_agent(&id, &book(101.0, Trend::Up), &monitor, Utc::now())
            .unwrap();
        assert!(none.is_empty());

        let settled = ledger
            .monitor_agent(&id, &book(106.5, Trend::Up), &monitor, Utc::now())
            .unwrap();
        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].reason, ExitReason::TakeProfit);
        assert!((settled[0].pnl - 6.5).abs() < 1e-9);
        let (balance, wins) = ledger.with_agent(&id, |a| (a.balance, a.counters.wins)).unwrap();
        assert!((balance - 106.5).abs() < 1e-9);
        assert_eq!(wins, 1);
    }

    #[test]
    fn monitor_skips_symbols_without_price() {
        let (ledger, id) = ledger();
        ledger.open_position(&id, &ticket(Side::Buy), Utc::now()).unwrap();
        let settled = ledger
            .monitor_agent(&id, &PriceBook::new(), &PositionMonitor::default(), Utc::now())
            .unwrap();
        assert!(settled.is_empty());
        assert!(!ledger.has_capacity(&id).unwrap());
    }

    #[test]
    fn snapshot_and_restore() {
        let (ledger, id) = ledger();
        let mut saved = ledger.snapshot();
        saved[0].balance = 42.0;
        saved.push(Agent::new(Persona::preset(StrategyKind::Scalper), 1.0));
        assert_eq!(ledger.restore(saved), 1);
        assert_eq!(ledger.with_agent(&id, |a| a.balance).unwrap(), 42.0);
    }
}

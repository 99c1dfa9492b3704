//! Closing a position against its agent's wallet and counters.

use crate::domain::{Agent, Outcome, PositionId, Side};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    Liquidation,
    Manual,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::TakeProfit => f.write_str("TAKE_PROFIT"),
            ExitReason::StopLoss => f.write_str("STOP_LOSS"),
            ExitReason::Liquidation => f.write_str("LIQUIDATION"),
            ExitReason::Manual => f.write_str("MANUAL"),
        }
    }
}

/// Record of one closed position. Flat so it serializes straight to CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub agent: String,
    pub position_id: String,
    pub symbol: String,
    pub side: Side,
    pub entry_price: f64,
    pub exit_price: f64,
    pub margin: f64,
    pub leverage: u32,
    pub pnl: f64,
    pub reason: ExitReason,
    pub outcome: Outcome,
    pub closed_at: DateTime<Utc>,
}

/// Remove `id` from `agent` and settle it at `price`.
///
/// Liquidation forfeits the margin: the balance is untouched and the full
/// margin is booked as a loss. Otherwise margin + PnL (rounded to cents)
/// returns to the balance. Returns `None` when the position is unknown.
pub fn settle(
    agent: &mut Agent,
    id: &PositionId,
    price: f64,
    reason: ExitReason,
    now: DateTime<Utc>,
) -> Option<Settlement> {
    let index = agent.positions.iter().position(|p| &p.id == id)?;
    let position = agent.positions.remove(index);

    let (pnl, outcome) = if reason == ExitReason::Liquidation {
        (-position.margin, Outcome::Liquidation)
    } else {
        let pnl = round_cents(position.pnl_at(price));
        let outcome = if pnl > 0.0 { Outcome::Win } else { Outcome::Loss };
        agent.balance += position.margin + pnl;
        (pnl, outcome)
    };

    agent.counters.record(outcome, pnl);
    agent.last_outcome = Some(outcome);
    agent.refresh_status();

    info!(
        agent = %agent.id,
        position = %position.id,
        symbol = %position.symbol,
        side = %position.side,
        reason = %reason,
        outcome = %outcome,
        pnl,
        balance = agent.balance,
        "position settled"
    );

    Some(Settlement {
        agent: agent.id.to_string(),
        position_id: position.id.to_string(),
        symbol: position.symbol,
        side: position.side,
        entry_price: position.entry_price,
        exit_price: price,
        margin: position.margin,
        leverage: position.leverage,
        pnl,
        reason,
        outcome,
        closed_at: now,
    })
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//! Agent: one autonomous trader: persona, wallet, counters, open positions.

use super::ids::{AgentId, PositionId};
use super::persona::Persona;
use super::position::Position;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a settled position ended for the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Win,
    Loss,
    Liquidation,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => f.write_str("WIN"),
            Outcome::Loss => f.write_str("LOSS"),
            Outcome::Liquidation => f.write_str("LIQUIDATION"),
        }
    }
}

/// Cumulative realized results. Every field only ever grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Counters {
    pub total_profit: f64,
    pub total_loss: f64,
    pub wins: u64,
    pub losses: u64,
    /// Liquidations are also counted in `losses`.
    pub liquidations: u64,
}

impl Counters {
    pub fn net(&self) -> f64 {
        self.total_profit - self.total_loss
    }

    pub fn trades(&self) -> u64 {
        self.wins + self.losses
    }

    /// Win rate in percent, `None` before the first settled trade.
    pub fn win_rate(&self) -> Option<f64> {
        let trades = self.trades();
        (trades > 0).then(|| self.wins as f64 / trades as f64 * 100.0)
    }

    /// Record a realized result. Losses are passed as negative `pnl`.
    pub fn record(&mut self, outcome: Outcome, pnl: f64) {
        match outcome {
            Outcome::Win => {
                self.total_profit += pnl;
                self.wins += 1;
            }
            Outcome::Loss => {
                self.total_loss += pnl.abs();
                self.losses += 1;
            }
            Outcome::Liquidation => {
                self.total_loss += pnl.abs();
                self.losses += 1;
                self.liquidations += 1;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "open", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStatus {
    Scanning,
    Trading(usize),
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Scanning => f.write_str("SCANNING"),
            AgentStatus::Trading(n) => write!(f, "TRADING ({n})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub persona: Persona,
    pub balance: f64,
    pub counters: Counters,
    pub positions: Vec<Position>,
    pub status: AgentStatus,
    /// Rationale of the most recent evaluation.
    pub last_reason: String,
    /// Last candidate symbol analysed.
    pub last_symbol: Option<String>,
    pub last_outcome: Option<Outcome>,
    next_position_seq: u64,
}

impl Agent {
    pub fn new(persona: Persona, starting_balance: f64) -> Self {
        Self {
            id: AgentId::new(persona.name.clone()),
            persona,
            balance: starting_balance,
            counters: Counters::default(),
            positions: Vec::new(),
            status: AgentStatus::Scanning,
            last_reason: String::new(),
            last_symbol: None,
            last_outcome: None,
            next_position_seq: 1,
        }
    }

    pub fn next_position_id(&mut self) -> PositionId {
        let id = PositionId::mint(&self.id, self.next_position_seq);
        self.next_position_seq += 1;
        id
    }

    pub fn position(&self, id: &PositionId) -> Option<&Position> {
        self.positions.iter().find(|p| &p.id == id)
    }

    pub fn position_mut(&mut self, id: &PositionId) -> Option<&mut Position> {
        self.positions.iter_mut().find(|p| &p.id == id)
    }

    /// Margin currently locked in open positions.
    pub fn locked_margin(&self) -> f64 {
        self.positions.iter().map(|p| p.margin).sum()
    }

    /// Balance plus locked margin plus unrealized PnL.
    pub fn equity(&self) -> f64 {
        self.balance
            + self
                .positions
                .iter()
                .map(|p| p.margin + p.unrealized_pnl)
                .sum::<f64>()
    }

    pub fn refresh_status(&mut self) {
        self.status = if self.positions.is_empty() {
            AgentStatus::Scanning
        } else {
            AgentStatus::Trading(self.positions.len())
        };
    }
}

//! Desk event journal: a bounded log of recent events plus a longer, also
//! bounded, window of settled trades for export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::path::Path;
use swarmdesk_core::domain::Outcome;
use swarmdesk_core::monitor::{ExitReason, Settlement};

use crate::error::DeskError;

/// Settled trades kept when no explicit limit is given.
pub const DEFAULT_TRADE_CAPACITY: usize = 500;

fn default_trade_capacity() -> usize {
    DEFAULT_TRADE_CAPACITY
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    Info,
    Open,
    Win,
    Loss,
    Liquidation,
    News,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryKind::Info => "INFO",
            EntryKind::Open => "OPEN",
            EntryKind::Win => "WIN",
            EntryKind::Loss => "LOSS",
            EntryKind::Liquidation => "LIQUIDATION",
            EntryKind::News => "NEWS",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub at: DateTime<Utc>,
    pub kind: EntryKind,
    pub agent: Option<String>,
    pub message: String,
    /// Realized PnL for settlement entries.
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journal {
    capacity: usize,
    entries: VecDeque<JournalEntry>,
    #[serde(default = "default_trade_capacity")]
    trade_capacity: usize,
    trades: VecDeque<Settlement>,
}

impl Journal {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
            trade_capacity: DEFAULT_TRADE_CAPACITY,
            trades: VecDeque::new(),
        }
    }

    /// Keep at most `capacity` settled trades, oldest dropped first.
    pub fn with_trade_capacity(mut self, capacity: usize) -> Self {
        self.trade_capacity = capacity.max(1);
        self.trim_trades();
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn trade_capacity(&self) -> usize {
        self.trade_capacity
    }

    fn trim_trades(&mut self) {
        while self.trades.len() > self.trade_capacity {
            self.trades.pop_front();
        }
    }

    /// Append an entry, dropping the oldest when full.
    pub fn push(&mut self, entry: JournalEntry) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn info(&mut self, agent: Option<&str>, message: impl Into<String>, at: DateTime<Utc>) {
        self.push(JournalEntry {
            at,
            kind: EntryKind::Info,
            agent: agent.map(str::to_string),
            message: message.into(),
            amount: None,
        });
    }

    pub fn record(
        &mut self,
        kind: EntryKind,
        agent: Option<&str>,
        message: impl Into<String>,
        at: DateTime<Utc>,
    ) {
        self.push(JournalEntry {
            at,
            kind,
            agent: agent.map(str::to_string),
            message: message.into(),
            amount: None,
        });
    }

    /// Journal a settlement and keep it for the trade export.
    pub fn settlement(&mut self, settlement: &Settlement) {
        let kind = match settlement.outcome {
            Outcome::Win => EntryKind::Win,
            Outcome::Loss => EntryKind::Loss,
            Outcome::Liquidation => EntryKind::Liquidation,
        };
        let message = match settlement.reason {
            ExitReason::Manual => format!(
                "MANUAL INTERVENTION: operator closed {}'s {} position",
                settlement.agent, settlement.symbol
            ),
            ExitReason::Liquidation => format!(
                "{} LIQUIDATED on {} @ {}",
                settlement.agent, settlement.symbol, settlement.exit_price
            ),
            ExitReason::TakeProfit => format!(
                "{} TP HIT on {} @ {}",
                settlement.agent, settlement.symbol, settlement.exit_price
            ),
            ExitReason::StopLoss => format!(
                "{} SL HIT on {} @ {}",
                settlement.agent, settlement.symbol, settlement.exit_price
            ),
        };
        self.push(JournalEntry {
            at: settlement.closed_at,
            kind,
            agent: Some(settlement.agent.clone()),
            message,
            amount: Some(settlement.pnl),
        });
        self.trades.push_back(settlement.clone());
        self.trim_trades();
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter()
    }

    /// The `n` most recent entries, newest first.
    pub fn recent(&self, n: usize) -> Vec<&JournalEntry> {
        self.entries.iter().rev().take(n).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Settled trades still in the window, oldest first.
    pub fn trades(&self) -> &VecDeque<Settlement> {
        &self.trades
    }

    /// Write the settled trades in the window to `path` as CSV, one row per
    /// settlement.
    pub fn export_trades_csv(&self, path: &Path) -> Result<(), DeskError> {
        let file = File::create(path).map_err(|e| DeskError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let mut writer = csv::Writer::from_writer(file);
        for trade in &self.trades {
            writer.serialize(trade)?;
        }
        writer.flush().map_err(|e| DeskError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarmdesk_core::domain::Side;

    fn settlement(agent: &str, pnl: f64, reason: ExitReason, outcome: Outcome) -> Settlement {
        Settlement {
            agent: agent.into(),
            position_id: format!("{agent}-1"),
            symbol: "BTCUSDT".into(),
            side: Side::Buy,
            entry_price: 100.0,
            exit_price: 104.0,
            margin: 10.0,
            leverage: 10,
            pnl,
            reason,
            outcome,
            closed_at: Utc::now(),
        }
    }

    #[test]
    fn capacity_drops_oldest() {
        let mut journal = Journal::new(3);
        for i in 0..5 {
            journal.info(None, format!("event {i}"), Utc::now());
        }
        assert_eq!(journal.len(), 3);
        let messages: Vec<_> = journal.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["event 2", "event 3", "event 4"]);
        assert_eq!(journal.recent(1)[0].message, "event 4");
    }

    #[test]
    fn settlements_map_to_entry_kinds() {
        let mut journal = Journal::new(10);
        journal.settlement(&settlement("scalper", 4.0, ExitReason::TakeProfit, Outcome::Win));
        journal.settlement(&settlement("scalper", -10.0, ExitReason::Liquidation, Outcome::Liquidation));
        let kinds: Vec<_> = journal.entries().map(|e| e.kind).collect();
        assert_eq!(kinds, [EntryKind::Win, EntryKind::Liquidation]);
        assert!(journal.recent(1)[0].message.contains("LIQUIDATED"));
        assert_eq!(journal.trades().len(), 2);
    }

    #[test]
    fn trades_outlive_the_entry_window() {
        let mut journal = Journal::new(1);
        journal.settlement(&settlement("a", 1.0, ExitReason::TakeProfit, Outcome::Win));
        journal.settlement(&settlement("b", -1.0, ExitReason::StopLoss, Outcome::Loss));
        assert_eq!(journal.len(), 1);
        assert_eq!(journal.trades().len(), 2);
    }

    #[test]
    fn trade_window_drops_oldest_settlements() {
        let mut journal = Journal::new(2).with_trade_capacity(3);
        for i in 0..10 {
            let agent = format!("agent-{i}");
            journal.settlement(&settlement(&agent, i as f64, ExitReason::TakeProfit, Outcome::Win));
        }
        assert_eq!(journal.len(), 2);
        assert_eq!(journal.trades().len(), 3);
        let agents: Vec<_> = journal.trades().iter().map(|t| t.agent.as_str()).collect();
        assert_eq!(agents, ["agent-7", "agent-8", "agent-9"]);
    }

    #[test]
    fn snapshot_without_trade_capacity_uses_default() {
        let mut value = serde_json::to_value(Journal::new(4)).unwrap();
        value.as_object_mut().unwrap().remove("trade_capacity");
        let journal: Journal = serde_json::from_value(value).unwrap();
        assert_eq!(journal.trade_capacity(), DEFAULT_TRADE_CAPACITY);
    }

    #[test]
    fn export_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        let mut journal = Journal::new(10);
        journal.settlement(&settlement("macro-cross", 2.5, ExitReason::Manual, Outcome::Win));
        journal.export_trades_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("agent,position_id,symbol,side"));
        let row = lines.next().unwrap();
        assert!(row.contains("macro-cross") && row.contains("MANUAL"));
        assert!(lines.next().is_none());
    }
}

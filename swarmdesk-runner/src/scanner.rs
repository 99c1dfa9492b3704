//! One agent's scan: gate, pick candidates, evaluate each until one trades.
//!
//! Candidates are drawn from the persona's target filter (the whole universe
//! when the filter admits nothing), shuffled with the agent's seeded stream
//! for this tick and capped at `max_candidates`. A candidate whose candles
//! cannot be fetched is skipped. The first actionable, sizeable decision
//! opens a position and ends the scan.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use swarmdesk_core::data::MarketFeed;
use swarmdesk_core::domain::{AgentId, NewsEvent, Persona, Position};
use swarmdesk_core::indicators::IndicatorSnapshot;
use swarmdesk_core::ledger::{Ledger, LedgerError};
use swarmdesk_core::news::NewsSafetyFilter;
use swarmdesk_core::rng::{Purpose, RngHierarchy};
use swarmdesk_core::sizing::{OrderTicket, RiskSizer};
use swarmdesk_core::strategy::{decide, MarketContext, Strategy};
use tracing::{debug, info};

use crate::config::DeskSettings;
use crate::universe::Universe;

/// What a scan did.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// The scan gate did not fire this tick.
    Idle,
    /// Every position slot is taken.
    AtCapacity,
    Opened {
        position: Position,
        ticket: OrderTicket,
        atr: f64,
        message: String,
    },
    /// Candidates were examined and none traded.
    NoTrade {
        symbol: Option<String>,
        reason: String,
    },
}

/// Shared, read-only inputs to every scan on one tick.
pub struct Scanner<'a> {
    pub feed: &'a MarketFeed,
    pub universe: &'a Universe,
    pub sizer: &'a RiskSizer,
    pub filter: NewsSafetyFilter,
    pub rng: &'a RngHierarchy,
    pub settings: &'a DeskSettings,
}

impl Scanner<'_> {
    /// Seeded coin flip: does `agent` scan on `tick`?
    pub fn should_scan(&self, agent: &AgentId, tick: u64) -> bool {
        let p = self.settings.scan_probability.clamp(0.0, 1.0);
        self.rng.rng_for(agent, Purpose::ScanGate, tick).gen_bool(p)
    }

    /// Candidate symbols for `persona`, in this tick's visiting order.
    pub fn candidates(&self, agent: &AgentId, persona: &Persona, tick: u64) -> Vec<String> {
        let mut pool: Vec<String> = self
            .universe
            .admitted(&persona.target)
            .into_iter()
            .map(|a| a.symbol.clone())
            .collect();
        if pool.is_empty() {
            pool = self.universe.symbols().into_iter().map(str::to_string).collect();
        }
        let mut rng = self.rng.rng_for(agent, Purpose::CandidateOrder, tick);
        pool.shuffle(&mut rng);
        pool.truncate(self.settings.max_candidates);
        pool
    }

    /// Why `agent` does not scan on `tick`, or `None` when it should.
    pub fn gate(
        &self,
        ledger: &Ledger,
        agent: &AgentId,
        tick: u64,
    ) -> Result<Option<ScanOutcome>, LedgerError> {
        if !ledger.has_capacity(agent)? {
            return Ok(Some(ScanOutcome::AtCapacity));
        }
        if !self.should_scan(agent, tick) {
            return Ok(Some(ScanOutcome::Idle));
        }
        Ok(None)
    }

    /// Gate, then scan. The caller holds the agent's in-flight guard.
    pub fn run(
        &self,
        ledger: &Ledger,
        agent: &AgentId,
        strategy: &dyn Strategy,
        news: Option<&NewsEvent>,
        tick: u64,
        now: DateTime<Utc>,
    ) -> Result<ScanOutcome, LedgerError> {
        match self.gate(ledger, agent, tick)? {
            Some(skipped) => Ok(skipped),
            None => self.scan(ledger, agent, strategy, news, tick, now),
        }
    }

    /// Evaluate candidates until one opens a position.
    pub fn scan(
        &self,
        ledger: &Ledger,
        agent: &AgentId,
        strategy: &dyn Strategy,
        news: Option<&NewsEvent>,
        tick: u64,
        now: DateTime<Utc>,
    ) -> Result<ScanOutcome, LedgerError> {
        let persona = ledger.with_agent(agent, |a| a.persona.clone())?;
        let candidates = self.candidates(agent, &persona, tick);
        let min_confidence = self.sizer.config().min_confidence;

        let mut last_symbol: Option<String> = None;
        let mut reason = String::from("No market data for any candidate");

        for symbol in &candidates {
            let series = match self
                .feed
                .candles(symbol, persona.interval, self.settings.candle_limit)
            {
                Ok(series) => series,
                Err(e) => {
                    debug!(agent = %agent, symbol = %symbol, error = %e, "candidate skipped");
                    continue;
                }
            };
            let Some(snapshot) = IndicatorSnapshot::compute(&series) else {
                continue;
            };

            let ctx = MarketContext::new(&series, &snapshot);
            let decision = decide(strategy, &ctx, news, &self.filter, min_confidence);
            last_symbol = Some(symbol.clone());
            if decision.is_hold() {
                reason = format!("Analyzed {symbol}: {}", decision.rationale);
                continue;
            }

            let entry = snapshot.price;
            let balance = ledger.with_agent(agent, |a| a.balance)?;
            let ticket = match self
                .sizer
                .size(&persona, &decision, symbol, entry, snapshot.atr, balance)
            {
                Ok(ticket) => ticket,
                Err(rejection) => {
                    reason = format!("Analyzed {symbol}: {} (not sized: {rejection})", decision.rationale);
                    continue;
                }
            };

            match ledger.open_position(agent, &ticket, now) {
                Ok(position) => {
                    let message = format!(
                        "EXECUTING {}x {} on {} @ {}. Targeting {}:1 R:R based on ATR ({:.4}).",
                        ticket.leverage,
                        ticket.side,
                        symbol,
                        entry,
                        persona.risk.reward_ratio,
                        snapshot.atr
                    );
                    info!(agent = %agent, symbol = %symbol, confidence = ticket.confidence, "{message}");
                    return Ok(ScanOutcome::Opened {
                        position,
                        ticket,
                        atr: snapshot.atr,
                        message,
                    });
                }
                Err(LedgerError::AtCapacity { .. }) => return Ok(ScanOutcome::AtCapacity),
                Err(e @ LedgerError::UnknownAgent(_)) => return Err(e),
                Err(e) => {
                    reason = format!("Analyzed {symbol}: {} (not opened: {e})", decision.rationale);
                }
            }
        }

        ledger.record_scan(agent, last_symbol.as_deref(), reason.clone())?;
        Ok(ScanOutcome::NoTrade {
            symbol: last_symbol,
            reason,
        })
    }
}

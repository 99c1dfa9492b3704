//! Headline catalogue and the safety filter that gates trades on it.
//!
//! Exactly one event is active at a time. The filter only acts when the
//! active event names the candidate symbol: an opposing bias vetoes the
//! trade, a matching bias adds a confidence bonus.

use crate::domain::{Action, Decision, NewsEvent, Side};
use crate::rng::FlavorRng;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const DEFAULT_CONFIRM_BONUS: u8 = 10;

/// Veto or reinforce a decision against the active headline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsSafetyFilter {
    pub confirm_bonus: u8,
}

impl Default for NewsSafetyFilter {
    fn default() -> Self {
        Self {
            confirm_bonus: DEFAULT_CONFIRM_BONUS,
        }
    }
}

impl NewsSafetyFilter {
    pub fn new(confirm_bonus: u8) -> Self {
        Self { confirm_bonus }
    }

    pub fn apply(&self, decision: Decision, symbol: &str, news: Option<&NewsEvent>) -> Decision {
        let Some(event) = news.filter(|n| n.concerns(symbol)) else {
            return decision;
        };
        let Some(side) = decision.action.side() else {
            return decision;
        };

        if side == event.bias {
            let confidence = u32::from(decision.confidence) + u32::from(self.confirm_bonus);
            return Decision::new(
                decision.action,
                confidence,
                format!(
                    "{} [CONFIRMED by News: {}]",
                    decision.rationale, event.headline
                ),
            );
        }

        let mood = match event.bias {
            Side::Buy => "bullish",
            Side::Sell => "bearish",
        };
        info!(
            symbol,
            headline = %event.headline,
            blocked = %side,
            "news safety lock"
        );
        Decision::new(
            Action::Hold,
            0,
            format!(
                "SAFETY LOCK: chart signals {side} but news is {mood} (\"{}\"). Entry forbidden.",
                event.headline
            ),
        )
    }
}

/// Catalogue of headlines with one active slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsFeed {
    events: Vec<NewsEvent>,
    active: Option<usize>,
}

impl NewsFeed {
    /// First event starts active.
    pub fn new(events: Vec<NewsEvent>) -> Self {
        let active = (!events.is_empty()).then_some(0);
        Self { events, active }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn events(&self) -> &[NewsEvent] {
        &self.events
    }

    pub fn active(&self) -> Option<&NewsEvent> {
        self.active.and_then(|i| self.events.get(i))
    }

    /// Pick a new active headline at random. May re-pick the current one.
    pub fn rotate(&mut self, rng: &mut FlavorRng) -> Option<&NewsEvent> {
        self.active = rng.pick(self.events.len());
        let event = self.active()?;
        info!(id = %event.id, symbol = %event.symbol, headline = %event.headline, "news rotated");
        Some(event)
    }

    /// Force a specific headline active by id. Returns false when unknown.
    pub fn activate(&mut self, id: &str) -> bool {
        match self.events.iter().position(|e| e.id == id) {
            Some(i) => {
                self.active = Some(i);
                true
            }
            None => false,
        }
    }
}

impl Default for NewsFeed {
    fn default() -> Self {
        Self::new(default_catalogue())
    }
}

/// Built-in headline catalogue.
pub fn default_catalogue() -> Vec<NewsEvent> {
    let event = |id: &str, headline: &str, summary: &str, symbol: &str, bias: Side| NewsEvent {
        id: id.to_string(),
        headline: headline.to_string(),
        summary: summary.to_string(),
        symbol: symbol.to_string(),
        bias,
    };
    vec![
        event(
            "n1",
            "Spot ETH ETF Options Approval",
            "SEC grants accelerated approval for options trading on Spot Ethereum ETFs, expected to increase institutional liquidity significantly.",
            "ETHUSDT",
            Side::Buy,
        ),
        event(
            "n2",
            "US CPI Data Beats Expectations",
            "Inflation cools faster than anticipated (2.4% YoY), increasing likelihood of a Fed rate cut in the next FOMC meeting.",
            "BTCUSDT",
            Side::Buy,
        ),
        event(
            "n3",
            "Solana Network Congestion Alert",
            "High compute usage from meme-coin trading causing 40% transaction failure rate on Solana mainnet.",
            "SOLUSDT",
            Side::Sell,
        ),
        event(
            "n4",
            "NVIDIA Earnings Beat & Guidance",
            "Tech giant NVIDIA reports record AI chip demand, positively correlating with AI-sector crypto tokens.",
            "FETUSDT",
            Side::Buy,
        ),
        event(
            "n5",
            "Regulatory Crackdown on Privacy Coins",
            "EU passes stricter AML laws targeting non-compliant privacy protocols and mixers.",
            "XMRUSDT",
            Side::Sell,
        ),
        event(
            "n6",
            "Whale Movement Detected",
            "Wallets associated with early mining era moved 5,000 BTC to exchanges, signaling potential distribution.",
            "BTCUSDT",
            Side::Sell,
        ),
        event(
            "n7",
            "Gold Reaches New ATH on Geopolitical Tension",
            "XAUUSD surges past $2700 as safe-haven demand spikes due to escalating conflicts in the Middle East.",
            "PAXGUSDT",
            Side::Buy,
        ),
    ]
}

use super::market::Side;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a strategy wants to do with a candidate symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    pub fn side(&self) -> Option<Side> {
        match self {
            Action::Buy => Some(Side::Buy),
            Action::Sell => Some(Side::Sell),
            Action::Hold => None,
        }
    }
}

impl From<Side> for Action {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy => Action::Buy,
            Side::Sell => Action::Sell,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => f.write_str("BUY"),
            Action::Sell => f.write_str("SELL"),
            Action::Hold => f.write_str("HOLD"),
        }
    }
}

/// Strategy output for one candidate at one instant. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    /// 0..=100.
    pub confidence: u8,
    pub rationale: String,
}

impl Decision {
    pub fn new(action: Action, confidence: u32, rationale: impl Into<String>) -> Self {
        Self {
            action,
            confidence: confidence.min(100) as u8,
            rationale: rationale.into(),
        }
    }

    pub fn hold(confidence: u32, rationale: impl Into<String>) -> Self {
        Self::new(Action::Hold, confidence, rationale)
    }

    pub fn is_hold(&self) -> bool {
        self.action == Action::Hold
    }
}

use super::market::Side;
use serde::{Deserialize, Serialize};

/// A market-moving headline with a directional bias on one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsEvent {
    pub id: String,
    pub headline: String,
    pub summary: String,
    pub symbol: String,
    pub bias: Side,
}

impl NewsEvent {
    pub fn concerns(&self, symbol: &str) -> bool {
        self.symbol == symbol
    }
}

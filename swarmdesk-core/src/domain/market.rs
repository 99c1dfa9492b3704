//! Market vocabulary shared by every layer: sides, trends, and asset tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a position or a directional news bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// +1 for Buy, -1 for Sell.
    pub fn sign(&self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }

    /// Fractional move of `price` from `entry`, positive when it favours this side.
    pub fn percent_move(&self, entry: f64, price: f64) -> f64 {
        self.sign() * (price - entry) / entry
    }

    /// True when `proposed` is a stop at least as protective as `current`.
    pub fn stop_tightens(&self, current: f64, proposed: f64) -> bool {
        match self {
            Side::Buy => proposed > current,
            Side::Sell => proposed < current,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("BUY"),
            Side::Sell => f.write_str("SELL"),
        }
    }
}

/// Short-term price direction versus the previously observed price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Up,
    Down,
    #[default]
    Flat,
}

impl Trend {
    /// Direction from `previous` to `current`; equal prices are `Flat`.
    /// `MarketFeed` keeps the prior direction across an unchanged price
    /// instead, so a stalled quote does not cancel a trailing activation.
    pub fn between(previous: f64, current: f64) -> Trend {
        if current > previous {
            Trend::Up
        } else if current < previous {
            Trend::Down
        } else {
            Trend::Flat
        }
    }

    pub fn favours(&self, side: Side) -> bool {
        matches!((self, side), (Trend::Up, Side::Buy) | (Trend::Down, Side::Sell))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sector {
    Major,
    Meme,
    Ai,
    L2,
    Defi,
    Game,
    Classic,
    Commodity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Volatility {
    Low,
    Medium,
    High,
    Extreme,
}

/// A tradable symbol and its classification tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub symbol: String,
    pub sector: Sector,
    pub volatility: Volatility,
}

impl Asset {
    pub fn new(symbol: &str, sector: Sector, volatility: Volatility) -> Self {
        Self {
            symbol: symbol.to_string(),
            sector,
            volatility,
        }
    }
}

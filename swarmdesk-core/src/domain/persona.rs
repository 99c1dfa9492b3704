//! Persona parameters: which strategy an agent runs, on what interval, with
//! what leverage and risk profile, over which slice of the universe.

use super::candle::Interval;
use super::market::{Asset, Sector, Volatility};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The decision policy an agent runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyKind {
    /// Weekly swing structure with Fibonacci retracement zones.
    FibonacciSwing,
    /// Daily EMA 50/200 golden/death cross with retest.
    MacroCross,
    /// 4h Bollinger squeeze breakout with OBV confirmation.
    VolatilitySqueeze,
    /// 15m fast EMA cross / volume spike scalper.
    Scalper,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::FibonacciSwing,
        StrategyKind::MacroCross,
        StrategyKind::VolatilitySqueeze,
        StrategyKind::Scalper,
    ];

    /// Stable slug used for agent ids and config keys.
    pub fn slug(&self) -> &'static str {
        match self {
            StrategyKind::FibonacciSwing => "fib-swing",
            StrategyKind::MacroCross => "macro-cross",
            StrategyKind::VolatilitySqueeze => "squeeze-quant",
            StrategyKind::Scalper => "scalper",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Which assets an agent is allowed to scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetFilter {
    All,
    Sector { sector: Sector },
    ExcludeLowVolatility,
}

impl TargetFilter {
    pub fn admits(&self, asset: &Asset) -> bool {
        match self {
            TargetFilter::All => true,
            TargetFilter::Sector { sector } => asset.sector == *sector,
            TargetFilter::ExcludeLowVolatility => asset.volatility != Volatility::Low,
        }
    }
}

/// Per-persona stop/target geometry.
///
/// Percentages are fractions of entry price (0.03 = 3%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    /// Stop distance in ATR multiples.
    pub risk_multiplier: f64,
    /// Target distance as a multiple of the stop distance.
    pub reward_ratio: f64,
    pub min_stop_pct: f64,
    pub max_stop_pct: f64,
    /// Band both exit distances are re-clamped into after orientation.
    pub min_tp_pct: f64,
    pub max_tp_pct: f64,
}

impl RiskProfile {
    pub fn for_kind(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::FibonacciSwing => Self {
                risk_multiplier: 2.5,
                reward_ratio: 3.5,
                min_stop_pct: 0.03,
                max_stop_pct: 0.08,
                min_tp_pct: 0.05,
                max_tp_pct: 0.25,
            },
            StrategyKind::MacroCross => Self {
                risk_multiplier: 1.5,
                reward_ratio: 2.5,
                min_stop_pct: 0.015,
                max_stop_pct: 0.06,
                min_tp_pct: 0.03,
                max_tp_pct: 0.15,
            },
            StrategyKind::VolatilitySqueeze => Self {
                risk_multiplier: 1.5,
                reward_ratio: 2.0,
                min_stop_pct: 0.01,
                max_stop_pct: 0.05,
                min_tp_pct: 0.02,
                max_tp_pct: 0.12,
            },
            StrategyKind::Scalper => Self {
                risk_multiplier: 0.8,
                reward_ratio: 1.5,
                min_stop_pct: 0.003,
                max_stop_pct: 0.02,
                min_tp_pct: 0.005,
                max_tp_pct: 0.05,
            },
        }
    }
}

/// Full persona configuration for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub kind: StrategyKind,
    pub interval: Interval,
    pub leverage: u32,
    pub target: TargetFilter,
    pub risk: RiskProfile,
}

impl Persona {
    /// Built-in preset for a strategy kind.
    pub fn preset(kind: StrategyKind) -> Self {
        let (interval, leverage, target) = match kind {
            StrategyKind::FibonacciSwing => (Interval::OneWeek, 5, TargetFilter::All),
            StrategyKind::MacroCross => (Interval::OneDay, 5, TargetFilter::All),
            StrategyKind::VolatilitySqueeze => (Interval::FourHours, 10, TargetFilter::All),
            StrategyKind::Scalper => (
                Interval::FifteenMinutes,
                10,
                TargetFilter::ExcludeLowVolatility,
            ),
        };
        Self {
            name: kind.slug().to_string(),
            kind,
            interval,
            leverage,
            target,
            risk: RiskProfile::for_kind(kind),
        }
    }

    /// The four standard personas, in desk order.
    pub fn roster() -> Vec<Persona> {
        StrategyKind::ALL.into_iter().map(Persona::preset).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_has_one_persona_per_kind() {
        let roster = Persona::roster();
        assert_eq!(roster.len(), 4);
        for kind in StrategyKind::ALL {
            assert!(roster.iter().any(|p| p.kind == kind));
        }
    }

    #[test]
    fn risk_bands_are_ordered() {
        for kind in StrategyKind::ALL {
            let r = RiskProfile::for_kind(kind);
            assert!(r.min_stop_pct < r.max_stop_pct, "{kind}");
            assert!(r.min_tp_pct < r.max_tp_pct, "{kind}");
            assert!(r.reward_ratio >= 1.0, "{kind}");
        }
    }

    #[test]
    fn scalper_skips_low_volatility() {
        let scalper = Persona::preset(StrategyKind::Scalper);
        let btc = Asset::new("BTCUSDT", Sector::Major, Volatility::Low);
        let pepe = Asset::new("PEPEUSDT", Sector::Meme, Volatility::Extreme);
        assert!(!scalper.target.admits(&btc));
        assert!(scalper.target.admits(&pepe));
    }

    #[test]
    fn sector_filter() {
        let filter = TargetFilter::Sector {
            sector: Sector::Commodity,
        };
        assert!(filter.admits(&Asset::new("PAXGUSDT", Sector::Commodity, Volatility::Low)));
        assert!(!filter.admits(&Asset::new("BTCUSDT", Sector::Major, Volatility::Low)));
    }

    #[test]
    fn persona_toml_shape() {
        let persona = Persona::preset(StrategyKind::VolatilitySqueeze);
        let json = serde_json::to_value(&persona).unwrap();
        assert_eq!(json["kind"], "VOLATILITY_SQUEEZE");
        assert_eq!(json["interval"], "4h");
        assert_eq!(json["target"]["type"], "ALL");
    }
}

//! Desk configuration, loaded from TOML.
//!
//! Every section has serde defaults, so an empty file is a valid config that
//! runs the four standard personas on live data:
//!
//! ```toml
//! [desk]
//! seed = 42
//! tick_ms = 3000
//!
//! [data]
//! mode = "synthetic"
//!
//! [[personas]]
//! kind = "SCALPER"
//! leverage = 20
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use swarmdesk_core::domain::{Interval, Persona, RiskProfile, StrategyKind, TargetFilter};
use swarmdesk_core::ledger::DEFAULT_MAX_OPEN_POSITIONS;
use swarmdesk_core::monitor::MonitorConfig;
use swarmdesk_core::news::DEFAULT_CONFIRM_BONUS;
use swarmdesk_core::sizing::SizingConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {message}")]
    Io { path: String, message: String },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tick loop and scanning parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskSettings {
    /// Master seed for scan gating and candidate order.
    pub seed: u64,
    pub tick_ms: u64,
    pub starting_balance: f64,
    /// Chance per tick that an idle agent scans.
    pub scan_probability: f64,
    /// Candidates tried per scan before giving up.
    pub max_candidates: usize,
    pub candle_limit: usize,
    pub max_open_positions: usize,
    /// Events kept in the in-memory journal.
    pub journal_capacity: usize,
    /// Settled trades kept for snapshots and CSV export.
    pub trade_history: usize,
}

impl Default for DeskSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_ms: 3_000,
            starting_balance: 100.0,
            scan_probability: 0.15,
            max_candidates: 4,
            candle_limit: 200,
            max_open_positions: DEFAULT_MAX_OPEN_POSITIONS,
            journal_capacity: 50,
            trade_history: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsSettings {
    pub confirm_bonus: u8,
    /// Rotate the active headline every N ticks; 0 keeps it fixed.
    pub rotate_every_ticks: u64,
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            confirm_bonus: DEFAULT_CONFIRM_BONUS,
            rotate_every_ticks: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataMode {
    /// Binance, then CoinGecko for prices.
    #[default]
    Live,
    /// Live sources with the synthetic walk as a last resort.
    LiveWithFallback,
    Synthetic,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub mode: DataMode,
    pub csv_dir: Option<PathBuf>,
    /// Interval whose bars drive the CSV replay clock.
    pub csv_clock: Interval,
    pub csv_warmup: usize,
    pub synthetic_volatility: f64,
    /// Optional TOML universe; the built-in one otherwise.
    pub universe_file: Option<PathBuf>,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            mode: DataMode::Live,
            csv_dir: None,
            csv_clock: Interval::OneHour,
            csv_warmup: 200,
            synthetic_volatility: 0.01,
            universe_file: None,
        }
    }
}

/// A persona entry: the preset for `kind` with any field overridden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaEntry {
    pub kind: StrategyKind,
    pub name: Option<String>,
    pub interval: Option<Interval>,
    pub leverage: Option<u32>,
    pub target: Option<TargetFilter>,
    pub risk: Option<RiskProfile>,
}

impl PersonaEntry {
    pub fn resolve(&self) -> Persona {
        let mut persona = Persona::preset(self.kind);
        if let Some(name) = &self.name {
            persona.name = name.clone();
        }
        if let Some(interval) = self.interval {
            persona.interval = interval;
        }
        if let Some(leverage) = self.leverage {
            persona.leverage = leverage;
        }
        if let Some(target) = &self.target {
            persona.target = target.clone();
        }
        if let Some(risk) = self.risk {
            persona.risk = risk;
        }
        persona
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    pub desk: DeskSettings,
    pub news: NewsSettings,
    pub data: DataSettings,
    pub sizing: SizingConfig,
    pub monitor: MonitorConfig,
    /// Empty means the standard roster.
    pub personas: Vec<PersonaEntry>,
}

impl DeskConfig {
    /// Load a config from a TOML file and validate it.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string and validate it.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: DeskConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// The personas this desk runs, in order.
    pub fn personas(&self) -> Vec<Persona> {
        if self.personas.is_empty() {
            Persona::roster()
        } else {
            self.personas.iter().map(PersonaEntry::resolve).collect()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| -> Result<(), ConfigError> { Err(ConfigError::Invalid(msg)) };
        let d = &self.desk;
        if d.tick_ms == 0 {
            return invalid("desk.tick_ms must be positive".into());
        }
        if !(d.starting_balance.is_finite() && d.starting_balance > 0.0) {
            return invalid(format!("desk.starting_balance must be positive, got {}", d.starting_balance));
        }
        if !(0.0..=1.0).contains(&d.scan_probability) {
            return invalid(format!("desk.scan_probability must be in [0, 1], got {}", d.scan_probability));
        }
        if d.max_candidates == 0
            || d.max_open_positions == 0
            || d.journal_capacity == 0
            || d.trade_history == 0
        {
            return invalid(
                "desk.max_candidates, max_open_positions, journal_capacity and trade_history must be at least 1"
                    .into(),
            );
        }
        if d.candle_limit < 2 {
            return invalid(format!("desk.candle_limit must be at least 2, got {}", d.candle_limit));
        }

        let s = &self.sizing;
        if !(s.account_risk > 0.0 && s.account_risk < 1.0) {
            return invalid(format!("sizing.account_risk must be in (0, 1), got {}", s.account_risk));
        }
        if s.min_margin_pct > s.max_margin_pct {
            return invalid("sizing.min_margin_pct exceeds sizing.max_margin_pct".into());
        }
        if s.min_confidence > 100 {
            return invalid(format!("sizing.min_confidence must be ≤ 100, got {}", s.min_confidence));
        }
        if !(s.liquidation_safety > 0.0 && s.liquidation_safety <= 1.0) {
            return invalid("sizing.liquidation_safety must be in (0, 1]".into());
        }

        let m = &self.monitor;
        if m.liquidation_roi >= 0.0 {
            return invalid(format!("monitor.liquidation_roi must be negative, got {}", m.liquidation_roi));
        }
        if !(m.trail_distance > 0.0 && m.trail_distance < 1.0) {
            return invalid("monitor.trail_distance must be in (0, 1)".into());
        }

        if self.data.mode == DataMode::Csv && self.data.csv_dir.is_none() {
            return invalid("data.mode = \"csv\" requires data.csv_dir".into());
        }
        if self.data.synthetic_volatility < 0.0 || self.data.synthetic_volatility >= 1.0 {
            return invalid("data.synthetic_volatility must be in [0, 1)".into());
        }

        let personas = self.personas();
        let mut names = HashSet::new();
        for p in &personas {
            if !names.insert(p.name.as_str()) {
                return invalid(format!("duplicate persona name '{}'", p.name));
            }
            if p.leverage == 0 {
                return invalid(format!("persona '{}' has zero leverage", p.name));
            }
            let r = &p.risk;
            if r.min_stop_pct > r.max_stop_pct || r.min_tp_pct > r.max_tp_pct {
                return invalid(format!("persona '{}' has an inverted risk band", p.name));
            }
            if r.risk_multiplier <= 0.0 || r.reward_ratio <= 0.0 {
                return invalid(format!("persona '{}' needs positive risk multiplier and reward ratio", p.name));
            }
        }
        Ok(())
    }
}

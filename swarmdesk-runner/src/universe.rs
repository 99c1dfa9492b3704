//! Symbol universe: tradable crypto pairs tagged by sector and volatility.
//!
//! The default universe is compiled in. A custom one can be loaded from TOML:
//!
//! ```toml
//! [[assets]]
//! symbol = "BTCUSDT"
//! sector = "MAJOR"
//! volatility = "Low"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use swarmdesk_core::domain::{Asset, Sector, TargetFilter, Volatility};

use crate::config::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    pub assets: Vec<Asset>,
}

impl Default for Universe {
    fn default() -> Self {
        Self::default_crypto()
    }
}

impl Universe {
    pub fn new(assets: Vec<Asset>) -> Self {
        Self { assets }
    }

    /// Load a universe from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse a universe from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let universe: Universe = toml::from_str(content)?;
        if universe.assets.is_empty() {
            return Err(ConfigError::Invalid("universe has no assets".into()));
        }
        Ok(universe)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, symbol: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.symbol == symbol)
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.assets.iter().map(|a| a.symbol.as_str()).collect()
    }

    /// Assets a persona's target filter lets it scan.
    pub fn admitted(&self, filter: &TargetFilter) -> Vec<&Asset> {
        self.assets.iter().filter(|a| filter.admits(a)).collect()
    }

    /// The built-in universe: majors, AI, memes, L2s, DeFi, gaming, classic
    /// L1s and a gold-pegged token.
    pub fn default_crypto() -> Self {
        use Sector::*;
        use Volatility::*;
        const ASSETS: &[(&str, Sector, Volatility)] = &[
            ("PAXGUSDT", Commodity, Low),
            ("BTCUSDT", Major, Low),
            ("ETHUSDT", Major, Low),
            ("BNBUSDT", Major, Low),
            ("SOLUSDT", Major, Medium),
            ("XRPUSDT", Major, Medium),
            ("ADAUSDT", Major, Medium),
            ("AVAXUSDT", Major, Medium),
            ("TONUSDT", Major, Medium),
            ("TRXUSDT", Major, Low),
            ("DOTUSDT", Major, Medium),
            ("LINKUSDT", Major, Medium),
            ("SUIUSDT", Major, High),
            ("APTUSDT", Major, High),
            ("NEARUSDT", Major, High),
            ("KASUSDT", Major, High),
            ("SEIUSDT", Major, High),
            ("TIAUSDT", Major, High),
            ("INJUSDT", Major, High),
            ("FETUSDT", Ai, High),
            ("RNDRUSDT", Ai, High),
            ("TAOUSDT", Ai, High),
            ("WLDUSDT", Ai, High),
            ("ICPUSDT", Ai, Medium),
            ("GRTUSDT", Ai, High),
            ("JASMYUSDT", Ai, Extreme),
            ("FILUSDT", Ai, Medium),
            ("THETAUSDT", Ai, High),
            ("AKTUSDT", Ai, High),
            ("AGIXUSDT", Ai, High),
            ("OCEANUSDT", Ai, High),
            ("ARKMUSDT", Ai, High),
            ("GLMUSDT", Ai, High),
            ("DOGEUSDT", Meme, High),
            ("SHIBUSDT", Meme, High),
            ("PEPEUSDT", Meme, Extreme),
            ("WIFUSDT", Meme, Extreme),
            ("BONKUSDT", Meme, Extreme),
            ("FLOKIUSDT", Meme, Extreme),
            ("BOMEUSDT", Meme, Extreme),
            ("POPCATUSDT", Meme, Extreme),
            ("BRETTUSDT", Meme, Extreme),
            ("MOGUSDT", Meme, Extreme),
            ("MEMEUSDT", Meme, High),
            ("PEOPLEUSDT", Meme, High),
            ("TURBOUSDT", Meme, Extreme),
            ("1000SATSUSDT", Meme, High),
            ("MATICUSDT", L2, Medium),
            ("OPUSDT", L2, High),
            ("ARBUSDT", L2, Medium),
            ("STXUSDT", L2, High),
            ("IMXUSDT", L2, High),
            ("MNTUSDT", L2, Medium),
            ("STRKUSDT", L2, High),
            ("ZKUSDT", L2, High),
            ("MANTAUSDT", L2, High),
            ("METISUSDT", L2, High),
            ("UNIUSDT", Defi, Medium),
            ("JUPUSDT", Defi, High),
            ("LDOUSDT", Defi, Medium),
            ("AAVEUSDT", Defi, Medium),
            ("MKRUSDT", Defi, Medium),
            ("RUNEUSDT", Defi, High),
            ("SNXUSDT", Defi, Medium),
            ("ENAUSDT", Defi, High),
            ("PENDLEUSDT", Defi, High),
            ("CRVUSDT", Defi, High),
            ("CAKEUSDT", Defi, High),
            ("1INCHUSDT", Defi, High),
            ("DYDXUSDT", Defi, High),
            ("GALAUSDT", Game, High),
            ("SANDUSDT", Game, High),
            ("MANAUSDT", Game, High),
            ("AXSUSDT", Game, High),
            ("BEAMXUSDT", Game, High),
            ("RONINUSDT", Game, High),
            ("PIXELUSDT", Game, Extreme),
            ("ILVUSDT", Game, High),
            ("APEUSDT", Game, High),
            ("LTCUSDT", Classic, Low),
            ("BCHUSDT", Classic, Medium),
            ("ETCUSDT", Classic, Medium),
            ("XLMUSDT", Classic, Low),
            ("VETUSDT", Classic, Medium),
            ("ALGOUSDT", Classic, Low),
            ("HBARUSDT", Classic, Medium),
            ("QNTUSDT", Classic, Medium),
            ("EOSUSDT", Classic, Medium),
            ("XTZUSDT", Classic, Medium),
            ("IOTAUSDT", Classic, High),
            ("NEOUSDT", Classic, High),
            ("EGLDUSDT", Classic, High),
        ];
        Self {
            assets: ASSETS
                .iter()
                .map(|&(symbol, sector, volatility)| Asset::new(symbol, sector, volatility))
                .collect(),
        }
    }
}

//! Market data source trait and structured error types.
//!
//! `MarketDataSource` abstracts over where prices and candles come from
//! (Binance REST, CoinGecko, CSV replay, synthetic walk) so the desk can chain
//! fallbacks and tests can swap in mocks.

use crate::domain::{CandleSeries, Interval, Trend};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Structured error types for market data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("request timed out after {secs}s: {url}")]
    Timeout { url: String, secs: u64 },

    #[error("rate limited by source (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: source has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("{source_name} does not provide {what}")]
    Unsupported {
        source_name: String,
        what: &'static str,
    },

    #[error("no data for {what} after trying every source")]
    Unavailable { what: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// Errors worth retrying against the same endpoint.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DataError::NetworkUnreachable(_)
                | DataError::Timeout { .. }
                | DataError::RateLimited { .. }
        )
    }
}

/// Latest price for one symbol with its direction versus the previous refresh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    pub price: f64,
    pub trend: Trend,
}

/// Symbol → latest tick.
pub type PriceBook = HashMap<String, PriceTick>;

/// Trait for market data sources.
///
/// Implementations handle transport and parsing for one source; fallback
/// ordering and trend tracking live in `MarketFeed`.
pub trait MarketDataSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Current price for every symbol the source knows, keyed by `XXXUSDT`.
    fn latest_prices(&self) -> Result<HashMap<String, f64>, DataError>;

    /// The most recent `limit` candles for `symbol` at `interval`, oldest first.
    fn candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<CandleSeries, DataError>;

    /// False while the source refuses requests (circuit breaker open).
    fn is_available(&self) -> bool {
        true
    }
}

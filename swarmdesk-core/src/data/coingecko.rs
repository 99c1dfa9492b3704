//! CoinGecko `/coins/markets` as a price-only fallback.
//!
//! CoinGecko lists by coin id, not pair, so symbols are mapped to the
//! exchange convention (`btc` → `BTCUSDT`). Candles are not offered.

use super::circuit_breaker::CircuitBreaker;
use super::http::HttpFetcher;
use super::provider::{DataError, MarketDataSource};
use crate::domain::{CandleSeries, Interval};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const MARKETS_URL: &str = "https://api.coingecko.com/api/v3/coins/markets\
?vs_currency=usd&order=market_cap_desc&per_page=200&page=1&sparkline=false";

#[derive(Debug, Deserialize)]
struct MarketRow {
    symbol: String,
    current_price: Option<f64>,
}

pub struct CoinGeckoSource {
    fetcher: HttpFetcher,
    url: String,
    timeout: Duration,
}

impl CoinGeckoSource {
    pub fn new(breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        Ok(Self {
            fetcher: HttpFetcher::new(breaker)?,
            url: MARKETS_URL.to_string(),
            timeout: Duration::from_secs(5),
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

impl MarketDataSource for CoinGeckoSource {
    fn name(&self) -> &str {
        "coingecko"
    }

    fn latest_prices(&self) -> Result<HashMap<String, f64>, DataError> {
        let rows: Vec<MarketRow> = self.fetcher.get_json(&self.url, self.timeout)?;
        Ok(to_pairs(rows))
    }

    fn candles(
        &self,
        _symbol: &str,
        _interval: Interval,
        _limit: usize,
    ) -> Result<CandleSeries, DataError> {
        Err(DataError::Unsupported {
            source_name: self.name().to_string(),
            what: "candles",
        })
    }

    fn is_available(&self) -> bool {
        self.fetcher.is_available()
    }
}

fn to_pairs(rows: Vec<MarketRow>) -> HashMap<String, f64> {
    rows.into_iter()
        .filter_map(|row| {
            let price = row.current_price.filter(|p| p.is_finite() && *p > 0.0)?;
            Some((format!("{}USDT", row.symbol.to_uppercase()), price))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_symbols_to_usdt_pairs() {
        let rows: Vec<MarketRow> = serde_json::from_str(
            r#"[
                {"id": "bitcoin", "symbol": "btc", "current_price": 64000.0},
                {"id": "pepe", "symbol": "pepe", "current_price": 0.0000071},
                {"id": "dead", "symbol": "ded", "current_price": 0.0},
                {"id": "ghost", "symbol": "gst", "current_price": null}
            ]"#,
        )
        .unwrap();
        let prices = to_pairs(rows);
        assert_eq!(prices.len(), 2);
        assert_eq!(prices["BTCUSDT"], 64000.0);
        assert!(prices.contains_key("PEPEUSDT"));
    }

    #[test]
    fn candles_are_unsupported() {
        let source = CoinGeckoSource::new(Arc::new(CircuitBreaker::default())).unwrap();
        let err = source.candles("BTCUSDT", Interval::OneHour, 10).unwrap_err();
        assert!(matches!(err, DataError::Unsupported { .. }));
    }
}

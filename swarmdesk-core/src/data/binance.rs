//! Binance public REST source: `/api/v3/klines` and `/api/v3/ticker/price`.
//!
//! Tries each configured endpoint in order (a CORS relay first, then the
//! direct hosts) and returns the first usable payload.

use super::circuit_breaker::CircuitBreaker;
use super::http::HttpFetcher;
use super::provider::{DataError, MarketDataSource};
use crate::domain::{Candle, CandleSeries, Interval};
use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const PRIMARY_HOST: &str = "https://api.binance.com";
pub const SECONDARY_HOST: &str = "https://api1.binance.com";
pub const RELAY: &str = "https://api.allorigins.win/raw";

/// One way of reaching the Binance API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Direct { host: String },
    /// Wrap the primary-host URL in a relay's `?url=` parameter.
    Relayed { relay: String, host: String },
}

impl Endpoint {
    pub fn url(&self, path_and_query: &str) -> Result<String, DataError> {
        match self {
            Endpoint::Direct { host } => Ok(format!("{host}{path_and_query}")),
            Endpoint::Relayed { relay, host } => {
                let inner = format!("{host}{path_and_query}");
                reqwest::Url::parse_with_params(relay, &[("url", inner.as_str())])
                    .map(String::from)
                    .map_err(|e| DataError::Other(format!("bad relay url {relay}: {e}")))
            }
        }
    }
}

pub fn default_endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::Relayed {
            relay: RELAY.to_string(),
            host: PRIMARY_HOST.to_string(),
        },
        Endpoint::Direct {
            host: PRIMARY_HOST.to_string(),
        },
        Endpoint::Direct {
            host: SECONDARY_HOST.to_string(),
        },
    ]
}

#[derive(Debug, Deserialize)]
struct TickerEntry {
    symbol: String,
    price: String,
}

pub struct BinanceSource {
    fetcher: HttpFetcher,
    endpoints: Vec<Endpoint>,
    price_timeout: Duration,
    candle_timeout: Duration,
}

impl BinanceSource {
    pub fn new(endpoints: Vec<Endpoint>, breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        Ok(Self {
            fetcher: HttpFetcher::new(breaker)?,
            endpoints,
            price_timeout: Duration::from_secs(5),
            candle_timeout: Duration::from_secs(8),
        })
    }

    pub fn with_default_endpoints() -> Result<Self, DataError> {
        Self::new(default_endpoints(), Arc::new(CircuitBreaker::default_source()))
    }

    pub fn with_timeouts(mut self, prices: Duration, candles: Duration) -> Self {
        self.price_timeout = prices;
        self.candle_timeout = candles;
        self
    }

    /// First endpoint that answers with a decodable payload wins.
    fn first_ok<T>(
        &self,
        path_and_query: &str,
        timeout: Duration,
        mut accept: impl FnMut(Value) -> Result<T, DataError>,
    ) -> Result<T, DataError> {
        let mut last_error = None;
        for endpoint in &self.endpoints {
            let url = endpoint.url(path_and_query)?;
            match self
                .fetcher
                .get_json::<Value>(&url, timeout)
                .and_then(&mut accept)
            {
                Ok(value) => return Ok(value),
                Err(DataError::CircuitBreakerTripped) => return Err(DataError::CircuitBreakerTripped),
                Err(e) => {
                    debug!(url, error = %e, "binance endpoint failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| DataError::Other("no binance endpoints configured".into())))
    }
}

impl MarketDataSource for BinanceSource {
    fn name(&self) -> &str {
        "binance"
    }

    fn latest_prices(&self) -> Result<HashMap<String, f64>, DataError> {
        self.first_ok("/api/v3/ticker/price", self.price_timeout, |value| {
            let entries: Vec<TickerEntry> = serde_json::from_value(value)
                .map_err(|e| DataError::MalformedResponse(format!("ticker: {e}")))?;
            Ok(parse_ticker(entries))
        })
    }

    fn candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<CandleSeries, DataError> {
        let query = format!(
            "/api/v3/klines?symbol={symbol}&interval={}&limit={limit}",
            interval.code()
        );
        self.first_ok(&query, self.candle_timeout, |value| {
            parse_klines(symbol, interval, &value)
        })
    }

    fn is_available(&self) -> bool {
        self.fetcher.is_available()
    }
}

fn parse_ticker(entries: Vec<TickerEntry>) -> HashMap<String, f64> {
    entries
        .into_iter()
        .filter_map(|e| {
            let price: f64 = e.price.parse().ok()?;
            (price.is_finite() && price > 0.0).then_some((e.symbol, price))
        })
        .collect()
}

/// Decode the kline array-of-arrays payload:
/// `[open_time_ms, "open", "high", "low", "close", "volume", ...]`.
pub fn parse_klines(
    symbol: &str,
    interval: Interval,
    value: &Value,
) -> Result<CandleSeries, DataError> {
    let rows = value
        .as_array()
        .ok_or_else(|| DataError::MalformedResponse("klines payload is not an array".into()))?;
    if rows.is_empty() {
        return Err(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    }

    let mut series = CandleSeries::new(symbol, interval);
    for row in rows {
        let fields = row
            .as_array()
            .filter(|f| f.len() >= 6)
            .ok_or_else(|| DataError::MalformedResponse("kline row too short".into()))?;
        let open_ms = fields[0]
            .as_i64()
            .ok_or_else(|| DataError::MalformedResponse("kline open time".into()))?;
        let open_time = DateTime::from_timestamp_millis(open_ms)
            .ok_or_else(|| DataError::MalformedResponse(format!("invalid timestamp {open_ms}")))?;
        let num = |i: usize| -> Result<f64, DataError> {
            match &fields[i] {
                Value::String(s) => s.parse().ok(),
                Value::Number(n) => n.as_f64(),
                _ => None,
            }
            .ok_or_else(|| DataError::MalformedResponse(format!("kline field {i}")))
        };
        let candle = Candle {
            open_time,
            open: num(1)?,
            high: num(2)?,
            low: num(3)?,
            close: num(4)?,
            volume: num(5)?,
        };
        series
            .push(candle)
            .map_err(|e| DataError::MalformedResponse(e.to_string()))?;
    }
    Ok(series)
}

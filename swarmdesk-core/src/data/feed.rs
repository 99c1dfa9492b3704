//! Ordered fallback over market data sources, plus trend tracking.

use super::provider::{DataError, MarketDataSource, PriceBook, PriceTick};
use crate::domain::{CandleSeries, Interval, Trend};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Tries sources in order; the first that answers wins. Remembers the last
/// price per symbol so each refresh can attach a trend.
pub struct MarketFeed {
    sources: Vec<Box<dyn MarketDataSource>>,
    book: Mutex<PriceBook>,
    online: AtomicBool,
}

impl MarketFeed {
    pub fn new(sources: Vec<Box<dyn MarketDataSource>>) -> Self {
        Self {
            sources,
            book: Mutex::new(PriceBook::new()),
            online: AtomicBool::new(false),
        }
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// True when the most recent price refresh succeeded.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn book(&self) -> MutexGuard<'_, PriceBook> {
        self.book.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pull prices from the first source that answers.
    ///
    /// The returned book holds only the symbols this refresh priced, so a
    /// symbol the source omitted is never judged on an old price. The
    /// remembered book keeps every symbol's last tick for `price` lookups.
    /// An unchanged price keeps the previous trend.
    pub fn refresh_prices(&self) -> Result<PriceBook, DataError> {
        for source in self.sources.iter().filter(|s| s.is_available()) {
            match source.latest_prices() {
                Ok(prices) if !prices.is_empty() => {
                    let mut book = self.book();
                    let mut fresh = PriceBook::with_capacity(prices.len());
                    for (symbol, price) in prices {
                        let trend = book.get(&symbol).map_or(Trend::Flat, |prev| {
                            if price == prev.price {
                                prev.trend
                            } else {
                                Trend::between(prev.price, price)
                            }
                        });
                        let tick = PriceTick { price, trend };
                        book.insert(symbol.clone(), tick);
                        fresh.insert(symbol, tick);
                    }
                    if !self.online.swap(true, Ordering::SeqCst) {
                        info!(source = source.name(), "market feed online");
                    }
                    debug!(source = source.name(), symbols = fresh.len(), "prices refreshed");
                    return Ok(fresh);
                }
                Ok(_) => debug!(source = source.name(), "empty price payload"),
                Err(e) => debug!(source = source.name(), error = %e, "price source failed"),
            }
        }

        if self.online.swap(false, Ordering::SeqCst) {
            warn!("every price source failed, market feed offline");
        }
        Err(DataError::Unavailable {
            what: "prices".into(),
        })
    }

    /// Candles from the first source that has them.
    pub fn candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<CandleSeries, DataError> {
        for source in self.sources.iter().filter(|s| s.is_available()) {
            match source.candles(symbol, interval, limit) {
                Ok(series) if !series.is_empty() => return Ok(series),
                Ok(_) => debug!(source = source.name(), symbol, "empty candle payload"),
                Err(DataError::Unsupported { .. }) => {}
                Err(e) => debug!(source = source.name(), symbol, error = %e, "candle source failed"),
            }
        }
        Err(DataError::Unavailable {
            what: format!("{symbol} {interval} candles"),
        })
    }

    pub fn tick(&self, symbol: &str) -> Option<PriceTick> {
        self.book().get(symbol).copied()
    }

    pub fn price(&self, symbol: &str) -> Option<f64> {
        self.tick(symbol).map(|t| t.price)
    }

    pub fn snapshot(&self) -> PriceBook {
        self.book().clone()
    }
}

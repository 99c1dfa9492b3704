//! Seeded random-walk market for offline runs and tests.
//!
//! Each `latest_prices` call moves every symbol one step. Streams are keyed by
//! symbol and step through `RngHierarchy`, so two sources with the same seed
//! produce the same market.

use super::provider::{DataError, MarketDataSource};
use crate::domain::{Candle, CandleSeries, Interval};
use crate::rng::{Purpose, RngHierarchy};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// 2024-01-01T00:00:00Z; candle timestamps count forward from here.
const ANCHOR_SECS: i64 = 1_704_067_200;

#[derive(Debug)]
struct Walk {
    step: u64,
    prices: HashMap<String, f64>,
}

pub struct SyntheticSource {
    rng: RngHierarchy,
    /// Max fractional move per step.
    volatility: f64,
    walk: Mutex<Walk>,
}

impl SyntheticSource {
    pub fn new(seed: u64, start: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            rng: RngHierarchy::new(seed),
            volatility: 0.01,
            walk: Mutex::new(Walk {
                step: 0,
                prices: start.into_iter().filter(|(_, p)| *p > 0.0).collect(),
            }),
        }
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility.abs();
        self
    }

    fn walk(&self) -> MutexGuard<'_, Walk> {
        self.walk.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stream(&self, key: &str, step: u64) -> StdRng {
        StdRng::seed_from_u64(self.rng.keyed_seed(key, Purpose::Synthetic, step))
    }
}

impl MarketDataSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn latest_prices(&self) -> Result<HashMap<String, f64>, DataError> {
        let mut walk = self.walk();
        walk.step += 1;
        let step = walk.step;
        let vol = self.volatility;
        let mut moved = HashMap::with_capacity(walk.prices.len());
        for (symbol, price) in walk.prices.iter_mut() {
            let shock: f64 = self.stream(symbol, step).gen_range(-vol..=vol);
            *price *= 1.0 + shock;
            moved.insert(symbol.clone(), *price);
        }
        Ok(moved)
    }

    /// `limit` bars ending at the symbol's current price.
    fn candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<CandleSeries, DataError> {
        let (step, last) = {
            let walk = self.walk();
            let price = walk
                .prices
                .get(symbol)
                .copied()
                .ok_or_else(|| DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                })?;
            (walk.step, price)
        };

        let key = format!("{symbol}/{}", interval.code());
        let mut rng = self.stream(&key, step);
        let vol = self.volatility.max(1e-4);

        let mut closes = Vec::with_capacity(limit);
        let mut level = 1.0;
        for _ in 0..limit {
            level *= 1.0 + rng.gen_range(-vol..=vol);
            closes.push(level);
        }
        // Rescale so the final close is the live price.
        let scale = closes.last().map_or(1.0, |l| last / l);

        let anchor = DateTime::from_timestamp(ANCHOR_SECS, 0).unwrap_or_default();
        let bar = interval.seconds();
        let first_bar = step as i64;
        let mut series = CandleSeries::new(symbol, interval);
        let mut open = closes.first().map_or(last, |c| c * scale);
        for (i, close) in closes.iter().enumerate() {
            let close = close * scale;
            let wick_up: f64 = rng.gen_range(0.0..vol / 2.0);
            let wick_down: f64 = rng.gen_range(0.0..vol / 2.0);
            let candle = Candle {
                open_time: anchor + Duration::seconds((first_bar + i as i64) * bar),
                open,
                high: open.max(close) * (1.0 + wick_up),
                low: open.min(close) * (1.0 - wick_down),
                close,
                volume: rng.gen_range(100.0..1_000.0),
            };
            series
                .push(candle)
                .map_err(|e| DataError::Other(format!("synthetic walk produced a bad bar: {e}")))?;
            open = close;
        }
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(seed: u64) -> SyntheticSource {
        SyntheticSource::new(
            seed,
            [("BTCUSDT".to_string(), 64_000.0), ("DOGEUSDT".to_string(), 0.15)],
        )
    }

    #[test]
    fn same_seed_same_market() {
        let (a, b) = (source(42), source(42));
        for _ in 0..5 {
            assert_eq!(a.latest_prices().unwrap(), b.latest_prices().unwrap());
        }
        assert_ne!(source(43).latest_prices().unwrap(), source(42).latest_prices().unwrap());
    }

    #[test]
    fn steps_stay_within_volatility() {
        let s = source(7).with_volatility(0.02);
        let mut prev = 64_000.0;
        for _ in 0..50 {
            let p = s.latest_prices().unwrap()["BTCUSDT"];
            assert!((p / prev - 1.0).abs() <= 0.02 + 1e-12);
            prev = p;
        }
    }

    #[test]
    fn candles_end_at_live_price() {
        let s = source(1);
        let live = s.latest_prices().unwrap()["DOGEUSDT"];
        let series = s.candles("DOGEUSDT", Interval::FourHours, 200).unwrap();
        assert_eq!(series.len(), 200);
        let last = series.last().unwrap().close;
        assert!((last - live).abs() < 1e-12);
        assert!(series.candles().iter().all(Candle::is_sane));
    }

    #[test]
    fn unknown_symbol() {
        let err = source(1).candles("NOPEUSDT", Interval::OneHour, 10).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }
}

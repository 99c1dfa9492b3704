//! Offline replay from a directory of CSV candle files.
//!
//! Layout: `{dir}/{SYMBOL}_{interval}.csv`, e.g. `BTCUSDT_1h.csv`, with the
//! header `open_time,open,high,low,close,volume` and RFC 3339 timestamps.
//!
//! Replay is driven by the price clock: every `latest_prices` call advances
//! one bar of the clock interval. `candles` only returns bars that opened at
//! or before the current clock bar, so strategies never see the future.

use super::provider::{DataError, MarketDataSource};
use crate::domain::{Candle, CandleSeries, Interval};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

type Loaded = HashMap<(String, Interval), Arc<Vec<Candle>>>;

pub struct CsvSource {
    dir: PathBuf,
    clock: Interval,
    warmup: usize,
    served: AtomicUsize,
    loaded: Mutex<Loaded>,
}

impl CsvSource {
    /// `warmup` bars of the clock interval are skipped before the first price
    /// so indicators have history from the start.
    pub fn new(dir: impl Into<PathBuf>, clock: Interval, warmup: usize) -> Self {
        Self {
            dir: dir.into(),
            clock,
            warmup,
            served: AtomicUsize::new(0),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_path(&self, symbol: &str, interval: Interval) -> PathBuf {
        self.dir.join(format!("{symbol}_{}.csv", interval.code()))
    }

    /// Symbols with a file for the clock interval, sorted.
    pub fn symbols(&self) -> Result<Vec<String>, DataError> {
        let suffix = format!("_{}.csv", self.clock.code());
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| DataError::Io(format!("{}: {e}", self.dir.display())))?;
        let mut symbols: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                name.strip_suffix(&suffix).map(str::to_string)
            })
            .collect();
        symbols.sort();
        Ok(symbols)
    }

    /// Bars served so far by `latest_prices`.
    pub fn position(&self) -> usize {
        self.served.load(Ordering::SeqCst)
    }

    fn cache(&self) -> MutexGuard<'_, Loaded> {
        self.loaded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(&self, symbol: &str, interval: Interval) -> Result<Arc<Vec<Candle>>, DataError> {
        let key = (symbol.to_string(), interval);
        if let Some(candles) = self.cache().get(&key) {
            return Ok(Arc::clone(candles));
        }

        let path = self.file_path(symbol, interval);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let candles = Arc::new(read_candles(&path)?);
        debug!(symbol, interval = %interval, bars = candles.len(), "loaded csv");
        self.cache().insert(key, Arc::clone(&candles));
        Ok(candles)
    }

    /// Index into the clock series for `step` bars served.
    fn clock_index(&self, len: usize, step: usize) -> usize {
        (self.warmup + step).min(len.saturating_sub(1))
    }
}

impl MarketDataSource for CsvSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn latest_prices(&self) -> Result<HashMap<String, f64>, DataError> {
        let step = self.served.fetch_add(1, Ordering::SeqCst);
        let mut prices = HashMap::new();
        for symbol in self.symbols()? {
            let candles = self.load(&symbol, self.clock)?;
            if candles.is_empty() {
                continue;
            }
            let bar = candles[self.clock_index(candles.len(), step)];
            prices.insert(symbol, bar.close);
        }
        Ok(prices)
    }

    fn candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<CandleSeries, DataError> {
        let candles = self.load(symbol, interval)?;

        // Clock bar of the most recent price served; before the first price
        // the warmup bar.
        let step = self.position().saturating_sub(1);
        let cutoff = match self.load(symbol, self.clock) {
            Ok(clock) if !clock.is_empty() => Some(clock[self.clock_index(clock.len(), step)].open_time),
            _ => None,
        };

        let visible: Vec<Candle> = candles
            .iter()
            .filter(|c| cutoff.map_or(true, |t| c.open_time <= t))
            .copied()
            .collect();
        if visible.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let start = visible.len().saturating_sub(limit);
        CandleSeries::from_candles(symbol, interval, visible[start..].to_vec())
            .map_err(|e| DataError::MalformedResponse(e.to_string()))
    }
}

/// Read one CSV candle file.
pub fn read_candles(path: &Path) -> Result<Vec<Candle>, DataError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| DataError::Io(format!("{}: {e}", path.display())))?;
    reader
        .deserialize::<Candle>()
        .map(|row| row.map_err(|e| DataError::MalformedResponse(format!("{}: {e}", path.display()))))
        .collect()
}

/// Write `series` in the layout `CsvSource` reads.
pub fn write_series(dir: &Path, series: &CandleSeries) -> Result<PathBuf, DataError> {
    fs::create_dir_all(dir).map_err(|e| DataError::Io(format!("{}: {e}", dir.display())))?;
    let path = dir.join(format!("{}_{}.csv", series.symbol(), series.interval().code()));
    let mut writer = csv::Writer::from_path(&path)
        .map_err(|e| DataError::Io(format!("{}: {e}", path.display())))?;
    for candle in series.candles() {
        writer
            .serialize(candle)
            .map_err(|e| DataError::Io(e.to_string()))?;
    }
    writer.flush().map_err(|e| DataError::Io(e.to_string()))?;
    Ok(path)
}

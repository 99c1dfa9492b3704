//! Everything the personas read, computed once per candidate evaluation.

use super::{
    atr, bollinger, ema, obv, rsi, swing_points, vwap, Bands, CandlePatterns, SwingPoints,
    VolumeStats,
};
use crate::domain::CandleSeries;
use serde::{Deserialize, Serialize};

pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const BB_PERIOD: usize = 20;
pub const BB_MULTIPLIER: f64 = 2.0;
pub const SWING_PERIOD: usize = 5;

/// Derived values from one candle series at one instant. Never persisted
/// across ticks; recomputed on every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub price: f64,
    pub open: f64,
    pub prev_close: Option<f64>,
    pub rsi: f64,
    pub ema5: f64,
    pub ema9: f64,
    pub ema10: f64,
    pub ema13: f64,
    pub ema20: f64,
    pub ema21: f64,
    pub ema30: f64,
    pub ema50: f64,
    pub ema200: f64,
    pub bands: Bands,
    pub atr: f64,
    /// ATR as a percentage of price (1.5 = 1.5%).
    pub atr_pct: f64,
    pub obv: Vec<f64>,
    pub vwap: f64,
    pub volume: VolumeStats,
    pub patterns: CandlePatterns,
    pub swings: SwingPoints,
}

impl IndicatorSnapshot {
    /// `None` for an empty series.
    pub fn compute(series: &CandleSeries) -> Option<Self> {
        let last = *series.last()?;
        let n = series.len();
        let closes = series.closes();
        let highs = series.highs();
        let lows = series.lows();
        let volumes = series.volumes();

        let price = last.close;
        let atr = atr(&highs, &lows, &closes, ATR_PERIOD);
        let atr_pct = if price > 0.0 { atr / price * 100.0 } else { 0.0 };

        Some(Self {
            price,
            open: last.open,
            prev_close: (n >= 2).then(|| closes[n - 2]),
            rsi: rsi(&closes, RSI_PERIOD),
            ema5: ema(&closes, 5),
            ema9: ema(&closes, 9),
            ema10: ema(&closes, 10),
            ema13: ema(&closes, 13),
            ema20: ema(&closes, 20),
            ema21: ema(&closes, 21),
            ema30: ema(&closes, 30),
            ema50: ema(&closes, 50),
            ema200: ema(&closes, 200),
            bands: bollinger(&closes, BB_PERIOD, BB_MULTIPLIER),
            atr,
            atr_pct,
            obv: obv(&closes, &volumes),
            vwap: vwap(series.candles()),
            volume: VolumeStats::compute(&volumes, super::volume::VOLUME_WINDOW),
            patterns: CandlePatterns::detect(series.candles()),
            swings: swing_points(&highs, &lows, SWING_PERIOD),
        })
    }

    pub fn is_green(&self) -> bool {
        self.price > self.open
    }

    /// One-bar price change in percent; 0 without a previous close.
    pub fn change_pct(&self) -> f64 {
        match self.prev_close {
            Some(prev) if prev != 0.0 => (self.price - prev) / prev * 100.0,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Interval;
    use crate::indicators::make_candles;

    fn series(closes: &[f64]) -> CandleSeries {
        CandleSeries::from_candles("BTCUSDT", Interval::OneHour, make_candles(closes)).unwrap()
    }

    #[test]
    fn empty_series_has_no_snapshot() {
        let empty = CandleSeries::new("BTCUSDT", Interval::OneHour);
        assert!(IndicatorSnapshot::compute(&empty).is_none());
    }

    #[test]
    fn snapshot_reads_last_candle() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let snap = IndicatorSnapshot::compute(&series(&closes)).unwrap();
        assert_eq!(snap.price, 159.0);
        assert_eq!(snap.prev_close, Some(158.0));
        assert_eq!(snap.obv.len(), 60);
        assert!(snap.ema5 > snap.ema20 && snap.ema20 > snap.ema50);
        // Not enough history for EMA 200: falls back to the last close.
        assert_eq!(snap.ema200, 159.0);
        assert_eq!(snap.rsi, 100.0);
        assert!(snap.is_green());
    }

    #[test]
    fn change_pct_against_previous_close() {
        let snap = IndicatorSnapshot::compute(&series(&[100.0, 101.0])).unwrap();
        assert!((snap.change_pct() - 1.0).abs() < 1e-9);
        let single = IndicatorSnapshot::compute(&series(&[100.0])).unwrap();
        assert_eq!(single.change_pct(), 0.0);
    }
}

//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! - Middle: mean(close, period)
//! - Upper: middle + mult * stddev(close, period)
//! - Lower: middle - mult * stddev(close, period)
//!
//! Uses population stddev (divide by N) over the trailing `period` closes.
//! Edge cases: fewer than `period` closes → flat band at the last close.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl Bands {
    fn flat(level: f64) -> Self {
        Self {
            upper: level,
            middle: level,
            lower: level,
        }
    }

    /// Relative band width: (upper − lower) / middle. Zero for a zero middle.
    pub fn width(&self) -> f64 {
        if self.middle == 0.0 {
            return 0.0;
        }
        (self.upper - self.lower) / self.middle
    }
}

pub fn bollinger(closes: &[f64], period: usize, multiplier: f64) -> Bands {
    let last = closes.last().copied().unwrap_or(f64::NAN);
    if period == 0 || closes.len() < period {
        return Bands::flat(last);
    }

    let window = &closes[closes.len() - period..];
    let mean = window.iter().sum::<f64>() / period as f64;
    let variance = window
        .iter()
        .map(|c| {
            let diff = c - mean;
            diff * diff
        })
        .sum::<f64>()
        / period as f64;
    let stddev = variance.sqrt();

    Bands {
        upper: mean + multiplier * stddev,
        middle: mean,
        lower: mean - multiplier * stddev,
    }
}

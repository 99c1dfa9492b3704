//! Fibonacci retracement and extension levels over a swing range.
//!
//! Levels are measured up from the swing low: low + (high − low) · ratio.
//! Retracements use ratios below 1, extensions ratios above 1. Downward
//! extensions mirror from the swing high for bearish targets.

use serde::{Deserialize, Serialize};

pub const RETRACEMENTS: [f64; 5] = [0.236, 0.382, 0.5, 0.618, 0.786];
pub const EXTENSIONS: [f64; 4] = [1.272, 1.618, 2.0, 2.618];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FibLevels {
    pub high: f64,
    pub low: f64,
}

impl FibLevels {
    pub fn new(high: f64, low: f64) -> Self {
        Self { high, low }
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Level at `ratio` of the range above the swing low.
    pub fn level(&self, ratio: f64) -> f64 {
        self.low + self.range() * ratio
    }

    /// Upward extension target.
    pub fn extension(&self, ratio: f64) -> f64 {
        self.level(ratio)
    }

    /// Downward extension target, mirrored from the swing high.
    pub fn extension_down(&self, ratio: f64) -> f64 {
        self.high - self.range() * ratio
    }

    /// True when `price` is within `tolerance` (fraction of price) of the level.
    pub fn near(&self, ratio: f64, price: f64, tolerance: f64) -> bool {
        price != 0.0 && (price - self.level(ratio)).abs() / price < tolerance
    }

    /// True when `price` lies strictly between two levels.
    pub fn between(&self, lower_ratio: f64, upper_ratio: f64, price: f64) -> bool {
        price > self.level(lower_ratio) && price < self.level(upper_ratio)
    }
}

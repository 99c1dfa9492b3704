//! Volume statistics over the trailing window (20 bars by default).

use serde::{Deserialize, Serialize};

pub const VOLUME_WINDOW: usize = 20;

/// Ratio above which the current bar counts as above-average volume.
pub const ABOVE_AVERAGE_RATIO: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeStats {
    pub current: f64,
    pub average: f64,
    /// current / average; 0 when the average is 0.
    pub ratio: f64,
}

impl VolumeStats {
    pub fn compute(volumes: &[f64], window: usize) -> Self {
        let current = volumes.last().copied().unwrap_or(0.0);
        let take = window.min(volumes.len());
        let average = if take == 0 {
            0.0
        } else {
            volumes[volumes.len() - take..].iter().sum::<f64>() / take as f64
        };
        let ratio = if average > 0.0 { current / average } else { 0.0 };
        Self {
            current,
            average,
            ratio,
        }
    }

    pub fn above_average(&self) -> bool {
        self.ratio > ABOVE_AVERAGE_RATIO
    }

    /// Above average and beyond a persona-specific ratio.
    pub fn confirms(&self, min_ratio: f64) -> bool {
        self.above_average() && self.ratio > min_ratio
    }
}

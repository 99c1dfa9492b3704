//! Swing point detection.
//!
//! Bar i is a swing high when its high is strictly greater than every other
//! high within ±period bars; swing lows mirror that on lows. Only bars with a
//! full window on both sides qualify, so i ∈ [period, len − period).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub index: usize,
    pub price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwingPoints {
    pub highs: Vec<SwingPoint>,
    pub lows: Vec<SwingPoint>,
}

impl SwingPoints {
    pub fn last_high(&self) -> Option<f64> {
        self.highs.last().map(|p| p.price)
    }

    pub fn last_low(&self) -> Option<f64> {
        self.lows.last().map(|p| p.price)
    }

    /// Second-to-last swing high (the structure level a breakout must clear).
    pub fn previous_high(&self) -> Option<f64> {
        self.highs.len().checked_sub(2).map(|i| self.highs[i].price)
    }

    pub fn previous_low(&self) -> Option<f64> {
        self.lows.len().checked_sub(2).map(|i| self.lows[i].price)
    }
}

pub fn swing_points(highs: &[f64], lows: &[f64], period: usize) -> SwingPoints {
    let n = highs.len().min(lows.len());
    let mut points = SwingPoints::default();
    if period == 0 || n < 2 * period + 1 {
        return points;
    }

    for i in period..n - period {
        let window = i - period..=i + period;
        let is_high = window.clone().all(|j| j == i || highs[j] < highs[i]);
        let is_low = window.into_iter().all(|j| j == i || lows[j] > lows[i]);
        if is_high {
            points.highs.push(SwingPoint {
                index: i,
                price: highs[i],
            });
        }
        if is_low {
            points.lows.push(SwingPoint {
                index: i,
                price: lows[i],
            });
        }
    }
    points
}

//! Exit level geometry from distances.

use crate::domain::{RiskProfile, Side};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitLevels {
    pub take_profit: f64,
    pub stop_loss: f64,
}

impl ExitLevels {
    /// Place TP and SL at the given distances on the correct sides of entry.
    pub fn from_distances(side: Side, entry: f64, tp_dist: f64, sl_dist: f64) -> Self {
        Self {
            take_profit: entry + side.sign() * tp_dist,
            stop_loss: entry - side.sign() * sl_dist,
        }
    }

    pub fn reward_to_risk(&self, entry: f64) -> f64 {
        let risk = (entry - self.stop_loss).abs();
        if risk == 0.0 {
            return 0.0;
        }
        (self.take_profit - entry).abs() / risk
    }
}

/// ATR levels before any band, margin or liquidation clamp.
pub fn raw_levels(side: Side, entry: f64, atr: f64, risk: &RiskProfile) -> ExitLevels {
    let stop = atr * risk.risk_multiplier;
    ExitLevels::from_distances(side, entry, stop * risk.reward_ratio, stop)
}

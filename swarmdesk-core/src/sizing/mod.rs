//! Risk sizer: turns an actionable decision into an order ticket.
//!
//! Sizing never fails loudly on geometry: out-of-band stops, targets and
//! margins are clamped and the clamp is noted on the rationale. It only
//! rejects when there is nothing to trade (HOLD, low confidence, thin
//! balance, bad price).
//!
//! # Formula
//! ```text
//! stop      = clamp(ATR * risk_multiplier, entry * [min_stop, max_stop])
//! target    = stop * reward_ratio
//! margin    = balance * account_risk / (stop / entry) / leverage
//!             clamped, capped at balance - reserve, scaled by confidence
//! distances = clamp(target|stop, entry * [min_tp, max_tp]); TP >= SL
//! SL        <= 0.9 * entry * 0.8 / leverage
//! ```

pub mod levels;

pub use levels::{raw_levels, ExitLevels};

use crate::domain::{Decision, Persona, Side};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

// ─── Error type ──────────────────────────────────────────────────────

/// Reasons the sizer declines to produce an order.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizingRejection {
    #[error("decision is HOLD")]
    NotActionable,

    #[error("confidence {confidence}% below threshold {threshold}%")]
    BelowConfidence { confidence: u8, threshold: u8 },

    #[error("balance {balance:.2} at or below minimum {minimum:.2}")]
    InsufficientBalance { balance: f64, minimum: f64 },

    #[error("invalid entry price {0}")]
    InvalidPrice(f64),

    #[error("margin rounds to zero")]
    ZeroMargin,
}

// ─── Config ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// Fraction of balance risked per trade.
    pub account_risk: f64,
    pub min_margin_abs: f64,
    pub min_margin_pct: f64,
    pub max_margin_pct: f64,
    /// Balance always left free after opening.
    pub reserve: f64,
    pub min_balance: f64,
    pub min_confidence: u8,
    /// Move (fraction of entry, before leverage) treated as liquidation.
    pub liquidation_move: f64,
    /// Share of the liquidation distance a stop may use.
    pub liquidation_safety: f64,
    pub margin_step: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            account_risk: 0.02,
            min_margin_abs: 5.0,
            min_margin_pct: 0.05,
            max_margin_pct: 0.30,
            reserve: 5.0,
            min_balance: 20.0,
            min_confidence: 75,
            liquidation_move: 0.8,
            liquidation_safety: 0.9,
            margin_step: 0.1,
        }
    }
}

// ─── Ticket ──────────────────────────────────────────────────────────

/// A sized order, ready for the ledger to open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderTicket {
    pub symbol: String,
    pub side: Side,
    pub entry_price: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
    pub margin: f64,
    pub leverage: u32,
    pub confidence: u8,
    pub rationale: String,
}

impl OrderTicket {
    pub fn stop_distance(&self) -> f64 {
        (self.entry_price - self.stop_loss).abs()
    }

    pub fn target_distance(&self) -> f64 {
        (self.take_profit - self.entry_price).abs()
    }
}

// ─── Sizer ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct RiskSizer {
    config: SizingConfig,
}

impl RiskSizer {
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SizingConfig {
        &self.config
    }

    /// Size an order for `decision` on `symbol` at `entry`.
    pub fn size(
        &self,
        persona: &Persona,
        decision: &Decision,
        symbol: &str,
        entry: f64,
        atr: f64,
        balance: f64,
    ) -> Result<OrderTicket, SizingRejection> {
        let cfg = &self.config;
        let side = decision.action.side().ok_or(SizingRejection::NotActionable)?;
        if decision.confidence < cfg.min_confidence {
            return Err(SizingRejection::BelowConfidence {
                confidence: decision.confidence,
                threshold: cfg.min_confidence,
            });
        }
        if balance <= cfg.min_balance {
            return Err(SizingRejection::InsufficientBalance {
                balance,
                minimum: cfg.min_balance,
            });
        }
        if !entry.is_finite() || entry <= 0.0 {
            return Err(SizingRejection::InvalidPrice(entry));
        }

        let risk = &persona.risk;
        let leverage = persona.leverage.max(1);
        let lev = f64::from(leverage);

        let stop = bounded(
            atr * risk.risk_multiplier,
            entry * risk.min_stop_pct,
            entry * risk.max_stop_pct,
        );
        let target = stop * risk.reward_ratio;

        let margin = self.margin(balance, stop / entry, lev, decision.confidence);
        if margin <= 0.0 {
            return Err(SizingRejection::ZeroMargin);
        }

        let band_low = entry * risk.min_tp_pct;
        let band_high = entry * risk.max_tp_pct;
        let mut sl_dist = bounded(stop, band_low, band_high);
        let mut tp_dist = bounded(target, band_low, band_high);
        if tp_dist < sl_dist {
            tp_dist = sl_dist;
        }

        let mut rationale = decision.rationale.clone();
        let liquidation = entry * cfg.liquidation_move / lev;
        if sl_dist > liquidation {
            sl_dist = liquidation * cfg.liquidation_safety;
            rationale.push_str(" [SL clamped for Safety]");
        }

        let levels = ExitLevels::from_distances(side, entry, tp_dist, sl_dist);
        debug!(
            persona = %persona.name,
            symbol,
            side = %side,
            entry,
            take_profit = levels.take_profit,
            stop_loss = levels.stop_loss,
            margin,
            "sized order"
        );

        Ok(OrderTicket {
            symbol: symbol.to_string(),
            side,
            entry_price: entry,
            take_profit: levels.take_profit,
            stop_loss: levels.stop_loss,
            margin,
            leverage,
            confidence: decision.confidence,
            rationale,
        })
    }

    fn margin(&self, balance: f64, stop_fraction: f64, lev: f64, confidence: u8) -> f64 {
        let cfg = &self.config;
        let risk_amount = balance * cfg.account_risk;
        let raw = if stop_fraction > 0.0 {
            risk_amount / stop_fraction / lev
        } else {
            f64::INFINITY
        };
        let floor = cfg.min_margin_abs.max(balance * cfg.min_margin_pct);
        let ceiling = (balance * cfg.max_margin_pct).min(balance - cfg.reserve);
        let clamped = raw.max(floor).min(ceiling);
        let scaled = clamped * f64::from(confidence) / 100.0;
        round_down(scaled, cfg.margin_step)
    }
}

/// `value.clamp(lo, hi)` that tolerates an inverted band (hi wins).
fn bounded(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}

fn round_down(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return value;
    }
    // Epsilon absorbs representation error (e.g. 5.3 / 0.1 = 52.999…).
    ((value / step) + 1e-9).floor() * step
}

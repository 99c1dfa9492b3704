//! Stop ratchet.
//!
//! **Core Rule:** stops may tighten, never loosen.
//!
//! - BUY: the stop only rises.
//! - SELL: the stop only falls.

use crate::domain::Side;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopRatchet {
    side: Side,
    level: f64,
}

impl StopRatchet {
    pub fn with_initial_level(side: Side, level: f64) -> Self {
        Self { side, level }
    }

    /// Apply a proposed stop; returns the ratcheted level.
    ///
    /// ```
    /// use swarmdesk_core::domain::Side;
    /// use swarmdesk_core::monitor::StopRatchet;
    ///
    /// let mut ratchet = StopRatchet::with_initial_level(Side::Buy, 95.0);
    /// assert_eq!(ratchet.apply(100.0), 100.0);
    /// assert_eq!(ratchet.apply(90.0), 100.0);
    /// ```
    pub fn apply(&mut self, proposed: f64) -> f64 {
        if proposed.is_finite() && self.side.stop_tightens(self.level, proposed) {
            self.level = proposed;
        }
        self.level
    }

    /// True when `proposed` would move the stop.
    pub fn would_tighten(&self, proposed: f64) -> bool {
        proposed.is_finite() && self.side.stop_tightens(self.level, proposed)
    }

    pub fn level(&self) -> f64 {
        self.level
    }
}

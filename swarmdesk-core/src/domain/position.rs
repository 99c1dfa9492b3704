use super::ids::PositionId;
use super::market::Side;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An open leveraged position owned by one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub symbol: String,
    pub side: Side,
    pub entry_price: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
    /// Collateral debited from the agent balance at open.
    pub margin: f64,
    pub leverage: u32,
    pub opened_at: DateTime<Utc>,
    pub is_trailing: bool,
    pub unrealized_pnl: f64,
}

impl Position {
    /// PnL at `price`: fractional move × margin × leverage.
    pub fn pnl_at(&self, price: f64) -> f64 {
        self.side.percent_move(self.entry_price, price) * self.margin * self.leverage as f64
    }

    /// Return on margin in percent.
    pub fn roi_pct_at(&self, price: f64) -> f64 {
        if self.margin <= 0.0 {
            return 0.0;
        }
        self.pnl_at(price) / self.margin * 100.0
    }

    /// BUY: TP > entry > SL. SELL: SL > entry > TP.
    pub fn is_oriented(&self) -> bool {
        match self.side {
            Side::Buy => self.take_profit > self.entry_price && self.entry_price > self.stop_loss,
            Side::Sell => self.stop_loss > self.entry_price && self.entry_price > self.take_profit,
        }
    }

    pub fn take_profit_hit(&self, price: f64) -> bool {
        match self.side {
            Side::Buy => price >= self.take_profit,
            Side::Sell => price <= self.take_profit,
        }
    }

    pub fn stop_loss_hit(&self, price: f64) -> bool {
        match self.side {
            Side::Buy => price <= self.stop_loss,
            Side::Sell => price >= self.stop_loss,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_position(side: Side) -> Position {
    let (tp, sl) = match side {
        Side::Buy => (110.0, 95.0),
        Side::Sell => (90.0, 105.0),
    };
    Position {
        id: PositionId("test-1".into()),
        symbol: "BTCUSDT".into(),
        side,
        entry_price: 100.0,
        take_profit: tp,
        stop_loss: sl,
        margin: 10.0,
        leverage: 10,
        opened_at: Utc::now(),
        is_trailing: false,
        unrealized_pnl: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pnl_scales_with_leverage() {
        let pos = sample_position(Side::Buy);
        // +2% × 10 margin × 10x = 2.0
        assert!((pos.pnl_at(102.0) - 2.0).abs() < 1e-9);
        assert!((pos.roi_pct_at(102.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn sell_profits_when_price_falls() {
        let pos = sample_position(Side::Sell);
        assert!(pos.pnl_at(98.0) > 0.0);
        assert!(pos.pnl_at(101.0) < 0.0);
    }

    #[test]
    fn orientation_check() {
        assert!(sample_position(Side::Buy).is_oriented());
        assert!(sample_position(Side::Sell).is_oriented());
        let mut broken = sample_position(Side::Buy);
        broken.stop_loss = 101.0;
        assert!(!broken.is_oriented());
    }

    #[test]
    fn exit_levels_are_inclusive() {
        let pos = sample_position(Side::Buy);
        assert!(pos.take_profit_hit(110.0));
        assert!(pos.stop_loss_hit(95.0));
        let short = sample_position(Side::Sell);
        assert!(short.take_profit_hit(90.0));
        assert!(short.stop_loss_hit(105.0));
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Direction;

/// Why a plan carries a zero position size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Refusal {
    DegenerateStop,
    DailyRiskCap,
    TradeCountCap,
}

impl fmt::Display for Refusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Refusal::DegenerateStop => write!(f, "degenerate_stop"),
            Refusal::DailyRiskCap => write!(f, "daily_risk_cap"),
            Refusal::TradeCountCap => write!(f, "trade_count_cap"),
        }
    }
}

/// Concrete levels and size for one signal. A zero `position_size` means
/// the trade must not be taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePlan {
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub position_size: f64,
    pub risk_amount: f64,
    pub risk_reward_ratio: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refusal: Option<Refusal>,
}

impl TradePlan {
    pub fn is_actionable(&self) -> bool {
        self.position_size > 0.0
    }

    pub fn stop_distance(&self) -> f64 {
        (self.entry_price - self.stop_loss).abs()
    }

    pub fn target_distance(&self) -> f64 {
        (self.take_profit - self.entry_price).abs()
    }

    /// P&L of exiting the whole position at `exit_price`, before costs.
    pub fn pnl_at(&self, exit_price: f64) -> f64 {
        (exit_price - self.entry_price) * self.position_size * self.direction.sign()
    }
}

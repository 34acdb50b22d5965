use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
        }
    }

    /// +1 for buys, -1 for sells.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Buy => 1.0,
            Direction::Sell => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    FairValueGap,
    LiquiditySweep,
    OrderBlock,
    BreakerBlock,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternKind::FairValueGap => write!(f, "fair_value_gap"),
            PatternKind::LiquiditySweep => write!(f, "liquidity_sweep"),
            PatternKind::OrderBlock => write!(f, "order_block"),
            PatternKind::BreakerBlock => write!(f, "breaker_block"),
        }
    }
}

impl PatternKind {
    /// Highest confidence a detector of this kind may emit.
    pub fn confidence_ceiling(&self) -> f64 {
        match self {
            PatternKind::FairValueGap => 90.0,
            PatternKind::LiquiditySweep => 95.0,
            PatternKind::OrderBlock => 95.0,
            PatternKind::BreakerBlock => 95.0,
        }
    }
}

/// Trade style tag. Drives the risk sizer's stop/target lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Scalping,
    Momentum,
    Reversal,
    GapFill,
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternType::Scalping => write!(f, "scalping"),
            PatternType::Momentum => write!(f, "momentum"),
            PatternType::Reversal => write!(f, "reversal"),
            PatternType::GapFill => write!(f, "gap_fill"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeOutcome {
    TakeProfit,
    StopLoss,
    TimeExit,
}

impl fmt::Display for TradeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeOutcome::TakeProfit => write!(f, "take_profit"),
            TradeOutcome::StopLoss => write!(f, "stop_loss"),
            TradeOutcome::TimeExit => write!(f, "time_exit"),
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Direction, PatternKind, PatternType, TradeOutcome};

/// A closed simulated trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    #[serde(rename = "pattern")]
    pub kind: PatternKind,
    pub pattern_type: PatternType,
    pub direction: Direction,
    pub confidence: f64,
    #[serde(default)]
    pub quality_score: Option<f64>,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub position_size: f64,
    pub commission: f64,
    /// Net of commission.
    pub pnl: f64,
    pub outcome: TradeOutcome,
    pub bars_held: usize,
}

impl TradeRecord {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }
}

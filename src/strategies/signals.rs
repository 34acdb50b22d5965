use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Bar, Direction, PatternKind, PatternType};

/// A scored pattern occurrence, anchored on the bar that triggered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(rename = "pattern")]
    pub kind: PatternKind,
    pub direction: Direction,
    pub confidence: f64,
    pub entry_price: f64,
    pub pattern_type: PatternType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl Signal {
    /// Signal triggered by `bar`: entry at its close, stamped with its time.
    pub fn at_bar(
        kind: PatternKind,
        direction: Direction,
        confidence: f64,
        pattern_type: PatternType,
        bar: &Bar,
    ) -> Self {
        Self {
            kind,
            direction,
            confidence,
            entry_price: bar.close,
            pattern_type,
            quality_score: None,
            timestamp: bar.timestamp,
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::core::indicators::{trailing_max_high, trailing_min_low};
use crate::core::Detector;
use crate::models::{Bar, Direction, PatternKind, PatternType};
use crate::strategies::signals::Signal;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepParams {
    /// Bars making up the recent high/low.
    pub window: usize,
    pub warmup: usize,
    pub min_bars: usize,
    /// Slack on the structure reclaim, as a fraction of the level.
    pub structure_tolerance: f64,
    pub base_confidence: f64,
    /// Confidence added per unit of wick-to-close ratio.
    pub wick_weight: f64,
    pub max_confidence: f64,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            window: 10,
            warmup: 15,
            min_bars: 20,
            structure_tolerance: 0.001,
            base_confidence: 70.0,
            wick_weight: 1000.0,
            max_confidence: 95.0,
        }
    }
}

/// Stop hunt then reversal: the bar pierces the recent low (high), closes
/// in the opposite direction and reclaims the recent high (low).
pub struct LiquiditySweepDetector {
    params: SweepParams,
}

impl LiquiditySweepDetector {
    pub fn new(params: SweepParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SweepParams {
        &self.params
    }

    fn confidence(&self, wick: f64, close: f64) -> f64 {
        let p = &self.params;
        (p.base_confidence + wick.abs() / close * p.wick_weight).min(p.max_confidence)
    }
}

impl Default for LiquiditySweepDetector {
    fn default() -> Self {
        Self::new(SweepParams::default())
    }
}

impl Detector for LiquiditySweepDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::LiquiditySweep
    }

    fn min_bars(&self) -> usize {
        self.params.min_bars
    }

    fn warmup(&self) -> usize {
        self.params.warmup
    }

    fn evaluate(&self, history: &[Bar]) -> Option<Signal> {
        let bar = history.last()?;
        let recent_high = trailing_max_high(history, self.params.window)?;
        let recent_low = trailing_min_low(history, self.params.window)?;
        let tol = self.params.structure_tolerance;

        if bar.low < recent_low && bar.is_bullish() && bar.close > recent_high * (1.0 - tol) {
            let conf = self.confidence(bar.close - bar.low, bar.close);
            return Some(Signal::at_bar(
                PatternKind::LiquiditySweep,
                Direction::Buy,
                conf,
                PatternType::Scalping,
                bar,
            ));
        }

        if bar.high > recent_high && bar.is_bearish() && bar.close < recent_low * (1.0 + tol) {
            let conf = self.confidence(bar.high - bar.close, bar.close);
            return Some(Signal::at_bar(
                PatternKind::LiquiditySweep,
                Direction::Sell,
                conf,
                PatternType::Scalping,
                bar,
            ));
        }

        None
    }
}

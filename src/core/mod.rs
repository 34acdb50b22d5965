pub mod indicators;
pub mod liquidity;
pub mod pd_arrays;
pub mod quality;
pub mod risk;

pub use liquidity::{LiquiditySweepDetector, SweepParams};
pub use pd_arrays::{
    BreakerBlockDetector, BreakerParams, FairValueGapDetector, FvgParams, OrderBlockDetector,
    OrderBlockParams,
};
pub use risk::RiskSizer;

use crate::models::{Bar, BarSeries, PatternKind};
use crate::strategies::signals::Signal;

/// A single-pattern scanner.
///
/// `evaluate` decides for the last bar of `history` and must only read
/// `history`. Patterns that need later bars for validation declare a
/// non-zero `confirmation_horizon`; `detect` then hands `confirm` the bars
/// after the trigger, capped at that horizon.
pub trait Detector: Send + Sync {
    fn kind(&self) -> PatternKind;

    /// Shorter series produce no signals. This gates the input only; the
    /// decision at each bar depends on its prefix alone.
    fn min_bars(&self) -> usize;

    /// First bar index the pattern can be evaluated at.
    fn warmup(&self) -> usize;

    fn evaluate(&self, history: &[Bar]) -> Option<Signal>;

    fn confirmation_horizon(&self) -> usize {
        0
    }

    fn confirm(&self, _signal: &Signal, _following: &[Bar]) -> bool {
        true
    }

    fn detect(&self, series: &BarSeries) -> Vec<Signal> {
        let bars = series.as_slice();
        if bars.len() < self.min_bars() {
            return Vec::new();
        }

        let start = self.warmup();
        let horizon = self.confirmation_horizon();
        let mut out = Vec::new();

        for i in start..bars.len() {
            let Some(signal) = self.evaluate(&bars[..=i]) else {
                continue;
            };
            if horizon > 0 {
                let end = (i + 1 + horizon).min(bars.len());
                if !self.confirm(&signal, &bars[i + 1..end]) {
                    continue;
                }
            }
            tracing::trace!(
                "{} {} @ {:.5} conf {:.1}",
                signal.kind,
                signal.direction,
                signal.entry_price,
                signal.confidence
            );
            out.push(signal);
        }
        out
    }
}

use std::cmp::Ordering;

use crate::config::DetectorConfig;
use crate::core::indicators::{atr, rsi, sma, trailing_mean_volume};
use crate::core::quality::quality_score;
use crate::core::{
    BreakerBlockDetector, Detector, FairValueGapDetector, LiquiditySweepDetector,
    OrderBlockDetector,
};
use crate::models::{Bar, BarSeries, Direction};
use crate::strategies::signals::Signal;

/// Runs every pattern detector over a window and ranks what they find.
pub struct PatternDetector {
    config: DetectorConfig,
    detectors: Vec<Box<dyn Detector>>,
}

impl PatternDetector {
    pub fn new(config: DetectorConfig) -> Self {
        let detectors: Vec<Box<dyn Detector>> = vec![
            Box::new(LiquiditySweepDetector::new(config.sweep.clone())),
            Box::new(OrderBlockDetector::new(config.order_block.clone())),
            Box::new(BreakerBlockDetector::new(config.breaker.clone())),
            Box::new(FairValueGapDetector::new(config.fvg.clone())),
        ];
        Self { config, detectors }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Shortest window any detector can work with. Below this `analyze`
    /// returns nothing.
    pub fn shortest_min_bars(&self) -> usize {
        self.detectors
            .iter()
            .map(|d| d.min_bars())
            .min()
            .unwrap_or(0)
    }

    /// All detectors, then gates, ranking, the strength and quality floors
    /// and the signal cap. Same input, same output.
    pub fn analyze(&self, series: &BarSeries) -> Vec<Signal> {
        let bars = series.as_slice();
        let mut signals = Vec::new();
        let mut raw = 0usize;

        for detector in &self.detectors {
            for mut signal in detector.detect(series) {
                raw += 1;
                let idx = series
                    .index_of(signal.timestamp)
                    .unwrap_or(bars.len().saturating_sub(1));
                let history = &bars[..=idx];

                if !self.passes_gates(&signal, history) {
                    continue;
                }
                self.apply_confluence(&mut signal, history);
                if self.config.quality_floor.is_some() {
                    signal.quality_score = Some(quality_score(&signal, history));
                }
                signals.push(signal);
            }
        }

        rank(&mut signals);
        let min_strength = self.config.min_strength;
        signals.retain(|s| s.confidence >= min_strength);
        if let Some(floor) = self.config.quality_floor {
            signals.retain(|s| s.quality_score.is_some_and(|q| q >= floor));
        }
        signals.truncate(self.config.max_signals);

        tracing::debug!(
            "analyze: {} bars, {} raw, {} kept",
            bars.len(),
            raw,
            signals.len()
        );
        signals
    }

    /// RSI band and ATR floor. A gate whose indicator cannot be computed yet
    /// rejects the signal.
    fn passes_gates(&self, signal: &Signal, history: &[Bar]) -> bool {
        if let Some(gate) = &self.config.rsi_gate {
            match rsi(history, gate.period) {
                Some(r) if r > gate.lower && r < gate.upper => {}
                _ => return false,
            }
        }
        if let Some(gate) = &self.config.atr_gate {
            match atr(history, gate.period) {
                Some(a) if signal.entry_price > 0.0 && a / signal.entry_price >= gate.min_pct => {}
                _ => return false,
            }
        }
        true
    }

    fn apply_confluence(&self, signal: &mut Signal, history: &[Bar]) {
        let Some(bonus) = &self.config.confluence else {
            return;
        };
        let Some(bar) = history.last() else {
            return;
        };

        let mut confidence = signal.confidence;
        if let Some(mean) = trailing_mean_volume(history, bonus.volume_window) {
            if bar.volume > mean * bonus.volume_multiple {
                confidence += bonus.volume_bonus;
            }
        }
        if let Some(trend) = sma(history, bonus.trend_period) {
            let with_trend = match signal.direction {
                Direction::Buy => bar.close > trend,
                Direction::Sell => bar.close < trend,
            };
            if with_trend {
                confidence += bonus.trend_bonus;
            }
        }
        signal.confidence = confidence.min(signal.kind.confidence_ceiling());
    }
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::baseline())
    }
}

/// Confidence descending, newer first on ties. Stable.
fn rank(signals: &mut [Signal]) {
    signals.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    });
}

use serde::{Deserialize, Serialize};

use crate::core::indicators::{trailing_max_high, trailing_mean_volume, trailing_min_low};
use crate::core::Detector;
use crate::models::{Bar, Direction, PatternKind, PatternType};
use crate::strategies::signals::Signal;

// ---------------------------------------------------------------------------
// Order block
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBlockParams {
    /// Minimum absolute close-to-close move.
    pub min_move: f64,
    /// Bars in the trailing volume mean.
    pub volume_window: usize,
    pub volume_surge_multiple: f64,
    /// Bars after the impulse searched for a retest.
    pub retest_horizon: usize,
    /// Max distance of a retest close from the impulse close, as a fraction.
    pub retest_tolerance: f64,
    pub confidence: f64,
    pub warmup: usize,
    pub min_bars: usize,
}

impl Default for OrderBlockParams {
    fn default() -> Self {
        Self {
            min_move: 0.005,
            volume_window: 10,
            volume_surge_multiple: 1.5,
            retest_horizon: 5,
            retest_tolerance: 0.002,
            confidence: 75.0,
            warmup: 10,
            min_bars: 15,
        }
    }
}

/// High-volume impulse candle that price comes back to within a few bars.
pub struct OrderBlockDetector {
    params: OrderBlockParams,
}

impl OrderBlockDetector {
    pub fn new(params: OrderBlockParams) -> Self {
        Self { params }
    }

    fn volume_surge(&self, history: &[Bar]) -> bool {
        let Some(bar) = history.last() else {
            return false;
        };
        match trailing_mean_volume(history, self.params.volume_window) {
            Some(mean) => bar.volume > mean * self.params.volume_surge_multiple,
            None => false,
        }
    }
}

impl Default for OrderBlockDetector {
    fn default() -> Self {
        Self::new(OrderBlockParams::default())
    }
}

impl Detector for OrderBlockDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::OrderBlock
    }

    fn min_bars(&self) -> usize {
        self.params.min_bars
    }

    fn warmup(&self) -> usize {
        self.params.warmup
    }

    /// Impulse candidate at the last bar. Retest is checked by `confirm`.
    fn evaluate(&self, history: &[Bar]) -> Option<Signal> {
        let n = history.len();
        if n < 2 {
            return None;
        }
        let bar = &history[n - 1];
        let prev = &history[n - 2];
        if prev.close <= 0.0 {
            return None;
        }

        let change = bar.close / prev.close - 1.0;
        if change.abs() < self.params.min_move {
            return None;
        }
        if !(self.volume_surge(history) || self.volume_surge(&history[..n - 1])) {
            return None;
        }

        let direction = if change > 0.0 {
            Direction::Buy
        } else {
            Direction::Sell
        };
        Some(Signal::at_bar(
            PatternKind::OrderBlock,
            direction,
            self.params.confidence,
            PatternType::Momentum,
            bar,
        ))
    }

    fn confirmation_horizon(&self) -> usize {
        self.params.retest_horizon
    }

    fn confirm(&self, signal: &Signal, following: &[Bar]) -> bool {
        let level = signal.entry_price;
        following
            .iter()
            .any(|b| ((b.close - level) / level).abs() < self.params.retest_tolerance)
    }
}

// ---------------------------------------------------------------------------
// Breaker block
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakerParams {
    /// Bars in the rolling support/resistance levels.
    pub level_window: usize,
    pub confidence: f64,
    pub warmup: usize,
    pub min_bars: usize,
}

impl Default for BreakerParams {
    fn default() -> Self {
        Self {
            level_window: 5,
            confidence: 80.0,
            warmup: 15,
            min_bars: 20,
        }
    }
}

/// Support that breaks turns into resistance, and the reverse.
pub struct BreakerBlockDetector {
    params: BreakerParams,
}

impl BreakerBlockDetector {
    pub fn new(params: BreakerParams) -> Self {
        Self { params }
    }
}

impl Default for BreakerBlockDetector {
    fn default() -> Self {
        Self::new(BreakerParams::default())
    }
}

impl Detector for BreakerBlockDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::BreakerBlock
    }

    fn min_bars(&self) -> usize {
        self.params.min_bars
    }

    fn warmup(&self) -> usize {
        self.params.warmup
    }

    fn evaluate(&self, history: &[Bar]) -> Option<Signal> {
        let n = history.len();
        if n < 2 {
            return None;
        }
        let bar = &history[n - 1];
        let prev_close = history[n - 2].close;
        let support = trailing_min_low(history, self.params.level_window)?;
        let resistance = trailing_max_high(history, self.params.level_window)?;

        let direction = if bar.close < support && prev_close > support {
            Direction::Sell
        } else if bar.close > resistance && prev_close < resistance {
            Direction::Buy
        } else {
            return None;
        };

        Some(Signal::at_bar(
            PatternKind::BreakerBlock,
            direction,
            self.params.confidence,
            PatternType::Reversal,
            bar,
        ))
    }
}

// ---------------------------------------------------------------------------
// Fair value gap
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FvgParams {
    /// Gaps at or below this fraction of price are noise.
    pub min_gap: f64,
    pub base_confidence: f64,
    /// Confidence added per unit of gap fraction.
    pub gap_weight: f64,
    pub max_confidence: f64,
    pub min_bars: usize,
}

impl Default for FvgParams {
    fn default() -> Self {
        Self {
            min_gap: 0.001,
            base_confidence: 60.0,
            gap_weight: 10_000.0,
            max_confidence: 90.0,
            min_bars: 10,
        }
    }
}

/// Three-bar imbalance that the third bar has not filled.
pub struct FairValueGapDetector {
    params: FvgParams,
}

impl FairValueGapDetector {
    pub fn new(params: FvgParams) -> Self {
        Self { params }
    }

    /// Confidence for a gap of `gap` (fraction of price).
    pub fn confidence_for_gap(&self, gap: f64) -> f64 {
        let p = &self.params;
        (p.base_confidence + gap * p.gap_weight).min(p.max_confidence)
    }
}

impl Default for FairValueGapDetector {
    fn default() -> Self {
        Self::new(FvgParams::default())
    }
}

impl Detector for FairValueGapDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::FairValueGap
    }

    fn min_bars(&self) -> usize {
        self.params.min_bars
    }

    fn warmup(&self) -> usize {
        2
    }

    fn evaluate(&self, history: &[Bar]) -> Option<Signal> {
        let n = history.len();
        if n < 3 {
            return None;
        }
        let (bar1, bar2, bar3) = (&history[n - 3], &history[n - 2], &history[n - 1]);

        let (direction, gap) =
            if bar1.high < bar3.low && bar2.is_bullish() && bar3.close > bar1.high {
                (Direction::Buy, (bar3.low - bar1.high) / bar1.high)
            } else if bar1.low > bar3.high && bar2.is_bearish() && bar3.close < bar1.low {
                (Direction::Sell, (bar1.low - bar3.high) / bar3.high)
            } else {
                return None;
            };

        if gap <= self.params.min_gap {
            return None;
        }

        Some(Signal::at_bar(
            PatternKind::FairValueGap,
            direction,
            self.confidence_for_gap(gap),
            PatternType::GapFill,
            bar3,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{flat_bars, gap_scenario, make_bars, make_bars_with_volume};

    #[test]
    fn bullish_fvg_scenario() {
        let series = gap_scenario();
        let signals = FairValueGapDetector::default().detect(&series);
        assert_eq!(signals.len(), 1, "{:?}", signals);
        let s = &signals[0];
        assert_eq!(s.direction, Direction::Buy);
        assert_eq!(s.pattern_type, PatternType::GapFill);
        assert!((s.confidence - 90.0).abs() < 1e-9);
        assert!((s.entry_price - 105.0).abs() < 1e-9);
        assert_eq!(s.timestamp, series[19].timestamp);
    }

    #[test]
    fn bearish_fvg_mirrors() {
        let mut data = vec![(100.0, 100.0, 100.0, 100.0); 9];
        data.push((99.7, 100.5, 99.6, 99.8)); // bar1 low 99.6
        data.push((99.5, 99.7, 99.0, 99.1)); // bearish gap bar
        data.push((99.0, 99.4, 98.8, 99.0)); // bar3 high 99.4 < 99.6
        let series = make_bars(&data);
        let signals = FairValueGapDetector::default().detect(&series);
        assert_eq!(signals.len(), 1, "{:?}", signals);
        assert_eq!(signals[0].direction, Direction::Sell);
        let gap = (99.6 - 99.4) / 99.4;
        assert!((signals[0].confidence - (60.0 + gap * 10_000.0)).abs() < 1e-9);
    }

    #[test]
    fn gap_in_first_bars_is_found() {
        let mut data = vec![(100.0, 100.0, 100.0, 100.0); 3];
        data.push((100.2, 101.5, 100.0, 101.3));
        data.push((101.5, 102.0, 101.0, 101.8)); // low 101 > 100
        data.extend(vec![(101.5, 101.5, 101.5, 101.5); 15]);
        let series = make_bars(&data);
        let signals = FairValueGapDetector::default().detect(&series);
        assert_eq!(signals.len(), 1, "{:?}", signals);
        assert_eq!(signals[0].timestamp, series[4].timestamp);
        assert!((signals[0].confidence - 90.0).abs() < 1e-9);
    }

    #[test]
    fn order_block_right_after_warmup_is_found() {
        let mut data = vec![(100.0, 100.5, 99.5, 100.0, 100.0); 10];
        data.push((100.0, 101.2, 99.9, 101.0, 400.0)); // bar 10
        data.push((101.0, 101.3, 100.9, 101.1, 100.0)); // retest
        data.extend(vec![(101.1, 101.2, 101.0, 101.1, 100.0); 4]);
        let series = make_bars_with_volume(&data);
        let signals = OrderBlockDetector::default().detect(&series);
        assert_eq!(signals.len(), 1, "{:?}", signals);
        assert_eq!(signals[0].timestamp, series[10].timestamp);
    }

    #[test]
    fn tiny_gap_is_filtered() {
        let mut data = vec![(100.0, 100.0, 100.0, 100.0); 9];
        data.push((100.0, 100.0, 99.9, 100.0));
        data.push((100.0, 100.1, 100.0, 100.08));
        data.push((100.06, 100.2, 100.05, 100.15)); // gap 0.05%
        let series = make_bars(&data);
        assert!(FairValueGapDetector::default().detect(&series).is_empty());
    }

    #[test]
    fn gap_with_bearish_middle_bar_is_ignored() {
        let mut data = vec![(100.0, 100.0, 100.0, 100.0); 9];
        data.push((100.0, 100.0, 99.5, 100.0));
        data.push((102.5, 103.0, 100.0, 101.0)); // bearish middle
        data.push((101.0, 103.0, 101.0, 102.5));
        let series = make_bars(&data);
        assert!(FairValueGapDetector::default().detect(&series).is_empty());
    }

    #[test]
    fn confidence_monotonic_in_gap_and_capped() {
        let d = FairValueGapDetector::default();
        let mut last = 0.0;
        for step in 1..200 {
            let c = d.confidence_for_gap(0.0002 * step as f64);
            assert!(c >= last);
            assert!(c <= 90.0);
            last = c;
        }
        assert_eq!(d.confidence_for_gap(0.04), 90.0);
    }

    #[test]
    fn bearish_breaker_on_support_break() {
        let mut data = vec![(100.0, 101.0, 99.0, 100.0); 20];
        data.push((99.5, 99.6, 98.0, 98.5)); // close 98.5 < support 99, prev close 100 > 99
        let series = make_bars(&data);
        let signals = BreakerBlockDetector::default().detect(&series);
        assert_eq!(signals.len(), 1, "{:?}", signals);
        assert_eq!(signals[0].direction, Direction::Sell);
        assert_eq!(signals[0].pattern_type, PatternType::Reversal);
        assert!((signals[0].confidence - 80.0).abs() < 1e-9);
    }

    #[test]
    fn bullish_breaker_on_resistance_break() {
        let mut data = vec![(100.0, 101.0, 99.0, 100.0); 20];
        data.push((100.5, 102.5, 100.4, 102.0));
        let series = make_bars(&data);
        let signals = BreakerBlockDetector::default().detect(&series);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].direction, Direction::Buy);
    }

    #[test]
    fn breaker_needs_previous_close_on_other_side() {
        let mut data = vec![(100.0, 101.0, 99.0, 100.0); 19];
        data.push((100.0, 101.0, 97.0, 98.0)); // first break
        data.push((98.0, 98.5, 96.5, 97.0)); // already below support
        let series = make_bars(&data);
        let signals = BreakerBlockDetector::default().detect(&series);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].timestamp, series[19].timestamp);
    }

    fn order_block_series(retest_close: f64) -> crate::models::BarSeries {
        let mut data = vec![(100.0, 100.5, 99.5, 100.0, 100.0); 15];
        data.push((100.0, 101.2, 99.9, 101.0, 400.0)); // +1% on 4x volume
        data.push((101.0, 101.5, 100.5, 101.4, 100.0));
        data.push((101.4, 101.6, 100.9, retest_close, 100.0));
        for _ in 0..4 {
            data.push((101.5, 102.0, 101.4, 101.8, 100.0));
        }
        make_bars_with_volume(&data)
    }

    #[test]
    fn order_block_requires_retest() {
        let confirmed = order_block_series(101.1); // within 0.2% of 101
        let signals = OrderBlockDetector::default().detect(&confirmed);
        assert_eq!(signals.len(), 1, "{:?}", signals);
        assert_eq!(signals[0].direction, Direction::Buy);
        assert_eq!(signals[0].pattern_type, PatternType::Momentum);
        assert_eq!(signals[0].timestamp, confirmed[15].timestamp);
        assert!((signals[0].confidence - 75.0).abs() < 1e-9);

        let unconfirmed = order_block_series(101.5);
        assert!(OrderBlockDetector::default().detect(&unconfirmed).is_empty());
    }

    #[test]
    fn order_block_retest_outside_horizon_is_ignored() {
        let mut data = vec![(100.0, 100.5, 99.5, 100.0, 100.0); 15];
        data.push((100.0, 101.2, 99.9, 101.0, 400.0));
        for _ in 0..5 {
            data.push((101.3, 101.6, 101.3, 101.4, 100.0));
        }
        data.push((101.4, 101.4, 100.9, 101.0, 100.0)); // 6th bar after
        let series = make_bars_with_volume(&data);
        assert!(OrderBlockDetector::default().detect(&series).is_empty());
    }

    #[test]
    fn order_block_needs_volume_surge() {
        let mut data = vec![(100.0, 100.5, 99.5, 100.0, 100.0); 15];
        data.push((100.0, 101.2, 99.9, 101.0, 120.0));
        data.push((101.0, 101.2, 100.9, 101.05, 100.0));
        let series = make_bars_with_volume(&data);
        assert!(OrderBlockDetector::default().detect(&series).is_empty());
    }

    #[test]
    fn bearish_order_block_with_surge_on_previous_bar() {
        let mut data = vec![(100.0, 100.5, 99.5, 100.0, 100.0); 14];
        data.push((100.0, 100.2, 99.8, 100.0, 300.0)); // surge bar, no move
        data.push((100.0, 100.0, 98.8, 99.0, 100.0)); // -1% next bar
        data.push((99.0, 99.2, 98.9, 99.1, 100.0)); // retest within 0.2%
        let series = make_bars_with_volume(&data);
        let signals = OrderBlockDetector::default().detect(&series);
        assert_eq!(signals.len(), 1, "{:?}", signals);
        assert_eq!(signals[0].direction, Direction::Sell);
        assert_eq!(signals[0].timestamp, series[15].timestamp);
    }

    #[test]
    fn flat_series_yields_nothing() {
        let series = flat_bars(30, 100.0);
        assert!(OrderBlockDetector::default().detect(&series).is_empty());
        assert!(BreakerBlockDetector::default().detect(&series).is_empty());
        assert!(FairValueGapDetector::default().detect(&series).is_empty());
    }
}

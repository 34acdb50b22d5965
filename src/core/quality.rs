use crate::core::indicators::{close_std_dev, pct_change};
use crate::models::{Bar, Direction};
use crate::strategies::signals::Signal;

const CONFIDENCE_WEIGHT: f64 = 0.4;
const VOLUME_WEIGHT: f64 = 0.2;
const MOMENTUM_WEIGHT: f64 = 0.2;
const VOLATILITY_WEIGHT: f64 = 0.2;

const RECENT_VOLUME_BARS: usize = 5;
const BASE_VOLUME_BARS: usize = 20;
/// Volume ratio that earns the full volume score.
const FULL_VOLUME_RATIO: f64 = 1.5;
const MOMENTUM_BARS: usize = 5;
const VOLATILITY_BARS: usize = 10;
/// Preferred band for stddev(close) / close.
const VOLATILITY_BAND: (f64, f64) = (0.005, 0.02);

/// Score in [0, 1] blending confidence, volume participation, momentum
/// agreement and volatility fit. `history` ends at the signal's bar.
pub fn quality_score(signal: &Signal, history: &[Bar]) -> f64 {
    let mut score = signal.confidence / 100.0 * CONFIDENCE_WEIGHT;

    if history.len() >= VOLATILITY_BARS {
        score += volume_score(history) * VOLUME_WEIGHT;
        score += volatility_score(history) * VOLATILITY_WEIGHT;
    }
    if history.len() >= MOMENTUM_BARS {
        score += momentum_score(signal.direction, history) * MOMENTUM_WEIGHT;
    }

    score.clamp(0.0, 1.0)
}

fn mean_volume(bars: &[Bar]) -> f64 {
    if bars.is_empty() {
        return 0.0;
    }
    bars.iter().map(|b| b.volume).sum::<f64>() / bars.len() as f64
}

fn volume_score(history: &[Bar]) -> f64 {
    let n = history.len();
    let recent = mean_volume(&history[n.saturating_sub(RECENT_VOLUME_BARS)..]);
    let base = mean_volume(&history[n.saturating_sub(BASE_VOLUME_BARS)..]);
    let ratio = if base > 0.0 { recent / base } else { 1.0 };
    (ratio / FULL_VOLUME_RATIO).min(1.0)
}

fn momentum_score(direction: Direction, history: &[Bar]) -> f64 {
    let Some(change) = pct_change(history, MOMENTUM_BARS) else {
        return 0.0;
    };
    let agrees = match direction {
        Direction::Buy => change > 0.0,
        Direction::Sell => change < 0.0,
    };
    if agrees {
        (change.abs() * 100.0).min(1.0)
    } else {
        0.0
    }
}

fn volatility_score(history: &[Bar]) -> f64 {
    let (Some(sd), Some(last)) = (close_std_dev(history, VOLATILITY_BARS), history.last()) else {
        return 0.0;
    };
    let vol = sd / last.close;
    let (lo, hi) = VOLATILITY_BAND;
    if (lo..=hi).contains(&vol) {
        1.0
    } else if vol < lo {
        vol / lo
    } else {
        (hi / vol).max(0.2)
    }
}

//! Rolling indicators over a bar history.
//!
//! Every function takes the history up to and including the evaluation bar
//! (`history.last()`). The `trailing_*` helpers cover the `window` bars that
//! end at the previous bar, so the evaluation bar never sees itself or
//! anything after it. All helpers return `None` when the history is too
//! short.

use crate::models::Bar;

fn trailing(history: &[Bar], window: usize) -> Option<&[Bar]> {
    if window == 0 || history.len() < window + 1 {
        return None;
    }
    let end = history.len() - 1;
    Some(&history[end - window..end])
}

/// Highest high over the `window` bars before the evaluation bar.
pub fn trailing_max_high(history: &[Bar], window: usize) -> Option<f64> {
    trailing(history, window)
        .map(|w| w.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max))
}

/// Lowest low over the `window` bars before the evaluation bar.
pub fn trailing_min_low(history: &[Bar], window: usize) -> Option<f64> {
    trailing(history, window).map(|w| w.iter().map(|b| b.low).fold(f64::INFINITY, f64::min))
}

/// Mean volume over the `window` bars before the evaluation bar.
pub fn trailing_mean_volume(history: &[Bar], window: usize) -> Option<f64> {
    trailing(history, window).map(|w| w.iter().map(|b| b.volume).sum::<f64>() / window as f64)
}

/// Simple moving average of the last `period` closes, evaluation bar included.
pub fn sma(history: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || history.len() < period {
        return None;
    }
    let w = &history[history.len() - period..];
    Some(w.iter().map(|b| b.close).sum::<f64>() / period as f64)
}

/// RSI from simple averages of gains and losses over the last `period`
/// close-to-close changes.
pub fn rsi(history: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || history.len() < period + 1 {
        return None;
    }
    let w = &history[history.len() - period - 1..];
    let (mut gain, mut loss) = (0.0, 0.0);
    for pair in w.windows(2) {
        let delta = pair[1].close - pair[0].close;
        if delta > 0.0 {
            gain += delta;
        } else {
            loss -= delta;
        }
    }
    let avg_gain = gain / period as f64;
    let avg_loss = loss / period as f64;

    if avg_loss == 0.0 {
        // flat window reads as neutral
        return Some(if avg_gain == 0.0 { 50.0 } else { 100.0 });
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Average true range over the last `period` bars.
pub fn atr(history: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || history.len() < period + 1 {
        return None;
    }
    let w = &history[history.len() - period - 1..];
    let total: f64 = w
        .windows(2)
        .map(|pair| pair[1].true_range(pair[0].close))
        .sum();
    Some(total / period as f64)
}

/// Sample standard deviation of the last `period` closes.
pub fn close_std_dev(history: &[Bar], period: usize) -> Option<f64> {
    if period < 2 || history.len() < period {
        return None;
    }
    let w = &history[history.len() - period..];
    let mean = w.iter().map(|b| b.close).sum::<f64>() / period as f64;
    let var = w.iter().map(|b| (b.close - mean).powi(2)).sum::<f64>() / (period - 1) as f64;
    Some(var.sqrt())
}

/// Fractional close change over the last `n` bars.
pub fn pct_change(history: &[Bar], n: usize) -> Option<f64> {
    if n == 0 || history.len() < n + 1 {
        return None;
    }
    let last = history[history.len() - 1].close;
    let base = history[history.len() - 1 - n].close;
    if base == 0.0 {
        return None;
    }
    Some(last / base - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{flat_bars, make_bars, make_bars_with_volume};

    #[test]
    fn trailing_window_excludes_evaluation_bar() {
        let bars = make_bars(&[
            (100.0, 101.0, 99.0, 100.0),
            (100.0, 103.0, 98.0, 100.0),
            (100.0, 102.0, 97.0, 100.0),
            (100.0, 150.0, 50.0, 100.0), // evaluation bar
        ]);
        let h = bars.as_slice();
        assert_eq!(trailing_max_high(h, 3), Some(103.0));
        assert_eq!(trailing_min_low(h, 3), Some(97.0));
        assert_eq!(trailing_max_high(h, 2), Some(103.0));
        assert_eq!(trailing_min_low(h, 1), Some(97.0));
        assert_eq!(trailing_max_high(h, 4), None);
    }

    #[test]
    fn trailing_mean_volume_over_previous_bars() {
        let bars = make_bars_with_volume(&[
            (100.0, 101.0, 99.0, 100.0, 10.0),
            (100.0, 101.0, 99.0, 100.0, 20.0),
            (100.0, 101.0, 99.0, 100.0, 1000.0),
        ]);
        assert_eq!(trailing_mean_volume(bars.as_slice(), 2), Some(15.0));
    }

    #[test]
    fn sma_includes_evaluation_bar() {
        let bars = make_bars(&[
            (1.0, 1.0, 1.0, 1.0),
            (2.0, 2.0, 2.0, 2.0),
            (3.0, 3.0, 3.0, 3.0),
        ]);
        assert_eq!(sma(bars.as_slice(), 2), Some(2.5));
        assert_eq!(sma(bars.as_slice(), 4), None);
    }

    #[test]
    fn rsi_extremes_and_midpoint() {
        let rising: Vec<_> = (0..15)
            .map(|i| {
                let v = 100.0 + i as f64;
                (v, v, v, v)
            })
            .collect();
        assert_eq!(rsi(make_bars(&rising).as_slice(), 14), Some(100.0));

        let falling: Vec<_> = (0..15)
            .map(|i| {
                let v = 200.0 - i as f64;
                (v, v, v, v)
            })
            .collect();
        let r = rsi(make_bars(&falling).as_slice(), 14).unwrap();
        assert!(r.abs() < 1e-9);

        // alternating +1/-1 => equal averages => 50
        let zigzag: Vec<_> = (0..15)
            .map(|i| {
                let v = if i % 2 == 0 { 100.0 } else { 101.0 };
                (v, v, v, v)
            })
            .collect();
        let r = rsi(make_bars(&zigzag).as_slice(), 14).unwrap();
        assert!((r - 50.0).abs() < 1e-9);

        assert_eq!(rsi(flat_bars(15, 100.0).as_slice(), 14), Some(50.0));
        assert_eq!(rsi(flat_bars(14, 100.0).as_slice(), 14), None);
    }

    #[test]
    fn atr_averages_true_range() {
        let bars = make_bars(&[
            (100.0, 101.0, 99.0, 100.0),
            (100.0, 102.0, 98.0, 101.0), // TR 4
            (101.0, 104.0, 101.0, 103.0), // TR 3
        ]);
        assert_eq!(atr(bars.as_slice(), 2), Some(3.5));
        assert_eq!(atr(bars.as_slice(), 3), None);
    }

    #[test]
    fn std_dev_and_pct_change() {
        let bars = make_bars(&[
            (2.0, 2.0, 2.0, 2.0),
            (4.0, 4.0, 4.0, 4.0),
            (4.0, 4.0, 4.0, 4.0),
            (4.0, 4.0, 4.0, 4.0),
            (5.0, 5.0, 5.0, 5.0),
            (5.0, 5.0, 5.0, 5.0),
            (7.0, 7.0, 7.0, 7.0),
            (9.0, 9.0, 9.0, 9.0),
        ]);
        // sample std of 2,4,4,4,5,5,7,9 = sqrt(32/7)
        let sd = close_std_dev(bars.as_slice(), 8).unwrap();
        assert!((sd - (32.0f64 / 7.0).sqrt()).abs() < 1e-9);

        let pc = pct_change(bars.as_slice(), 7).unwrap();
        assert!((pc - 3.5).abs() < 1e-9);
        assert_eq!(pct_change(bars.as_slice(), 8), None);
    }
}

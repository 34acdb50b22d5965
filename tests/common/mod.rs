#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use smc_signals::models::{Bar, BarSeries};

pub fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-15T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Bars from (open, high, low, close) tuples, volume 100, 1m apart.
pub fn make_bars(data: &[(f64, f64, f64, f64)]) -> BarSeries {
    let base = base_time();
    let bars = data
        .iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| Bar {
            timestamp: base + Duration::minutes(i as i64),
            open: o,
            high: h,
            low: l,
            close: c,
            volume: 100.0,
        })
        .collect();
    BarSeries::new(bars)
}

pub fn flat_bars(n: usize, price: f64) -> BarSeries {
    make_bars(&vec![(price, price, price, price); n])
}

/// 18 flat bars at 100, a bullish gap bar, then a bar opening at 104.
pub fn gap_scenario() -> BarSeries {
    let mut data = vec![(100.0, 100.0, 100.0, 100.0); 18];
    data.push((101.0, 103.5, 100.0, 103.0));
    data.push((104.0, 105.5, 104.0, 105.0));
    make_bars(&data)
}

/// Random walk from 100. Each step is (return, upper wick, lower wick,
/// volume), with wicks as fractions of the body extremes. `minutes` spaces
/// the bars.
pub fn random_walk(steps: &[(f64, f64, f64, f64)], minutes: i64) -> BarSeries {
    let base = base_time();
    let mut prev = 100.0;
    let bars = steps
        .iter()
        .enumerate()
        .map(|(i, &(ret, up, down, volume))| {
            let open = prev;
            let close = open * (1.0 + ret);
            prev = close;
            Bar {
                timestamp: base + Duration::minutes(i as i64 * minutes),
                open,
                high: open.max(close) * (1.0 + up),
                low: open.min(close) * (1.0 - down),
                close,
                volume,
            }
        })
        .collect();
    BarSeries::new(bars)
}

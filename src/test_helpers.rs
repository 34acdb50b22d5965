use chrono::{DateTime, Duration, Utc};

use crate::config::Config;
use crate::models::{Bar, BarSeries};
use crate::trading::account::AccountState;

pub fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-15T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Bars from (open, high, low, close) tuples, volume 100, 1m apart.
pub fn make_bars(data: &[(f64, f64, f64, f64)]) -> BarSeries {
    let with_volume: Vec<_> = data.iter().map(|&(o, h, l, c)| (o, h, l, c, 100.0)).collect();
    make_bars_with_volume(&with_volume)
}

/// Bars from (open, high, low, close, volume) tuples, 1m apart.
pub fn make_bars_with_volume(data: &[(f64, f64, f64, f64, f64)]) -> BarSeries {
    let base = base_time();
    let bars: Vec<Bar> = data
        .iter()
        .enumerate()
        .map(|(i, &(o, h, l, c, v))| Bar {
            timestamp: base + Duration::minutes(i as i64),
            open: o,
            high: h,
            low: l,
            close: c,
            volume: v,
        })
        .collect();
    BarSeries::new(bars)
}

/// n identical bars with every price at `price`.
pub fn flat_bars(n: usize, price: f64) -> BarSeries {
    make_bars(&vec![(price, price, price, price); n])
}

/// n bars alternating inside a fixed [99, 101] range.
pub fn range_bars(n: usize) -> Vec<(f64, f64, f64, f64)> {
    (0..n)
        .map(|i| {
            if i % 2 == 0 {
                (100.0, 101.0, 99.0, 100.5)
            } else {
                (100.5, 101.0, 99.0, 100.0)
            }
        })
        .collect()
}

/// 18 flat bars, a bullish gap bar, then a bar opening above the gap.
/// The last triple is a ~0.5% bullish fair value gap.
pub fn gap_scenario() -> BarSeries {
    let mut data = vec![(100.0, 100.0, 100.0, 100.0); 18];
    data.push((101.0, 103.5, 100.0, 103.0));
    data.push((104.0, 105.5, 104.0, 105.0));
    make_bars(&data)
}

pub fn account(capital: f64) -> AccountState {
    AccountState::new(capital, base_time().date_naive())
}

/// Baseline profiles, no fallback prices, quiet logging.
pub fn default_test_config() -> Config {
    Config {
        log_level: "ERROR".to_string(),
        ..Config::default()
    }
}

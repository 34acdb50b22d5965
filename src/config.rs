use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::core::{BreakerParams, FvgParams, OrderBlockParams, SweepParams};
use crate::models::PatternType;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("unknown profile: {0}")]
    UnknownProfile(String),

    #[error("fallback price for {symbol} must be positive, got {price}")]
    BadFallbackPrice { symbol: String, price: f64 },

    #[error("{pattern} target must be positive when a stop is set")]
    MissingTarget { pattern: &'static str },

    #[error("backtest window of {window} bars is shorter than the {need} bars the detectors need")]
    WindowTooShort { window: usize, need: usize },
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value.is_nan() || value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Detector settings
// ---------------------------------------------------------------------------

/// Keep a signal only when RSI sits strictly inside `(lower, upper)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiGate {
    pub period: usize,
    pub lower: f64,
    pub upper: f64,
}

/// Drop signals in markets quieter than `min_pct` ATR per unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtrGate {
    pub period: usize,
    pub min_pct: f64,
}

/// Confidence bonuses for volume and trend agreement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfluenceBonus {
    pub volume_window: usize,
    pub volume_multiple: f64,
    pub volume_bonus: f64,
    pub trend_period: usize,
    pub trend_bonus: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Confidence floor for reported signals.
    pub min_strength: f64,
    pub quality_floor: Option<f64>,
    pub max_signals: usize,
    pub sweep: SweepParams,
    pub order_block: OrderBlockParams,
    pub breaker: BreakerParams,
    pub fvg: FvgParams,
    pub rsi_gate: Option<RsiGate>,
    pub atr_gate: Option<AtrGate>,
    pub confluence: Option<ConfluenceBonus>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::baseline()
    }
}

impl DetectorConfig {
    /// Fast intraday settings: every detector at its default, no gates.
    pub fn baseline() -> Self {
        Self {
            min_strength: 60.0,
            quality_floor: None,
            max_signals: 5,
            sweep: SweepParams::default(),
            order_block: OrderBlockParams::default(),
            breaker: BreakerParams::default(),
            fvg: FvgParams::default(),
            rsi_gate: None,
            atr_gate: None,
            confluence: None,
        }
    }

    pub fn balanced() -> Self {
        Self {
            min_strength: 75.0,
            quality_floor: Some(0.65),
            max_signals: 3,
            sweep: SweepParams {
                structure_tolerance: 0.0005,
                base_confidence: 75.0,
                wick_weight: 1500.0,
                max_confidence: 92.0,
                ..SweepParams::default()
            },
            fvg: FvgParams {
                min_gap: 0.0008,
                base_confidence: 70.0,
                gap_weight: 5000.0,
                ..FvgParams::default()
            },
            rsi_gate: Some(RsiGate {
                period: 14,
                lower: 25.0,
                upper: 75.0,
            }),
            confluence: Some(ConfluenceBonus {
                volume_window: 10,
                volume_multiple: 1.2,
                volume_bonus: 3.0,
                trend_period: 20,
                trend_bonus: 3.0,
            }),
            ..Self::baseline()
        }
    }

    pub fn optimized() -> Self {
        Self {
            min_strength: 80.0,
            quality_floor: Some(0.75),
            max_signals: 3,
            sweep: SweepParams {
                warmup: 20,
                min_bars: 25,
                structure_tolerance: 0.0002,
                base_confidence: 75.0,
                wick_weight: 2000.0,
                ..SweepParams::default()
            },
            rsi_gate: Some(RsiGate {
                period: 14,
                lower: 30.0,
                upper: 70.0,
            }),
            atr_gate: Some(AtrGate {
                period: 14,
                min_pct: 0.0005,
            }),
            confluence: Some(ConfluenceBonus {
                volume_window: 15,
                volume_multiple: 1.3,
                volume_bonus: 5.0,
                trend_period: 20,
                trend_bonus: 5.0,
            }),
            ..Self::baseline()
        }
        .with_lookback(15)
    }

    pub fn from_profile(name: &str) -> Result<Self, ConfigError> {
        match name.to_lowercase().as_str() {
            "baseline" | "day_trading" => Ok(Self::baseline()),
            "balanced" => Ok(Self::balanced()),
            "optimized" => Ok(Self::optimized()),
            other => Err(ConfigError::UnknownProfile(other.to_string())),
        }
    }

    /// Sets the rolling window for recent extremes and volume means.
    pub fn with_lookback(mut self, bars: usize) -> Self {
        self.sweep.window = bars;
        self.order_block.volume_window = bars;
        self
    }

    pub fn lookback(&self) -> usize {
        self.sweep.window
    }

    /// Longest minimum window across the detectors. A window this long lets
    /// every detector run.
    pub fn longest_min_bars(&self) -> usize {
        self.sweep
            .min_bars
            .max(self.order_block.min_bars)
            .max(self.breaker.min_bars)
            .max(self.fvg.min_bars)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("min_strength", self.min_strength, 0.0, 100.0)?;
        check_range("max_signals", self.max_signals as f64, 1.0, 100.0)?;
        check_range("lookback", self.lookback() as f64, 1.0, 500.0)?;
        if let Some(q) = self.quality_floor {
            check_range("quality_floor", q, 0.0, 1.0)?;
        }
        if let Some(g) = &self.rsi_gate {
            check_range("rsi_gate.lower", g.lower, 0.0, g.upper)?;
            check_range("rsi_gate.upper", g.upper, g.lower, 100.0)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Risk settings
// ---------------------------------------------------------------------------

/// Stop and target distances as fractions of the entry price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopTarget {
    pub stop_pct: f64,
    pub target_pct: f64,
}

impl StopTarget {
    pub const fn new(stop_pct: f64, target_pct: f64) -> Self {
        Self {
            stop_pct,
            target_pct,
        }
    }

    pub fn reward_ratio(&self) -> f64 {
        if self.stop_pct == 0.0 {
            return 0.0;
        }
        self.target_pct / self.stop_pct
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Fraction of capital risked per trade.
    pub max_position_risk: f64,
    /// Trading stops once |daily P&L| reaches this fraction of capital.
    pub max_daily_risk: f64,
    pub max_trades_per_day: u32,
    pub scalping: StopTarget,
    pub momentum: StopTarget,
    pub reversal: StopTarget,
    pub gap_fill: StopTarget,
    /// Widen both distances for low-quality signals.
    pub quality_scaling: bool,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self::day_trading()
    }
}

impl RiskConfig {
    /// 2:1 targets, 0.5% per trade.
    pub fn day_trading() -> Self {
        Self {
            max_position_risk: 0.005,
            max_daily_risk: 0.02,
            max_trades_per_day: 8,
            scalping: StopTarget::new(0.003, 0.006),
            momentum: StopTarget::new(0.005, 0.010),
            reversal: StopTarget::new(0.004, 0.008),
            gap_fill: StopTarget::new(0.004, 0.008),
            quality_scaling: false,
        }
    }

    /// 3:1 targets, 0.6% per trade, four trades a day.
    pub fn balanced() -> Self {
        Self {
            max_position_risk: 0.006,
            max_daily_risk: 0.02,
            max_trades_per_day: 4,
            scalping: StopTarget::new(0.003, 0.009),
            momentum: StopTarget::new(0.0045, 0.0135),
            reversal: StopTarget::new(0.004, 0.012),
            gap_fill: StopTarget::new(0.004, 0.012),
            quality_scaling: true,
        }
    }

    /// 3:1 targets, 0.4% per trade, three trades a day.
    pub fn optimized() -> Self {
        Self {
            max_position_risk: 0.004,
            max_daily_risk: 0.015,
            max_trades_per_day: 3,
            scalping: StopTarget::new(0.002, 0.006),
            momentum: StopTarget::new(0.004, 0.012),
            reversal: StopTarget::new(0.003, 0.009),
            gap_fill: StopTarget::new(0.002, 0.006),
            quality_scaling: true,
        }
    }

    pub fn from_profile(name: &str) -> Result<Self, ConfigError> {
        match name.to_lowercase().as_str() {
            "baseline" | "day_trading" => Ok(Self::day_trading()),
            "balanced" => Ok(Self::balanced()),
            "optimized" => Ok(Self::optimized()),
            other => Err(ConfigError::UnknownProfile(other.to_string())),
        }
    }

    pub fn levels(&self, pattern_type: PatternType) -> StopTarget {
        match pattern_type {
            PatternType::Scalping => self.scalping,
            PatternType::Momentum => self.momentum,
            PatternType::Reversal => self.reversal,
            PatternType::GapFill => self.gap_fill,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("max_position_risk", self.max_position_risk, 0.0, 0.1)?;
        check_range("max_daily_risk", self.max_daily_risk, 0.0, 1.0)?;
        for (field, st) in [
            ("scalping", self.scalping),
            ("momentum", self.momentum),
            ("reversal", self.reversal),
            ("gap_fill", self.gap_fill),
        ] {
            check_range(field, st.stop_pct, 0.0, 0.5)?;
            check_range(field, st.target_pct, 0.0, 0.5)?;
            if st.stop_pct > 0.0 && st.target_pct <= 0.0 {
                return Err(ConfigError::MissingTarget { pattern: field });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Data feed and backtest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub symbols: Vec<String>,
    /// Bars requested per symbol on each scan.
    pub bars_per_fetch: usize,
    /// Static prices served when a live quote is unavailable.
    pub fallback_prices: HashMap<String, f64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            symbols: ["NAS100", "US30", "GBPJPY", "CADCHF", "USDJPY", "EURCAD", "USDCAD"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            bars_per_fetch: 100,
            fallback_prices: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Bars visible to the detector at each step.
    pub window_bars: usize,
    pub max_hold_bars: usize,
    /// Oldest signal, in bars, still worth acting on.
    pub max_signal_age_bars: usize,
    /// Round-trip cost as a fraction of notional.
    pub commission_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            window_bars: 100,
            max_hold_bars: 12,
            max_signal_age_bars: 5,
            commission_rate: 0.0001,
        }
    }
}

// ---------------------------------------------------------------------------
// Top level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub initial_capital: f64,
    pub feed: FeedConfig,
    pub detector: DetectorConfig,
    pub risk: RiskConfig,
    pub backtest: BacktestConfig,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            feed: FeedConfig::default(),
            detector: DetectorConfig::baseline(),
            risk: RiskConfig::day_trading(),
            backtest: BacktestConfig::default(),
            log_level: "INFO".to_string(),
        }
    }
}

impl Config {
    /// Defaults overridden by environment variables (and `.env`). Unknown
    /// profile names and unparsable numbers fall back to defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let env = |key: &str| std::env::var(key).ok();
        let num = |key: &str, default: f64| -> f64 {
            env(key).and_then(|v| v.parse().ok()).unwrap_or(default)
        };

        let mut cfg = Config::default();

        if let Some(profile) = env("DETECTOR_PROFILE") {
            match DetectorConfig::from_profile(&profile) {
                Ok(d) => cfg.detector = d,
                Err(e) => tracing::warn!("{}, using baseline detector", e),
            }
        }
        if let Some(profile) = env("RISK_PROFILE") {
            match RiskConfig::from_profile(&profile) {
                Ok(r) => cfg.risk = r,
                Err(e) => tracing::warn!("{}, using day_trading risk", e),
            }
        }

        let d = &mut cfg.detector;
        d.min_strength = num("MIN_PATTERN_STRENGTH", d.min_strength);
        d.max_signals = num("MAX_SIGNALS", d.max_signals as f64) as usize;
        if let Some(q) = env("QUALITY_FLOOR").and_then(|v| v.parse().ok()) {
            d.quality_floor = Some(q);
        }
        if let Some(n) = env("LOOKBACK").and_then(|v| v.parse().ok()) {
            cfg.detector = cfg.detector.with_lookback(n);
        }

        let r = &mut cfg.risk;
        r.max_position_risk = num("MAX_POSITION_RISK", r.max_position_risk);
        r.max_daily_risk = num("MAX_DAILY_RISK", r.max_daily_risk);
        r.max_trades_per_day = num("MAX_TRADES_PER_DAY", r.max_trades_per_day as f64) as u32;

        cfg.initial_capital = num("INITIAL_CAPITAL", cfg.initial_capital);
        cfg.backtest.commission_rate = num("COMMISSION_RATE", cfg.backtest.commission_rate);

        if let Some(symbols) = env("SYMBOLS") {
            cfg.feed.symbols = symbols
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(raw) = env("FALLBACK_PRICES") {
            cfg.feed.fallback_prices = parse_price_map(&raw);
        }
        if let Some(level) = env("LOG_LEVEL") {
            cfg.log_level = level;
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("initial_capital", self.initial_capital, f64::MIN_POSITIVE, f64::MAX)?;
        self.detector.validate()?;
        self.risk.validate()?;
        check_range("commission_rate", self.backtest.commission_rate, 0.0, 0.01)?;

        for (symbol, &price) in &self.feed.fallback_prices {
            if !(price > 0.0) {
                return Err(ConfigError::BadFallbackPrice {
                    symbol: symbol.clone(),
                    price,
                });
            }
        }

        let need = self.detector.longest_min_bars();
        if self.backtest.window_bars < need {
            return Err(ConfigError::WindowTooShort {
                window: self.backtest.window_bars,
                need,
            });
        }
        Ok(())
    }
}

/// Parses `"EURUSD=1.085,US30=39000"`. Malformed entries are skipped.
pub fn parse_price_map(raw: &str) -> HashMap<String, f64> {
    raw.split(',')
        .filter_map(|pair| {
            let (symbol, price) = pair.split_once('=')?;
            let symbol = symbol.trim();
            match price.trim().parse::<f64>() {
                Ok(p) if !symbol.is_empty() => Some((symbol.to_string(), p)),
                _ => {
                    tracing::warn!("Skipping malformed fallback price entry '{}'", pair);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(Config::default().validate().is_ok());
        for name in ["baseline", "balanced", "optimized"] {
            let mut cfg = Config::default();
            cfg.detector = DetectorConfig::from_profile(name).unwrap();
            cfg.risk = RiskConfig::from_profile(name).unwrap();
            assert!(cfg.validate().is_ok(), "{} failed", name);
        }
    }

    #[test]
    fn unknown_profile_is_an_error() {
        assert_eq!(
            DetectorConfig::from_profile("yolo"),
            Err(ConfigError::UnknownProfile("yolo".to_string()))
        );
    }

    #[test]
    fn baseline_targets_are_two_to_one() {
        let r = RiskConfig::day_trading();
        for t in [
            PatternType::Scalping,
            PatternType::Momentum,
            PatternType::Reversal,
            PatternType::GapFill,
        ] {
            assert!((r.levels(t).reward_ratio() - 2.0).abs() < 1e-9);
        }
        let b = RiskConfig::balanced();
        assert!((b.levels(PatternType::Momentum).reward_ratio() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn lookback_drives_rolling_windows() {
        let d = DetectorConfig::baseline().with_lookback(12);
        assert_eq!(d.lookback(), 12);
        assert_eq!(d.order_block.volume_window, 12);
        assert_eq!(DetectorConfig::optimized().lookback(), 15);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut cfg = Config::default();
        cfg.detector.min_strength = 120.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutOfRange {
                field: "min_strength",
                ..
            })
        ));

        let mut cfg = Config::default();
        cfg.feed.fallback_prices.insert("US30".into(), -1.0);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::BadFallbackPrice { .. })
        ));

        let mut cfg = Config::default();
        cfg.backtest.window_bars = 5;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::WindowTooShort { window: 5, need: 20 })
        );
    }

    #[test]
    fn stop_without_target_is_rejected() {
        let mut cfg = Config::default();
        cfg.risk.momentum = StopTarget::new(0.005, 0.0);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::MissingTarget { pattern: "momentum" })
        );

        // no stop at all is left to the sizer, which refuses it
        let mut cfg = Config::default();
        cfg.risk.momentum = StopTarget::new(0.0, 0.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn longest_min_bars_covers_every_detector() {
        let d = DetectorConfig::baseline();
        assert_eq!(d.longest_min_bars(), 20);
        assert!(d.longest_min_bars() >= d.fvg.min_bars);
        assert!(d.longest_min_bars() >= d.order_block.min_bars);
    }

    #[test]
    fn price_map_parsing_skips_garbage() {
        let m = parse_price_map("EURUSD=1.085, US30 = 39000,bogus,GBPJPY=abc");
        assert_eq!(m.len(), 2);
        assert_eq!(m["EURUSD"], 1.085);
        assert_eq!(m["US30"], 39000.0);
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = Config {
            detector: DetectorConfig::balanced(),
            ..Config::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}

pub mod backtesting;
pub mod config;
pub mod core;
pub mod logging;
pub mod market_data;
pub mod models;
pub mod strategies;
#[cfg(test)]
pub mod test_helpers;
pub mod trading;

pub use crate::config::{Config, ConfigError, DetectorConfig, RiskConfig};
pub use crate::core::risk::size;
pub use crate::models::{Bar, BarSeries, Direction, PatternKind, PatternType};
pub use crate::strategies::{PatternDetector, Signal};
pub use crate::trading::{AccountState, Refusal, TradePlan};

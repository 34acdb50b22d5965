pub mod report;
pub mod runner;

pub use report::{BacktestReport, PatternStats};
pub use runner::BacktestRunner;

pub mod fallback;
pub mod historical;

pub use fallback::FallbackFeed;
pub use historical::HistoricalFeed;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

use crate::models::BarSeries;

/// Source of bars and quotes per symbol.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Up to `limit` most recent bars, oldest first.
    async fn fetch_bars(&mut self, symbol: &str, limit: usize) -> Result<BarSeries>;

    async fn latest_price(&mut self, symbol: &str) -> Result<f64>;

    /// Quotes for every symbol that has one. Failures are logged and skipped.
    async fn latest_prices(&mut self, symbols: &[String]) -> HashMap<String, f64> {
        let mut prices = HashMap::new();
        for symbol in symbols {
            match self.latest_price(symbol).await {
                Ok(p) => {
                    prices.insert(symbol.clone(), p);
                }
                Err(e) => tracing::warn!("No price for {}: {:#}", symbol, e),
            }
        }
        prices
    }
}

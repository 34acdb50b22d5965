use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;

use crate::market_data::MarketData;
use crate::models::{Bar, BarSeries};

/// Replays preloaded bars per symbol. A cursor (`now`) controls what is
/// visible: only bars stamped at or before it are returned.
pub struct HistoricalFeed {
    data: HashMap<String, Vec<Bar>>,
    now: DateTime<Utc>,
}

impl HistoricalFeed {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            now: Utc::now(),
        }
    }

    /// Bars must already be sorted oldest-first.
    pub fn load(&mut self, symbol: &str, bars: BarSeries) {
        self.data.insert(symbol.to_string(), bars.into_iter().collect());
    }

    /// Loads a JSON array of bars, validating order and OHLC consistency.
    pub fn load_json(&mut self, symbol: &str, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let bars: Vec<Bar> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse bars from {}", path.display()))?;
        let series = BarSeries::try_new(bars)
            .with_context(|| format!("Invalid bar series in {}", path.display()))?;
        let n = series.len();
        tracing::info!("Loaded {} bars for {} from {}", n, symbol, path.display());
        self.load(symbol, series);
        Ok(n)
    }

    pub fn set_time(&mut self, t: DateTime<Utc>) {
        self.now = t;
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<_> = self.data.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub fn earliest_time(&self) -> Option<DateTime<Utc>> {
        self.data
            .values()
            .filter_map(|v| v.first().map(|b| b.timestamp))
            .min()
    }

    pub fn latest_time(&self) -> Option<DateTime<Utc>> {
        self.data
            .values()
            .filter_map(|v| v.last().map(|b| b.timestamp))
            .max()
    }

    fn visible_bars(&self, symbol: &str, limit: usize) -> Option<BarSeries> {
        let all = self.data.get(symbol)?;
        let end = all.partition_point(|b| b.timestamp <= self.now);
        let start = end.saturating_sub(limit);
        Some(BarSeries::new(all[start..end].to_vec()))
    }
}

impl Default for HistoricalFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketData for HistoricalFeed {
    async fn fetch_bars(&mut self, symbol: &str, limit: usize) -> Result<BarSeries> {
        self.visible_bars(symbol, limit)
            .with_context(|| format!("No data loaded for {}", symbol))
    }

    async fn latest_price(&mut self, symbol: &str) -> Result<f64> {
        self.visible_bars(symbol, 1)
            .and_then(|s| s.last().map(|b| b.close))
            .with_context(|| format!("No price for {} at {}", symbol, self.now))
    }
}

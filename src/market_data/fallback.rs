use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;

use crate::config::FeedConfig;
use crate::market_data::MarketData;
use crate::models::BarSeries;

/// Wraps a feed so a failed quote degrades to the last price seen for the
/// symbol, then to the configured static price.
pub struct FallbackFeed<F> {
    inner: F,
    defaults: HashMap<String, f64>,
    last_known: HashMap<String, f64>,
}

impl<F: MarketData> FallbackFeed<F> {
    pub fn new(inner: F, config: &FeedConfig) -> Self {
        Self {
            inner,
            defaults: config.fallback_prices.clone(),
            last_known: HashMap::new(),
        }
    }

    pub fn last_known(&self, symbol: &str) -> Option<f64> {
        self.last_known.get(symbol).copied()
    }

    async fn live_price(&mut self, symbol: &str) -> Result<f64> {
        let price = self.inner.latest_price(symbol).await?;
        if !price.is_finite() || price <= 0.0 {
            bail!("Unusable quote {} for {}", price, symbol);
        }
        Ok(price)
    }
}

#[async_trait]
impl<F: MarketData> MarketData for FallbackFeed<F> {
    async fn fetch_bars(&mut self, symbol: &str, limit: usize) -> Result<BarSeries> {
        self.inner.fetch_bars(symbol, limit).await
    }

    async fn latest_price(&mut self, symbol: &str) -> Result<f64> {
        match self.live_price(symbol).await {
            Ok(price) => {
                self.last_known.insert(symbol.to_string(), price);
                Ok(price)
            }
            Err(e) => {
                if let Some(&price) = self.last_known.get(symbol) {
                    tracing::warn!("{}: {:#}, using last known {:.5}", symbol, e, price);
                    return Ok(price);
                }
                if let Some(&price) = self.defaults.get(symbol) {
                    tracing::warn!("{}: {:#}, using fallback {:.5}", symbol, e, price);
                    return Ok(price);
                }
                Err(e.context(format!("No fallback price for {}", symbol)))
            }
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::core::RiskSizer;
use crate::market_data::MarketData;
use crate::strategies::pattern_detector::PatternDetector;
use crate::strategies::signals::Signal;
use crate::trading::account::AccountState;
use crate::trading::trade_plan::TradePlan;

/// Top signal for one symbol, sized against the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub symbol: String,
    pub signal: Signal,
    pub plan: TradePlan,
}

pub struct Scanner {
    detector: PatternDetector,
    sizer: RiskSizer,
    bars_per_fetch: usize,
}

impl Scanner {
    pub fn new(detector: PatternDetector, sizer: RiskSizer, bars_per_fetch: usize) -> Self {
        Self {
            detector,
            sizer,
            bars_per_fetch,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            PatternDetector::new(cfg.detector.clone()),
            RiskSizer::new(cfg.risk.clone()),
            cfg.feed.bars_per_fetch,
        )
    }

    /// One pass over `symbols`. Symbols that fail to fetch, have too few
    /// bars, or show no signal are skipped.
    pub async fn scan<F>(
        &self,
        feed: &mut F,
        symbols: &[String],
        account: &AccountState,
    ) -> Vec<Opportunity>
    where
        F: MarketData + ?Sized,
    {
        let mut out = Vec::new();

        for symbol in symbols {
            let series = match feed.fetch_bars(symbol, self.bars_per_fetch).await {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("[SCAN] {} fetch failed: {:#}", symbol, e);
                    continue;
                }
            };
            if series.len() < self.detector.shortest_min_bars() {
                tracing::debug!("[SCAN] {} only {} bars, skipping", symbol, series.len());
                continue;
            }

            let Some(signal) = self.detector.analyze(&series).into_iter().next() else {
                tracing::debug!("[SCAN] {} no signal", symbol);
                continue;
            };

            let price = match feed.latest_price(symbol).await {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(
                        "[SCAN] {} no quote ({:#}), pricing at signal close",
                        symbol,
                        e
                    );
                    signal.entry_price
                }
            };

            let plan = self.sizer.size(&signal, price, account);
            tracing::info!(
                "[SCAN] {} {} {} conf {:.1} @ {:.5} size {:.4}",
                symbol,
                signal.kind,
                signal.direction,
                signal.confidence,
                price,
                plan.position_size
            );
            out.push(Opportunity {
                symbol: symbol.clone(),
                signal,
                plan,
            });
        }

        out
    }
}

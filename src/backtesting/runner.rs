use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::{BacktestConfig, Config};
use crate::core::RiskSizer;
use crate::models::{Bar, BarSeries, Direction, TradeOutcome};
use crate::strategies::pattern_detector::PatternDetector;
use crate::strategies::signals::Signal;
use crate::trading::account::AccountState;
use crate::trading::trade_plan::{Refusal, TradePlan};
use crate::trading::trade_record::TradeRecord;

use super::report::BacktestReport;

struct OpenTrade {
    signal: Signal,
    plan: TradePlan,
    entry_index: usize,
    entry_time: DateTime<Utc>,
}

/// Walks a series bar by bar. At each bar the detector sees only the
/// trailing window ending there; at most one trade is open at a time.
pub struct BacktestRunner {
    detector: PatternDetector,
    sizer: RiskSizer,
    config: BacktestConfig,
    initial_capital: f64,
}

impl BacktestRunner {
    pub fn new(cfg: &Config) -> Self {
        Self::with_parts(
            PatternDetector::new(cfg.detector.clone()),
            RiskSizer::new(cfg.risk.clone()),
            cfg.backtest.clone(),
            cfg.initial_capital,
        )
    }

    pub fn with_parts(
        detector: PatternDetector,
        sizer: RiskSizer,
        config: BacktestConfig,
        initial_capital: f64,
    ) -> Self {
        Self {
            detector,
            sizer,
            config,
            initial_capital,
        }
    }

    pub fn run(&self, series: &BarSeries) -> BacktestReport {
        let bars = series.as_slice();
        let Some(first) = bars.first() else {
            return BacktestReport::from_run(
                self.initial_capital,
                Vec::new(),
                Vec::new(),
                0,
                HashMap::new(),
            );
        };

        info!(
            "=== BACKTEST START === {} bars from {} | capital ${:.2}",
            bars.len(),
            first.timestamp.format("%Y-%m-%d %H:%M"),
            self.initial_capital
        );

        let mut account = AccountState::new(self.initial_capital, first.timestamp.date_naive());
        let mut open: Option<OpenTrade> = None;
        let mut last_acted: Option<DateTime<Utc>> = None;
        let mut trades = Vec::new();
        let mut equity_curve = Vec::with_capacity(bars.len());
        let mut refusals: HashMap<Refusal, usize> = HashMap::new();
        let mut total_signals = 0usize;
        let min_bars = self.detector.shortest_min_bars();

        for (i, bar) in bars.iter().enumerate() {
            if account.roll_to(bar.timestamp.date_naive()) {
                debug!("New trading day {} | capital ${:.2}", account.day, account.capital);
            }

            if let Some(trade) = open.take() {
                match self.check_exit(&trade, bar, i) {
                    Some((exit_price, outcome)) => {
                        let record = self.close(trade, bar, i, exit_price, outcome);
                        account.record_close(record.pnl);
                        trades.push(record);
                    }
                    None => open = Some(trade),
                }
            }

            if open.is_none() && i + 1 >= min_bars {
                let start = (i + 1).saturating_sub(self.config.window_bars);
                let window = BarSeries::new(bars[start..=i].to_vec());
                let signals = self.detector.analyze(&window);
                total_signals += signals.len();

                let candidate = signals.into_iter().find(|s| {
                    let fresh = window
                        .index_of(s.timestamp)
                        .is_some_and(|idx| window.len() - 1 - idx <= self.config.max_signal_age_bars);
                    fresh && last_acted.map_or(true, |t| s.timestamp > t)
                });

                if let Some(signal) = candidate {
                    last_acted = Some(signal.timestamp);
                    let plan = self.sizer.size(&signal, bar.close, &account);
                    match plan.refusal {
                        Some(reason) => *refusals.entry(reason).or_default() += 1,
                        None => {
                            debug!(
                                "OPEN {} {} @ {:.5} size {:.4} SL {:.5} TP {:.5}",
                                signal.kind,
                                signal.direction,
                                plan.entry_price,
                                plan.position_size,
                                plan.stop_loss,
                                plan.take_profit
                            );
                            account.record_open();
                            open = Some(OpenTrade {
                                signal,
                                plan,
                                entry_index: i,
                                entry_time: bar.timestamp,
                            });
                        }
                    }
                }
            }

            equity_curve.push((bar.timestamp, account.capital));
        }

        // Whatever is still open exits at the final close.
        if let (Some(trade), Some(last)) = (open.take(), bars.last()) {
            let record = self.close(trade, last, bars.len() - 1, last.close, TradeOutcome::TimeExit);
            account.record_close(record.pnl);
            if let Some(point) = equity_curve.last_mut() {
                point.1 = account.capital;
            }
            trades.push(record);
        }

        info!(
            "=== BACKTEST COMPLETE === {} trades | final ${:.2} ({:+.2}%)",
            trades.len(),
            account.capital,
            account.return_pct()
        );

        BacktestReport::from_run(
            self.initial_capital,
            trades,
            equity_curve,
            total_signals,
            refusals,
        )
    }

    /// Stop first when one bar touches both levels.
    fn check_exit(&self, trade: &OpenTrade, bar: &Bar, i: usize) -> Option<(f64, TradeOutcome)> {
        let plan = &trade.plan;
        let (stop_hit, target_hit) = match plan.direction {
            Direction::Buy => (bar.low <= plan.stop_loss, bar.high >= plan.take_profit),
            Direction::Sell => (bar.high >= plan.stop_loss, bar.low <= plan.take_profit),
        };

        if stop_hit {
            Some((plan.stop_loss, TradeOutcome::StopLoss))
        } else if target_hit {
            Some((plan.take_profit, TradeOutcome::TakeProfit))
        } else if i - trade.entry_index >= self.config.max_hold_bars {
            Some((bar.close, TradeOutcome::TimeExit))
        } else {
            None
        }
    }

    fn close(
        &self,
        trade: OpenTrade,
        bar: &Bar,
        i: usize,
        exit_price: f64,
        outcome: TradeOutcome,
    ) -> TradeRecord {
        let plan = trade.plan;
        let commission = self.config.commission_rate * plan.position_size * plan.entry_price;
        let pnl = plan.pnl_at(exit_price) - commission;

        debug!(
            "CLOSE {} {} {} @ {:.5} pnl ${:+.2}",
            trade.signal.kind, plan.direction, outcome, exit_price, pnl
        );

        TradeRecord {
            kind: trade.signal.kind,
            pattern_type: trade.signal.pattern_type,
            direction: plan.direction,
            confidence: trade.signal.confidence,
            quality_score: trade.signal.quality_score,
            entry_time: trade.entry_time,
            exit_time: bar.timestamp,
            entry_price: plan.entry_price,
            exit_price,
            stop_loss: plan.stop_loss,
            take_profit: plan.take_profit,
            position_size: plan.position_size,
            commission,
            pnl,
            outcome,
            bars_held: i - trade.entry_index,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::models::{PatternKind, TradeOutcome};
use crate::trading::trade_plan::Refusal;
use crate::trading::trade_record::TradeRecord;

#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    // Period
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub bars: usize,

    // Performance
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_pnl: f64,
    pub total_return_pct: f64,

    // Trades
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub total_commission: f64,

    // Risk
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,

    // Signals
    pub total_signals: usize,
    pub refusals: HashMap<Refusal, usize>,

    pub outcomes: HashMap<TradeOutcome, usize>,
    pub pattern_stats: HashMap<PatternKind, PatternStats>,

    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<(DateTime<Utc>, f64)>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PatternStats {
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
}

impl BacktestReport {
    pub fn from_run(
        initial_capital: f64,
        trades: Vec<TradeRecord>,
        equity_curve: Vec<(DateTime<Utc>, f64)>,
        total_signals: usize,
        refusals: HashMap<Refusal, usize>,
    ) -> Self {
        let total_pnl: f64 = trades.iter().map(|t| t.pnl).sum();
        let final_capital = initial_capital + total_pnl;
        let total_trades = trades.len();

        let wins: Vec<f64> = trades.iter().filter(|t| t.is_win()).map(|t| t.pnl).collect();
        let losses: Vec<f64> = trades.iter().filter(|t| !t.is_win()).map(|t| t.pnl).collect();
        let gross_win: f64 = wins.iter().sum();
        let gross_loss: f64 = losses.iter().sum::<f64>().abs();

        let win_rate = if total_trades > 0 {
            wins.len() as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };
        let avg_win = if !wins.is_empty() {
            gross_win / wins.len() as f64
        } else {
            0.0
        };
        let avg_loss = if !losses.is_empty() {
            losses.iter().sum::<f64>() / losses.len() as f64
        } else {
            0.0
        };
        let profit_factor = if gross_loss > 0.0 {
            gross_win / gross_loss
        } else if !wins.is_empty() {
            f64::INFINITY
        } else {
            0.0
        };

        let best_trade = trades.iter().map(|t| t.pnl).fold(f64::NEG_INFINITY, f64::max);
        let worst_trade = trades.iter().map(|t| t.pnl).fold(f64::INFINITY, f64::min);

        let mut outcomes: HashMap<TradeOutcome, usize> = HashMap::new();
        let mut pattern_stats: HashMap<PatternKind, PatternStats> = HashMap::new();
        for t in &trades {
            *outcomes.entry(t.outcome).or_default() += 1;
            let entry = pattern_stats.entry(t.kind).or_default();
            entry.trades += 1;
            entry.total_pnl += t.pnl;
            if t.is_win() {
                entry.wins += 1;
            } else {
                entry.losses += 1;
            }
        }
        for stats in pattern_stats.values_mut() {
            stats.win_rate = stats.wins as f64 / stats.trades as f64 * 100.0;
        }

        let (max_drawdown, max_drawdown_pct) = max_drawdown(initial_capital, &equity_curve);

        BacktestReport {
            start: equity_curve.first().map(|(t, _)| *t),
            end: equity_curve.last().map(|(t, _)| *t),
            bars: equity_curve.len(),
            initial_capital,
            final_capital,
            total_pnl,
            total_return_pct: if initial_capital > 0.0 {
                total_pnl / initial_capital * 100.0
            } else {
                0.0
            },
            total_trades,
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate,
            avg_win,
            avg_loss,
            profit_factor,
            best_trade: if total_trades > 0 { best_trade } else { 0.0 },
            worst_trade: if total_trades > 0 { worst_trade } else { 0.0 },
            total_commission: trades.iter().map(|t| t.commission).sum(),
            max_drawdown,
            max_drawdown_pct,
            total_signals,
            refusals,
            outcomes,
            pattern_stats,
            trades,
            equity_curve,
        }
    }

    pub fn refusal_count(&self, reason: Refusal) -> usize {
        self.refusals.get(&reason).copied().unwrap_or(0)
    }
}

/// Largest peak-to-trough drop, absolute and as % of the peak.
fn max_drawdown(initial: f64, equity_curve: &[(DateTime<Utc>, f64)]) -> (f64, f64) {
    let mut peak = initial;
    let mut dd = 0.0f64;
    let mut dd_pct = 0.0f64;
    for &(_, equity) in equity_curve {
        peak = peak.max(equity);
        let drop = peak - equity;
        if drop > dd {
            dd = drop;
            dd_pct = if peak > 0.0 { drop / peak * 100.0 } else { 0.0 };
        }
    }
    (dd, dd_pct)
}

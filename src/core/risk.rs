use crate::config::RiskConfig;
use crate::models::Direction;
use crate::strategies::signals::Signal;
use crate::trading::account::AccountState;
use crate::trading::trade_plan::{Refusal, TradePlan};

/// Widening applied per unit of missing quality.
const QUALITY_STOP_SCALE: f64 = 0.5;

/// Turns a signal into concrete levels and a position size.
///
/// Stop and target sit at fixed percentages of `price` chosen by the
/// signal's pattern type. Size risks `max_position_risk` of capital over
/// the stop distance. A zero-size plan comes back, with the reason, when
/// the stop is degenerate or a daily cap is reached.
pub fn size(
    signal: &Signal,
    price: f64,
    account: &AccountState,
    config: &RiskConfig,
) -> TradePlan {
    let levels = config.levels(signal.pattern_type);
    let scale = match (config.quality_scaling, signal.quality_score) {
        (true, Some(q)) => 1.0 + (1.0 - q.clamp(0.0, 1.0)) * QUALITY_STOP_SCALE,
        _ => 1.0,
    };
    let stop_pct = levels.stop_pct * scale;
    let target_pct = levels.target_pct * scale;

    let (stop_loss, take_profit) = match signal.direction {
        Direction::Buy => (price * (1.0 - stop_pct), price * (1.0 + target_pct)),
        Direction::Sell => (price * (1.0 + stop_pct), price * (1.0 - target_pct)),
    };

    let risk_amount = account.capital * config.max_position_risk;
    let stop_distance = (price - stop_loss).abs();
    let target_distance = (take_profit - price).abs();

    let degenerate = !price.is_finite() || price <= 0.0 || !(stop_distance > 0.0);
    let refusal = if degenerate {
        Some(Refusal::DegenerateStop)
    } else if account.daily_pnl.abs() >= account.capital * config.max_daily_risk {
        Some(Refusal::DailyRiskCap)
    } else if account.trades_today >= config.max_trades_per_day {
        Some(Refusal::TradeCountCap)
    } else {
        None
    };

    let position_size = match refusal {
        None => risk_amount / stop_distance,
        Some(_) => 0.0,
    };
    let risk_reward_ratio = if degenerate {
        0.0
    } else {
        target_distance / stop_distance
    };

    if let Some(reason) = refusal {
        tracing::debug!(
            "{} {} @ {:.5} refused: {}",
            signal.kind,
            signal.direction,
            price,
            reason
        );
    }

    TradePlan {
        direction: signal.direction,
        entry_price: price,
        stop_loss,
        take_profit,
        position_size,
        risk_amount,
        risk_reward_ratio,
        refusal,
    }
}

/// `size` bound to one risk configuration.
#[derive(Debug, Clone, Default)]
pub struct RiskSizer {
    config: RiskConfig,
}

impl RiskSizer {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn size(&self, signal: &Signal, price: f64, account: &AccountState) -> TradePlan {
        size(signal, price, account, &self.config)
    }
}

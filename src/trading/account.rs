use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Capital and per-day counters threaded through sizing calls.
///
/// Capital moves only with realized P&L. Daily P&L and the trade count
/// reset when the account rolls to a new day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub initial_capital: f64,
    pub capital: f64,
    pub daily_pnl: f64,
    pub trades_today: u32,
    pub day: NaiveDate,
}

impl AccountState {
    pub fn new(initial_capital: f64, day: NaiveDate) -> Self {
        Self {
            initial_capital,
            capital: initial_capital,
            daily_pnl: 0.0,
            trades_today: 0,
            day,
        }
    }

    /// Moves to `day`, clearing the daily counters if it is a new one.
    /// Returns true when a reset happened.
    pub fn roll_to(&mut self, day: NaiveDate) -> bool {
        if day == self.day {
            return false;
        }
        self.day = day;
        self.daily_pnl = 0.0;
        self.trades_today = 0;
        true
    }

    pub fn record_open(&mut self) {
        self.trades_today += 1;
    }

    pub fn record_close(&mut self, pnl: f64) {
        self.capital += pnl;
        self.daily_pnl += pnl;
    }

    pub fn return_pct(&self) -> f64 {
        if self.initial_capital == 0.0 {
            return 0.0;
        }
        (self.capital - self.initial_capital) / self.initial_capital * 100.0
    }
}

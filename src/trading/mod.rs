pub mod account;
pub mod trade_plan;
pub mod trade_record;

pub use account::AccountState;
pub use trade_plan::{Refusal, TradePlan};
pub use trade_record::TradeRecord;

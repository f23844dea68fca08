//! Validated domain types shared across the crate.

pub mod models;
pub mod symbol;
pub mod trade_date;

pub use models::{
    DailyBar, OscillatorResult, PriceSeries, SignalRecord, TradeAction, TradeDecision, Zone,
    NOT_AVAILABLE,
};
pub use symbol::Symbol;
pub use trade_date::TradeDate;

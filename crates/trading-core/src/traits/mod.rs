//! Core traits for the trading engine.

mod exchange;
mod indicator;
mod market_data;
mod notifier;

pub use exchange::Exchange;
pub use indicator::{Indicator, MultiOutputIndicator};
pub use market_data::MarketData;
pub use notifier::Notifier;

//! Core data types for the trading engine.

mod account;
mod instrument;
mod interval;
mod ohlcv;
mod order;
mod regime;

pub use account::{AccountSnapshot, Holding};
pub use instrument::Instrument;
pub use interval::CandleInterval;
pub use ohlcv::{closes, Bar};
pub use order::{OrderAck, OrderAmount, OrderIntent, Side};
pub use regime::MarketRegime;

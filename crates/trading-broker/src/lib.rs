//! Exchange integrations.
//!
//! - [`UpbitClient`]: live REST client
//! - [`PaperExchange`]: simulated fills over any market data source
//! - [`StaticMarket`]: in-memory market data

pub mod auth;
mod market;
mod paper;
mod upbit;

pub use auth::{AuthError, Credentials};
pub use market::StaticMarket;
pub use paper::PaperExchange;
pub use upbit::{UpbitClient, UpbitConfig, MAX_CANDLES};

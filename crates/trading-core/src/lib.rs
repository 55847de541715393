//! Core types and traits for the trading engine.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, CandleInterval, Instrument)
//! - Account snapshots and order intents
//! - The market regime label shared by the classifier and the risk governor
//! - Core traits for market data, exchanges, indicators and notifiers

pub mod types;
pub mod traits;
pub mod error;

pub use error::{TradingError, TradingResult};
pub use types::*;
pub use traits::*;

//! Error types for the trading engine.

use thiserror::Error;

/// Top-level trading engine error.
#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TradingError {
    /// Whether the error should stop the process instead of being retried
    /// on the next tick.
    pub fn is_fatal(&self) -> bool {
        match self {
            TradingError::Config(_) | TradingError::Strategy(_) => true,
            TradingError::Exchange(e) => e.is_fatal(),
            _ => false,
        }
    }
}

/// Strategy configuration errors.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Strategy not found: {0}")]
    NotFound(String),
}

/// Errors raised by the exchange collaborator.
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Market or account data could not be obtained. Callers skip the
    /// affected instrument for this tick.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// The exchange refused or failed to accept an order.
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Invalid instrument: {0}")]
    InvalidInstrument(String),
}

impl ExchangeError {
    /// Authentication failures cannot be fixed by waiting.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExchangeError::Authentication(_))
    }

    /// Whether this error came from an order submission.
    pub fn is_order_rejection(&self) -> bool {
        matches!(
            self,
            ExchangeError::OrderRejected(_) | ExchangeError::InsufficientFunds { .. }
        )
    }
}

/// Notification side-channel failure. Never propagated past the channel.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notification transport error: {0}")]
    Transport(String),

    #[error("Notification rejected: {0}")]
    Rejected(String),

    #[error("Notification timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Indicator calculation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("Insufficient data: need {required} points, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl From<IndicatorError> for ExchangeError {
    fn from(e: IndicatorError) -> Self {
        ExchangeError::DataUnavailable(e.to_string())
    }
}

/// Result type alias for trading operations.
pub type TradingResult<T> = Result<T, TradingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let auth: TradingError = ExchangeError::Authentication("bad key".into()).into();
        assert!(auth.is_fatal());

        let data: TradingError = ExchangeError::DataUnavailable("timeout".into()).into();
        assert!(!data.is_fatal());

        assert!(TradingError::Config("missing".into()).is_fatal());
    }

    #[test]
    fn test_insufficient_data_maps_to_unavailable() {
        let err: ExchangeError = IndicatorError::InsufficientData {
            required: 20,
            available: 3,
        }
        .into();
        assert!(matches!(err, ExchangeError::DataUnavailable(_)));
        assert!(!err.is_order_rejection());
    }
}

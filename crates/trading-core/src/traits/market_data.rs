//! Market data access.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::error::ExchangeError;
use crate::types::{Bar, CandleInterval, Instrument};

/// Read-only view of exchange market data.
///
/// Implementations return candles oldest first. Any failure, including an
/// unknown instrument or a transport error, surfaces as
/// [`ExchangeError::DataUnavailable`] so callers can skip the instrument
/// for the current tick.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetch up to `count` most recent candles, oldest first.
    async fn candles(
        &self,
        instrument: &Instrument,
        interval: CandleInterval,
        count: usize,
    ) -> Result<Vec<Bar>, ExchangeError>;

    /// Latest traded price, `None` if the exchange has none.
    async fn current_price(&self, instrument: &Instrument) -> Result<Option<Decimal>, ExchangeError>;

    /// Latest prices for several instruments keyed by symbol. Instruments
    /// whose price cannot be read are left out.
    async fn current_prices(&self, instruments: &[Instrument]) -> HashMap<String, Decimal> {
        let mut prices = HashMap::with_capacity(instruments.len());
        for instrument in instruments {
            if let Ok(Some(price)) = self.current_price(instrument).await {
                prices.insert(instrument.symbol().to_string(), price);
            }
        }
        prices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    struct OnePrice;

    #[async_trait]
    impl MarketData for OnePrice {
        async fn candles(
            &self,
            instrument: &Instrument,
            _interval: CandleInterval,
            _count: usize,
        ) -> Result<Vec<Bar>, ExchangeError> {
            Err(ExchangeError::DataUnavailable(instrument.to_string()))
        }

        async fn current_price(&self, instrument: &Instrument) -> Result<Option<Decimal>, ExchangeError> {
            match instrument.base() {
                "BTC" => Ok(Some(dec!(100))),
                "ETH" => Ok(None),
                _ => Err(ExchangeError::DataUnavailable(instrument.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_current_prices_skips_missing() {
        let instruments = vec![
            Instrument::new("KRW", "BTC"),
            Instrument::new("KRW", "ETH"),
            Instrument::new("KRW", "XRP"),
        ];
        let prices = OnePrice.current_prices(&instruments).await;
        assert_eq!(prices.len(), 1);
        assert_eq!(prices["KRW-BTC"], dec!(100));
    }
}

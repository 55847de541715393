//! Exchange trait for account access and order placement.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::market_data::MarketData;
use crate::error::ExchangeError;
use crate::types::{AccountSnapshot, Instrument, OrderAck};

/// Trading venue: market data plus account and market orders.
///
/// Orders are fire-and-forget; an accepted order is not assumed filled.
/// Callers re-read [`Exchange::balances`] to learn the resulting state.
#[async_trait]
pub trait Exchange: MarketData {
    /// Current balances for every currency in the account.
    async fn balances(&self) -> Result<AccountSnapshot, ExchangeError>;

    /// Market buy spending `notional` of the quote currency.
    async fn market_buy(
        &self,
        instrument: &Instrument,
        notional: Decimal,
    ) -> Result<OrderAck, ExchangeError>;

    /// Market sell of `quantity` base-currency units.
    async fn market_sell(
        &self,
        instrument: &Instrument,
        quantity: Decimal,
    ) -> Result<OrderAck, ExchangeError>;

    /// Exchange name for logs.
    fn name(&self) -> &str;
}

//! Paper exchange for dry runs and simulation.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use trading_core::error::ExchangeError;
use trading_core::traits::{Exchange, MarketData};
use trading_core::types::{
    AccountSnapshot, Bar, CandleInterval, Holding, Instrument, OrderAck, OrderIntent,
};
use uuid::Uuid;

struct PaperAccount {
    holdings: HashMap<String, Holding>,
    orders: Vec<OrderAck>,
}

/// Simulated account that fills market orders immediately at the latest
/// price of the wrapped market.
///
/// Fees are charged per side on the traded value, the way the live
/// exchange does: on top of the spent amount for buys, out of the
/// proceeds for sells.
pub struct PaperExchange<M> {
    market: M,
    quote: String,
    account: Mutex<PaperAccount>,
    fee_rate: Decimal,
    slippage_pct: Decimal,
    min_order: Decimal,
}

impl<M: MarketData> PaperExchange<M> {
    /// Create a paper account holding `initial_balance` of `quote`.
    pub fn new(market: M, quote: &str, initial_balance: Decimal) -> Self {
        let mut holdings = HashMap::new();
        holdings.insert(
            quote.to_string(),
            Holding::new(quote, initial_balance, Decimal::ZERO),
        );
        Self {
            market,
            quote: quote.to_string(),
            account: Mutex::new(PaperAccount {
                holdings,
                orders: Vec::new(),
            }),
            fee_rate: dec!(0.0005),
            slippage_pct: Decimal::ZERO,
            min_order: dec!(5000),
        }
    }

    /// Set the per-side fee rate.
    pub fn with_fee(mut self, fee_rate: Decimal) -> Self {
        self.fee_rate = fee_rate;
        self
    }

    /// Set slippage percentage applied against the trader.
    pub fn with_slippage(mut self, slippage_pct: Decimal) -> Self {
        self.slippage_pct = slippage_pct;
        self
    }

    /// Smallest order value the exchange accepts.
    pub fn with_min_order(mut self, min_order: Decimal) -> Self {
        self.min_order = min_order;
        self
    }

    /// Seed a pre-existing holding, e.g. a position opened before start.
    pub fn with_holding(self, holding: Holding) -> Self {
        self.account()
            .holdings
            .insert(holding.currency.clone(), holding);
        self
    }

    /// The wrapped market.
    pub fn market(&self) -> &M {
        &self.market
    }

    /// Every order accepted so far, oldest first.
    pub fn orders(&self) -> Vec<OrderAck> {
        self.account().orders.clone()
    }

    fn account(&self) -> MutexGuard<'_, PaperAccount> {
        self.account.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn fill_price(&self, instrument: &Instrument) -> Result<Decimal, ExchangeError> {
        self.market
            .current_price(instrument)
            .await?
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| ExchangeError::DataUnavailable(format!("no price for {}", instrument)))
    }

    fn record(&self, account: &mut PaperAccount, intent: OrderIntent) -> OrderAck {
        let ack = OrderAck::accepted(Uuid::new_v4().to_string(), intent);
        account.orders.push(ack.clone());
        ack
    }
}

#[async_trait]
impl<M: MarketData> MarketData for PaperExchange<M> {
    async fn candles(
        &self,
        instrument: &Instrument,
        interval: CandleInterval,
        count: usize,
    ) -> Result<Vec<Bar>, ExchangeError> {
        self.market.candles(instrument, interval, count).await
    }

    async fn current_price(&self, instrument: &Instrument) -> Result<Option<Decimal>, ExchangeError> {
        self.market.current_price(instrument).await
    }

    async fn current_prices(&self, instruments: &[Instrument]) -> HashMap<String, Decimal> {
        self.market.current_prices(instruments).await
    }
}

#[async_trait]
impl<M: MarketData> Exchange for PaperExchange<M> {
    async fn balances(&self) -> Result<AccountSnapshot, ExchangeError> {
        Ok(AccountSnapshot::new(self.account().holdings.values().cloned()))
    }

    async fn market_buy(&self, instrument: &Instrument, notional: Decimal) -> Result<OrderAck, ExchangeError> {
        if instrument.quote() != self.quote {
            return Err(ExchangeError::InvalidInstrument(instrument.to_string()));
        }
        if notional < self.min_order {
            return Err(ExchangeError::OrderRejected(format!(
                "buy of {} is below the minimum order {}",
                notional, self.min_order
            )));
        }

        let price = self.fill_price(instrument).await? * (dec!(1) + self.slippage_pct / dec!(100));
        let cost = notional * (dec!(1) + self.fee_rate);
        let quantity = notional / price;

        let mut account = self.account();
        let available = account
            .holdings
            .get(&self.quote)
            .map(|h| h.balance)
            .unwrap_or(Decimal::ZERO);
        if cost > available {
            return Err(ExchangeError::InsufficientFunds {
                required: cost,
                available,
            });
        }

        if let Some(cash) = account.holdings.get_mut(&self.quote) {
            cash.balance -= cost;
        }
        let held = account
            .holdings
            .entry(instrument.base().to_string())
            .or_insert_with(|| Holding::new(instrument.base(), Decimal::ZERO, Decimal::ZERO));
        let old_value = held.total() * held.avg_cost;
        held.balance += quantity;
        held.avg_cost = (old_value + notional) / held.total();

        debug!(instrument = %instrument, %price, %quantity, "Paper buy filled");
        Ok(self.record(&mut account, OrderIntent::buy(instrument.clone(), notional)))
    }

    async fn market_sell(&self, instrument: &Instrument, quantity: Decimal) -> Result<OrderAck, ExchangeError> {
        if quantity <= Decimal::ZERO {
            return Err(ExchangeError::OrderRejected(format!(
                "sell quantity {} is not positive",
                quantity
            )));
        }

        let price = self.fill_price(instrument).await? * (dec!(1) - self.slippage_pct / dec!(100));
        let value = quantity * price;
        if value < self.min_order {
            return Err(ExchangeError::OrderRejected(format!(
                "sell of {} is below the minimum order {}",
                value, self.min_order
            )));
        }

        let mut account = self.account();
        let held = account
            .holdings
            .get_mut(instrument.base())
            .filter(|h| h.balance >= quantity)
            .ok_or_else(|| ExchangeError::OrderRejected(format!(
                "not enough {} to sell {}",
                instrument.base(),
                quantity
            )))?;
        held.balance -= quantity;
        if held.total().is_zero() {
            account.holdings.remove(instrument.base());
        }

        let proceeds = value * (dec!(1) - self.fee_rate);
        account
            .holdings
            .entry(self.quote.clone())
            .or_insert_with(|| Holding::new(self.quote.clone(), Decimal::ZERO, Decimal::ZERO))
            .balance += proceeds;

        debug!(instrument = %instrument, %price, %quantity, "Paper sell filled");
        Ok(self.record(&mut account, OrderIntent::sell(instrument.clone(), quantity)))
    }

    fn name(&self) -> &str {
        "Paper Exchange"
    }
}

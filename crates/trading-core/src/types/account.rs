//! Account balances as reported by the exchange.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::instrument::Instrument;
use crate::error::ExchangeError;

/// Balance of one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Currency code, e.g. `KRW` or `BTC`
    pub currency: String,
    /// Freely usable amount
    pub balance: Decimal,
    /// Amount tied up in open orders
    pub locked: Decimal,
    /// Average acquisition cost in the quote currency; zero for the quote
    /// currency itself
    pub avg_cost: Decimal,
}

impl Holding {
    pub fn new(currency: impl Into<String>, balance: Decimal, avg_cost: Decimal) -> Self {
        Self {
            currency: currency.into(),
            balance,
            locked: Decimal::ZERO,
            avg_cost,
        }
    }

    /// Balance plus locked amount.
    pub fn total(&self) -> Decimal {
        self.balance + self.locked
    }

    /// Value of the whole holding at `price`.
    pub fn value_at(&self, price: Decimal) -> Decimal {
        self.total() * price
    }
}

/// Snapshot of every currency balance in the account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    holdings: HashMap<String, Holding>,
}

impl AccountSnapshot {
    pub fn new(holdings: impl IntoIterator<Item = Holding>) -> Self {
        Self {
            holdings: holdings
                .into_iter()
                .map(|h| (h.currency.clone(), h))
                .collect(),
        }
    }

    /// Free balance of `currency`, zero if absent.
    pub fn available(&self, currency: &str) -> Decimal {
        self.holdings
            .get(currency)
            .map(|h| h.balance)
            .unwrap_or(Decimal::ZERO)
    }

    /// Holding of the instrument's base currency, if any is held.
    pub fn holding(&self, instrument: &Instrument) -> Option<&Holding> {
        self.holdings
            .get(instrument.base())
            .filter(|h| h.total() > Decimal::ZERO)
    }

    /// Iterate over all holdings.
    pub fn holdings(&self) -> impl Iterator<Item = &Holding> {
        self.holdings.values()
    }

    /// Total account value in `quote`: the quote balance plus every
    /// holding valued at `prices`.
    ///
    /// A holding without a price makes the total unavailable, unless it is
    /// worth less than `dust_value` at its average cost; such leftovers
    /// (including zero-cost airdrops) are counted at cost.
    pub fn total_equity(
        &self,
        quote: &str,
        prices: &HashMap<String, Decimal>,
        dust_value: Decimal,
    ) -> Result<Decimal, ExchangeError> {
        let mut equity = Decimal::ZERO;
        for h in self.holdings.values() {
            if h.currency == quote {
                equity += h.total();
                continue;
            }
            let symbol = format!("{}-{}", quote, h.currency);
            match prices.get(&symbol) {
                Some(price) => equity += h.value_at(*price),
                None if h.value_at(h.avg_cost) < dust_value => equity += h.value_at(h.avg_cost),
                None => {
                    return Err(ExchangeError::DataUnavailable(format!(
                        "no price for {}, equity unknown",
                        symbol
                    )))
                }
            }
        }
        Ok(equity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot() -> AccountSnapshot {
        AccountSnapshot::new([
            Holding::new("KRW", dec!(100000), Decimal::ZERO),
            Holding::new("BTC", dec!(0.01), dec!(50000000)),
            Holding::new("ETH", dec!(0), dec!(3000000)),
        ])
    }

    #[test]
    fn test_available() {
        let account = snapshot();
        assert_eq!(account.available("KRW"), dec!(100000));
        assert_eq!(account.available("XRP"), Decimal::ZERO);
    }

    #[test]
    fn test_holding_ignores_empty_balance() {
        let account = snapshot();
        assert!(account.holding(&Instrument::new("KRW", "BTC")).is_some());
        assert!(account.holding(&Instrument::new("KRW", "ETH")).is_none());
    }

    #[test]
    fn test_total_equity_values_at_prices() {
        let account = snapshot();
        let mut prices = HashMap::new();
        prices.insert("KRW-BTC".to_string(), dec!(60000000));
        // 100000 + 0.01 * 60000000
        assert_eq!(
            account.total_equity("KRW", &prices, dec!(5000)).unwrap(),
            dec!(700000)
        );
    }

    #[test]
    fn test_total_equity_unavailable_without_price() {
        let account = snapshot();
        let err = account
            .total_equity("KRW", &HashMap::new(), dec!(5000))
            .unwrap_err();
        assert!(matches!(err, ExchangeError::DataUnavailable(m) if m.contains("KRW-BTC")));
    }

    #[test]
    fn test_total_equity_counts_unpriced_dust_at_cost() {
        let account = AccountSnapshot::new([
            Holding::new("KRW", dec!(100000), Decimal::ZERO),
            Holding::new("XRP", dec!(2), dec!(700)),
            Holding::new("AIR", dec!(1000), Decimal::ZERO),
        ]);
        assert_eq!(
            account.total_equity("KRW", &HashMap::new(), dec!(5000)).unwrap(),
            dec!(101400)
        );
    }

    #[test]
    fn test_locked_counts_toward_total() {
        let mut h = Holding::new("BTC", dec!(0.5), dec!(10));
        h.locked = dec!(0.5);
        assert_eq!(h.total(), dec!(1));
        assert_eq!(h.value_at(dec!(20)), dec!(20));
    }
}

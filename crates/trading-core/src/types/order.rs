//! Order types and structures.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::instrument::Instrument;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Size of a market order.
///
/// Market buys are sized by how much quote currency to spend; market
/// sells by how many units of the base currency to give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OrderAmount {
    /// Quote-currency amount to spend
    Notional(Decimal),
    /// Base-currency units to sell
    Quantity(Decimal),
}

impl OrderAmount {
    /// The raw amount regardless of unit.
    pub fn value(&self) -> Decimal {
        match self {
            OrderAmount::Notional(v) | OrderAmount::Quantity(v) => *v,
        }
    }
}

impl std::fmt::Display for OrderAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderAmount::Notional(v) => write!(f, "notional {}", v),
            OrderAmount::Quantity(v) => write!(f, "qty {}", v),
        }
    }
}

/// A market order the engine wants placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub instrument: Instrument,
    pub side: Side,
    pub amount: OrderAmount,
}

impl OrderIntent {
    /// Market buy spending `notional` quote currency.
    pub fn buy(instrument: Instrument, notional: Decimal) -> Self {
        Self {
            instrument,
            side: Side::Buy,
            amount: OrderAmount::Notional(notional),
        }
    }

    /// Market sell of `quantity` base units.
    pub fn sell(instrument: Instrument, quantity: Decimal) -> Self {
        Self {
            instrument,
            side: Side::Sell,
            amount: OrderAmount::Quantity(quantity),
        }
    }
}

/// Exchange acknowledgement of an accepted order.
///
/// Acceptance is not a fill; account state is re-read from the exchange
/// rather than derived from the acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAck {
    /// Exchange-assigned order id
    pub id: String,
    pub instrument: Instrument,
    pub side: Side,
    pub amount: OrderAmount,
    pub accepted_at: DateTime<Utc>,
}

impl OrderAck {
    /// Acknowledge `intent` under the given exchange id.
    pub fn accepted(id: impl Into<String>, intent: OrderIntent) -> Self {
        Self {
            id: id.into(),
            instrument: intent.instrument,
            side: intent.side,
            amount: intent.amount,
            accepted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_intent_constructors() {
        let btc = Instrument::new("KRW", "BTC");
        let buy = OrderIntent::buy(btc.clone(), dec!(50000));
        assert_eq!(buy.side, Side::Buy);
        assert_eq!(buy.amount, OrderAmount::Notional(dec!(50000)));

        let sell = OrderIntent::sell(btc, dec!(0.001));
        assert_eq!(sell.side, Side::Sell);
        assert_eq!(sell.amount.value(), dec!(0.001));
    }

    #[test]
    fn test_ack_copies_intent() {
        let intent = OrderIntent::sell(Instrument::new("KRW", "ETH"), dec!(1.5));
        let ack = OrderAck::accepted("abc-123", intent.clone());
        assert_eq!(ack.id, "abc-123");
        assert_eq!(ack.instrument, intent.instrument);
        assert_eq!(ack.amount, intent.amount);
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.to_string(), "SELL");
    }
}

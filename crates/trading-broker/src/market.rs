//! In-memory market data source.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use trading_core::error::ExchangeError;
use trading_core::traits::MarketData;
use trading_core::types::{Bar, CandleInterval, Instrument};

#[derive(Default)]
struct Tables {
    candles: HashMap<(String, CandleInterval), Vec<Bar>>,
    prices: HashMap<String, Decimal>,
    unavailable: HashSet<String>,
}

/// Market data served from tables the caller fills in.
///
/// Backs the paper exchange in tests and dry runs. Setters take `&self`
/// so the market can be updated while shared.
#[derive(Default)]
pub struct StaticMarket {
    tables: Mutex<Tables>,
}

impl StaticMarket {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the candle history (oldest first) for one instrument and
    /// interval.
    pub fn set_candles(&self, instrument: &Instrument, interval: CandleInterval, bars: Vec<Bar>) {
        self.tables()
            .candles
            .insert((instrument.symbol().to_string(), interval), bars);
    }

    /// Append one candle to an existing history.
    pub fn push_candle(&self, instrument: &Instrument, interval: CandleInterval, bar: Bar) {
        self.tables()
            .candles
            .entry((instrument.symbol().to_string(), interval))
            .or_default()
            .push(bar);
    }

    pub fn set_price(&self, instrument: &Instrument, price: Decimal) {
        self.tables()
            .prices
            .insert(instrument.symbol().to_string(), price);
    }

    /// Forget the price so the exchange reports none.
    pub fn clear_price(&self, instrument: &Instrument) {
        self.tables().prices.remove(instrument.symbol());
    }

    /// Make every request for `instrument` fail until restored.
    pub fn set_unavailable(&self, instrument: &Instrument, unavailable: bool) {
        let mut tables = self.tables();
        if unavailable {
            tables.unavailable.insert(instrument.symbol().to_string());
        } else {
            tables.unavailable.remove(instrument.symbol());
        }
    }

    fn check(&self, instrument: &Instrument) -> Result<(), ExchangeError> {
        if self.tables().unavailable.contains(instrument.symbol()) {
            return Err(ExchangeError::DataUnavailable(format!(
                "{} unavailable",
                instrument
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketData for StaticMarket {
    async fn candles(
        &self,
        instrument: &Instrument,
        interval: CandleInterval,
        count: usize,
    ) -> Result<Vec<Bar>, ExchangeError> {
        self.check(instrument)?;
        let tables = self.tables();
        let bars = tables
            .candles
            .get(&(instrument.symbol().to_string(), interval))
            .filter(|bars| !bars.is_empty())
            .ok_or_else(|| {
                ExchangeError::DataUnavailable(format!("no {} candles for {}", interval, instrument))
            })?;
        let start = bars.len().saturating_sub(count);
        Ok(bars[start..].to_vec())
    }

    async fn current_price(&self, instrument: &Instrument) -> Result<Option<Decimal>, ExchangeError> {
        self.check(instrument)?;
        Ok(self.tables().prices.get(instrument.symbol()).copied())
    }
}

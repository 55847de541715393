//! Market identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ExchangeError;

/// A tradeable market in `QUOTE-BASE` form, e.g. `KRW-BTC`.
///
/// The quote currency is what orders are paid in; the base currency is
/// what is bought.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Instrument {
    symbol: String,
    split: usize,
}

impl Instrument {
    /// Build an instrument from its quote and base currencies.
    pub fn new(quote: &str, base: &str) -> Self {
        let quote = quote.to_uppercase();
        let base = base.to_uppercase();
        Self {
            split: quote.len(),
            symbol: format!("{}-{}", quote, base),
        }
    }

    /// The full market symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Currency orders are denominated in.
    pub fn quote(&self) -> &str {
        &self.symbol[..self.split]
    }

    /// Currency being traded.
    pub fn base(&self) -> &str {
        &self.symbol[self.split + 1..]
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

impl FromStr for Instrument {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (quote, base) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| ExchangeError::InvalidInstrument(s.to_string()))?;
        let valid = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid(quote) || !valid(base) {
            return Err(ExchangeError::InvalidInstrument(s.to_string()));
        }
        Ok(Self::new(quote, base))
    }
}

impl TryFrom<String> for Instrument {
    type Error = ExchangeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Instrument> for String {
    fn from(value: Instrument) -> Self {
        value.symbol
    }
}

//! Order sizing for entries and averaging buys.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Sizing parameters, all fractions in `[0, 1]` except `min_order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// Share of the available quote balance spent on the first tranche
    pub entry_fraction: Decimal,
    /// Held back from each buy so the exchange fee still fits
    pub fee_buffer: Decimal,
    /// Second tranche notional as a multiple of the first tranche's cost
    pub average_ratio: Decimal,
    /// Cap on the second tranche as a share of the available balance
    pub average_cap: Decimal,
    /// Smallest order the exchange accepts, in quote currency
    pub min_order: Decimal,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            entry_fraction: dec!(0.3),
            fee_buffer: dec!(0.0005),
            average_ratio: dec!(1),
            average_cap: dec!(0.95),
            min_order: dec!(5000),
        }
    }
}

impl SizingConfig {
    pub fn validate(&self) -> Result<(), String> {
        let unit = Decimal::ZERO..=Decimal::ONE;
        if !(self.entry_fraction > Decimal::ZERO && self.entry_fraction <= Decimal::ONE) {
            return Err(format!("entry_fraction {} must be in (0, 1]", self.entry_fraction));
        }
        if !unit.contains(&self.fee_buffer) {
            return Err(format!("fee_buffer {} must be in [0, 1]", self.fee_buffer));
        }
        if !unit.contains(&self.average_cap) {
            return Err(format!("average_cap {} must be in [0, 1]", self.average_cap));
        }
        if self.average_ratio < Decimal::ZERO {
            return Err("average_ratio must not be negative".into());
        }
        if self.min_order < Decimal::ZERO {
            return Err("min_order must not be negative".into());
        }
        Ok(())
    }
}

/// Computes buy notionals from the available balance.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    config: SizingConfig,
}

impl PositionSizer {
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SizingConfig {
        &self.config
    }

    /// Whether the balance clears the minimum order floor at all.
    pub fn can_buy(&self, available: Decimal) -> bool {
        available > self.config.min_order
    }

    /// Notional of the first tranche, `None` if it would fall under the
    /// exchange minimum.
    pub fn entry_notional(&self, available: Decimal) -> Option<Decimal> {
        if !self.can_buy(available) {
            return None;
        }
        let notional =
            available * self.config.entry_fraction * (Decimal::ONE - self.config.fee_buffer);
        self.above_floor(notional)
    }

    /// Notional of the averaging tranche: roughly the cost of what is
    /// already held, capped by the available balance.
    pub fn average_notional(
        &self,
        held_quantity: Decimal,
        avg_cost: Decimal,
        available: Decimal,
    ) -> Option<Decimal> {
        if !self.can_buy(available) {
            return None;
        }
        let wanted = held_quantity * avg_cost * self.config.average_ratio;
        let cap = available * self.config.average_cap;
        let notional = wanted.min(cap) * (Decimal::ONE - self.config.fee_buffer);
        self.above_floor(notional)
    }

    /// Whether a holding is too small to sell on the venue.
    pub fn is_dust(&self, quantity: Decimal, price: Decimal) -> bool {
        quantity * price < self.config.min_order
    }

    fn above_floor(&self, notional: Decimal) -> Option<Decimal> {
        (notional >= self.config.min_order && notional > Decimal::ZERO).then_some(notional)
    }
}

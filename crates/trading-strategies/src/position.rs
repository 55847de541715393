//! Per-instrument position state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle stage of one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStage {
    /// Flat and free to enter
    #[default]
    Idle,
    /// First tranche bought
    Entered,
    /// Second tranche bought at a worse price
    Averaged,
    /// Flat and barred from entering until the next session
    ExitedToday,
}

impl PositionStage {
    /// Holding a position.
    pub fn is_open(&self) -> bool {
        matches!(self, PositionStage::Entered | PositionStage::Averaged)
    }
}

impl fmt::Display for PositionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PositionStage::Idle => "idle",
            PositionStage::Entered => "entered",
            PositionStage::Averaged => "averaged",
            PositionStage::ExitedToday => "exited_today",
        };
        f.write_str(s)
    }
}

/// What reconciling with exchange balances changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Unchanged,
    /// A holding appeared while idle and was adopted
    Adopted,
    /// The position disappeared from the account
    Closed,
}

/// Stage plus cost basis for one instrument.
///
/// The average cost follows the exchange whenever a balance read-back
/// provides one; the locally computed value only bridges the gap until
/// then.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    stage: PositionStage,
    avg_cost: Option<Decimal>,
    entry_price: Option<Decimal>,
}

impl PositionState {
    pub fn idle() -> Self {
        Self::default()
    }

    /// A position adopted from an existing exchange holding.
    pub fn adopted(avg_cost: Decimal) -> Self {
        Self {
            stage: PositionStage::Entered,
            avg_cost: Some(avg_cost).filter(|c| *c > Decimal::ZERO),
            entry_price: Some(avg_cost).filter(|c| *c > Decimal::ZERO),
        }
    }

    pub fn stage(&self) -> PositionStage {
        self.stage
    }

    pub fn avg_cost(&self) -> Option<Decimal> {
        self.avg_cost
    }

    /// Price at which the first tranche was bought.
    pub fn entry_price(&self) -> Option<Decimal> {
        self.entry_price
    }

    pub fn is_open(&self) -> bool {
        self.stage.is_open()
    }

    /// First tranche acknowledged at `price`.
    pub fn on_entry_filled(&mut self, price: Decimal) {
        self.stage = PositionStage::Entered;
        self.avg_cost = Some(price);
        self.entry_price = Some(price);
    }

    /// Second tranche of `notional` acknowledged at `price` on top of
    /// `held_quantity`. The average is the balance-weighted mean of both
    /// tranches until the exchange reports its own.
    pub fn on_average_filled(&mut self, held_quantity: Decimal, price: Decimal, notional: Decimal) {
        self.stage = PositionStage::Averaged;
        if price <= Decimal::ZERO {
            return;
        }
        let added = notional / price;
        self.avg_cost = match self.avg_cost {
            Some(avg) if held_quantity + added > Decimal::ZERO => {
                Some((held_quantity * avg + notional) / (held_quantity + added))
            }
            _ => Some(price),
        };
    }

    /// Full exit acknowledged.
    pub fn on_exit(&mut self, lock_for_session: bool) {
        self.stage = if lock_for_session {
            PositionStage::ExitedToday
        } else {
            PositionStage::Idle
        };
        self.avg_cost = None;
        self.entry_price = None;
    }

    /// Reconcile with the exchange: `held` is the holding's average cost
    /// when a sellable balance exists, `None` when flat or dust.
    pub fn sync_with_exchange(&mut self, held: Option<Decimal>) -> SyncOutcome {
        match (self.stage, held) {
            (PositionStage::Entered | PositionStage::Averaged, Some(cost)) => {
                if cost > Decimal::ZERO {
                    self.avg_cost = Some(cost);
                }
                SyncOutcome::Unchanged
            }
            (PositionStage::Entered | PositionStage::Averaged, None) => {
                self.on_exit(false);
                SyncOutcome::Closed
            }
            (PositionStage::Idle, Some(cost)) => {
                *self = Self::adopted(cost);
                SyncOutcome::Adopted
            }
            (PositionStage::Idle | PositionStage::ExitedToday, _) => SyncOutcome::Unchanged,
        }
    }

    /// State carried into the next session: the day lock is lifted, open
    /// positions are kept.
    pub fn next_session(&self) -> Self {
        match self.stage {
            PositionStage::ExitedToday => Self::idle(),
            _ => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_entry_then_average() {
        let mut state = PositionState::idle();
        state.on_entry_filled(dec!(100));
        assert_eq!(state.stage(), PositionStage::Entered);
        assert_eq!(state.avg_cost(), Some(dec!(100)));

        // 10 held at 100, buy 900 worth at 90 => 20 units for 1900
        state.on_average_filled(dec!(10), dec!(90), dec!(900));
        assert_eq!(state.stage(), PositionStage::Averaged);
        assert_eq!(state.avg_cost(), Some(dec!(95)));
        assert_eq!(state.entry_price(), Some(dec!(100)));
    }

    #[test]
    fn test_exit_locks() {
        let mut state = PositionState::idle();
        state.on_entry_filled(dec!(100));
        state.on_exit(true);
        assert_eq!(state.stage(), PositionStage::ExitedToday);
        assert_eq!(state.avg_cost(), None);

        let mut state = PositionState::adopted(dec!(50));
        state.on_exit(false);
        assert_eq!(state.stage(), PositionStage::Idle);
    }

    #[test]
    fn test_exchange_cost_wins() {
        let mut state = PositionState::idle();
        state.on_entry_filled(dec!(100));
        assert_eq!(state.sync_with_exchange(Some(dec!(100.3))), SyncOutcome::Unchanged);
        assert_eq!(state.avg_cost(), Some(dec!(100.3)));
    }

    #[test]
    fn test_sync_adopt_and_close() {
        let mut state = PositionState::idle();
        assert_eq!(state.sync_with_exchange(Some(dec!(42))), SyncOutcome::Adopted);
        assert_eq!(state.stage(), PositionStage::Entered);

        assert_eq!(state.sync_with_exchange(None), SyncOutcome::Closed);
        assert_eq!(state.stage(), PositionStage::Idle);
    }

    #[test]
    fn test_sync_respects_day_lock() {
        let mut state = PositionState::idle();
        state.on_entry_filled(dec!(10));
        state.on_exit(true);
        assert_eq!(state.sync_with_exchange(Some(dec!(10))), SyncOutcome::Unchanged);
        assert_eq!(state.stage(), PositionStage::ExitedToday);
    }

    #[test]
    fn test_next_session() {
        let mut locked = PositionState::idle();
        locked.on_exit(true);
        assert_eq!(locked.next_session().stage(), PositionStage::Idle);

        let mut open = PositionState::idle();
        open.on_entry_filled(dec!(7));
        assert_eq!(open.next_session(), open);
    }
}

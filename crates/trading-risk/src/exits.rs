//! Net-of-fee profit rate and exit thresholds.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Exchange fee for one buy plus one sell, as a fraction.
pub const DEFAULT_ROUND_TRIP_FEE: Decimal = dec!(0.0011);

/// `price / avg_cost - 1 - round_trip_fee`, or `None` without a cost basis.
pub fn net_profit_rate(price: Decimal, avg_cost: Decimal, round_trip_fee: Decimal) -> Option<Decimal> {
    if avg_cost <= Decimal::ZERO {
        return None;
    }
    Some(price / avg_cost - Decimal::ONE - round_trip_fee)
}

/// How the take-profit target of a position is chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TakeProfitRule {
    /// Fixed fractions per stage
    Fixed { entered: Decimal, averaged: Decimal },
    /// The volatility-scaled target from the indicator snapshot
    Dynamic,
    /// The governor's active daily portfolio target
    DailyTarget,
}

impl Default for TakeProfitRule {
    fn default() -> Self {
        TakeProfitRule::Fixed {
            entered: dec!(0.015),
            averaged: dec!(0.015),
        }
    }
}

/// Targets the rule may pick from on this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetInputs {
    pub dynamic: Decimal,
    pub daily: Decimal,
}

impl TakeProfitRule {
    pub fn target(&self, averaged: bool, inputs: TargetInputs) -> Decimal {
        match self {
            TakeProfitRule::Fixed { entered, averaged: second } => {
                if averaged {
                    *second
                } else {
                    *entered
                }
            }
            TakeProfitRule::Dynamic => inputs.dynamic,
            TakeProfitRule::DailyTarget => inputs.daily,
        }
    }

    /// Reached once the net rate meets the target.
    pub fn is_hit(&self, rate: Decimal, averaged: bool, inputs: TargetInputs) -> bool {
        rate >= self.target(averaged, inputs)
    }
}

/// Stop-loss thresholds per stage, as negative fractions. `None` disables
/// the stop for that stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopLossRule {
    pub entered: Option<Decimal>,
    pub averaged: Option<Decimal>,
}

impl StopLossRule {
    pub fn threshold(&self, averaged: bool) -> Option<Decimal> {
        if averaged {
            self.averaged
        } else {
            self.entered
        }
    }

    /// Strictly below the threshold. A rate sitting exactly on it holds.
    pub fn is_hit(&self, rate: Decimal, averaged: bool) -> bool {
        self.threshold(averaged).is_some_and(|stop| rate < stop)
    }

    pub fn validate(&self) -> Result<(), String> {
        for stop in [self.entered, self.averaged].into_iter().flatten() {
            if stop >= Decimal::ZERO {
                return Err(format!("stop-loss threshold {} must be negative", stop));
            }
        }
        Ok(())
    }
}

//! Per-instrument decision rules.
//!
//! [`PositionMachine::decide`] is pure: it looks at the snapshot, the
//! position and the balances and names one [`Action`]. The caller submits
//! the order and calls [`PositionMachine::apply`] only once the exchange
//! has acknowledged it, so a rejected order never moves the state.

use rust_decimal::Decimal;
use std::fmt;
use trading_indicators::IndicatorSnapshot;
use trading_risk::{net_profit_rate, PositionSizer, TargetInputs};

use crate::config::{EntrySignal, SignalCombine, StrategyConfig};
use crate::position::{PositionStage, PositionState};

/// Why a position is being closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    TakeProfit,
    Overbought,
    StopLoss,
    /// Session boundary liquidation
    DailyReset,
    /// Portfolio daily target met
    TargetReached,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::TakeProfit => "take_profit",
            ExitReason::Overbought => "overbought",
            ExitReason::StopLoss => "stop_loss",
            ExitReason::DailyReset => "daily_reset",
            ExitReason::TargetReached => "target_reached",
        };
        f.write_str(s)
    }
}

/// What to do with one instrument this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Hold,
    /// Buy the first tranche
    Enter { notional: Decimal },
    /// Buy the second tranche
    Average { notional: Decimal },
    /// Sell the whole holding
    Exit { quantity: Decimal, reason: ExitReason },
}

/// Inputs for one decision.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    pub snapshot: &'a IndicatorSnapshot,
    pub position: &'a PositionState,
    /// Sellable base-currency balance; zero when flat or dust
    pub held_quantity: Decimal,
    /// Free quote-currency balance from this tick's account snapshot
    pub available_quote: Decimal,
    /// Governor permits new entries
    pub entries_allowed: bool,
    /// Governor's active daily target
    pub daily_target: Decimal,
}

/// The state machine shared by every preset.
#[derive(Debug, Clone)]
pub struct PositionMachine {
    config: StrategyConfig,
    sizer: PositionSizer,
}

impl PositionMachine {
    pub fn new(config: StrategyConfig) -> Self {
        let sizer = PositionSizer::new(config.sizing.clone());
        Self { config, sizer }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn sizer(&self) -> &PositionSizer {
        &self.sizer
    }

    pub fn decide(&self, ctx: &DecisionContext<'_>) -> Action {
        match ctx.position.stage() {
            PositionStage::Entered | PositionStage::Averaged => self.decide_open(ctx),
            PositionStage::Idle => self.decide_entry(ctx),
            PositionStage::ExitedToday => Action::Hold,
        }
    }

    /// Net-of-fee profit rate of the position at the snapshot price.
    pub fn profit_rate(&self, ctx: &DecisionContext<'_>) -> Option<Decimal> {
        let avg = ctx.position.avg_cost()?;
        net_profit_rate(ctx.snapshot.current_price, avg, self.config.round_trip_fee)
    }

    fn decide_open(&self, ctx: &DecisionContext<'_>) -> Action {
        if ctx.held_quantity <= Decimal::ZERO {
            return Action::Hold;
        }
        let Some(avg) = ctx.position.avg_cost() else {
            return Action::Hold;
        };
        let Some(rate) = self.profit_rate(ctx) else {
            return Action::Hold;
        };
        let averaged = ctx.position.stage() == PositionStage::Averaged;
        let exit = |reason| Action::Exit {
            quantity: ctx.held_quantity,
            reason,
        };

        let inputs = TargetInputs {
            dynamic: ctx.snapshot.dynamic_target(),
            daily: ctx.daily_target,
        };
        if self.config.take_profit.is_hit(rate, averaged, inputs) {
            return exit(ExitReason::TakeProfit);
        }

        if let (Some(level), Some(rsi)) = (self.config.overbought_exit, ctx.snapshot.rsi) {
            if rsi >= level {
                return exit(ExitReason::Overbought);
            }
        }

        if self.config.stop_loss.is_hit(rate, averaged) {
            return exit(ExitReason::StopLoss);
        }

        if averaged || !ctx.entries_allowed {
            return Action::Hold;
        }
        let Some(rule) = &self.config.averaging else {
            return Action::Hold;
        };
        let retraced = ctx.snapshot.current_price <= avg * (Decimal::ONE - rule.retrace);
        let oversold = ctx.snapshot.rsi.is_some_and(|rsi| rsi <= rule.rsi_max);
        if !(retraced && oversold) {
            return Action::Hold;
        }
        match self
            .sizer
            .average_notional(ctx.held_quantity, avg, ctx.available_quote)
        {
            Some(notional) => Action::Average { notional },
            None => Action::Hold,
        }
    }

    fn decide_entry(&self, ctx: &DecisionContext<'_>) -> Action {
        if !ctx.entries_allowed || !self.sizer.can_buy(ctx.available_quote) {
            return Action::Hold;
        }
        if !self.entry_signal(ctx.snapshot) || !self.trend_permits(ctx.snapshot) {
            return Action::Hold;
        }
        match self.sizer.entry_notional(ctx.available_quote) {
            Some(notional) => Action::Enter { notional },
            None => Action::Hold,
        }
    }

    /// Whether the configured entry condition holds. Unavailable inputs
    /// never count as a signal.
    pub fn entry_signal(&self, snapshot: &IndicatorSnapshot) -> bool {
        let price = snapshot.price();
        match &self.config.entry {
            EntrySignal::Oversold { rsi_max, combine } => {
                let Some(rsi) = snapshot.rsi else {
                    return false;
                };
                let rsi_low = rsi <= *rsi_max;
                let near_band = price <= snapshot.lower_band_safety;
                match combine {
                    SignalCombine::Any => rsi_low || near_band,
                    SignalCombine::All => rsi_low && near_band,
                }
            }
            EntrySignal::Breakout { .. } => snapshot
                .breakout
                .is_some_and(|level| level.triggered(price)),
        }
    }

    /// Falling-market filter: no entry while price is under the trend
    /// average, or while the average is unknown.
    pub fn trend_permits(&self, snapshot: &IndicatorSnapshot) -> bool {
        if self.config.trend_filter.is_none() {
            return true;
        }
        snapshot
            .trend_ma
            .is_some_and(|ma| snapshot.price() >= ma)
    }

    /// Whether an exit for `reason` bars re-entry until the next session.
    pub fn locks_after(&self, reason: ExitReason) -> bool {
        match reason {
            ExitReason::TakeProfit | ExitReason::Overbought => {
                self.config.reentry.lock_after_take_profit
            }
            ExitReason::StopLoss => self.config.reentry.lock_after_stop_loss,
            ExitReason::DailyReset | ExitReason::TargetReached => false,
        }
    }

    /// Advance `state` after the exchange accepted the order for `action`.
    pub fn apply(
        &self,
        state: &mut PositionState,
        action: &Action,
        price: Decimal,
        held_quantity: Decimal,
    ) {
        match *action {
            Action::Hold => {}
            Action::Enter { .. } => state.on_entry_filled(price),
            Action::Average { notional } => {
                state.on_average_filled(held_quantity, price, notional)
            }
            Action::Exit { reason, .. } => state.on_exit(self.locks_after(reason)),
        }
    }
}

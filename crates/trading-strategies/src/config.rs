//! Strategy configuration: one parameter set drives the shared state machine.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use trading_core::error::StrategyError;
use trading_core::types::CandleInterval;
use trading_indicators::IndicatorConfig;
use trading_risk::{GovernorConfig, SizingConfig, StopLossRule, TakeProfitRule, DEFAULT_ROUND_TRIP_FEE};

use crate::regime::RegimeConfig;

/// How the RSI and band conditions of an oversold entry combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCombine {
    /// Either condition is enough
    #[default]
    Any,
    /// Both must hold
    All,
}

/// Entry trigger for an idle instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntrySignal {
    /// RSI at or under `rsi_max` and/or price at or under the lower-band
    /// safety level
    Oversold {
        rsi_max: f64,
        #[serde(default)]
        combine: SignalCombine,
    },
    /// Price above today's open plus `k` times yesterday's range and above
    /// the `ma_window`-day average
    Breakout { k: f64, ma_window: usize },
}

impl Default for EntrySignal {
    fn default() -> Self {
        EntrySignal::Oversold {
            rsi_max: 30.0,
            combine: SignalCombine::Any,
        }
    }
}

/// Second-tranche ("averaging down") rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AveragingConfig {
    /// Fractional drop below the average cost required, e.g. 0.03
    pub retrace: Decimal,
    /// Looser RSI ceiling that must re-confirm the oversold condition
    pub rsi_max: f64,
}

impl Default for AveragingConfig {
    fn default() -> Self {
        Self {
            retrace: dec!(0.03),
            rsi_max: 40.0,
        }
    }
}

/// Higher-timeframe filter that blocks entries in a falling market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendFilter {
    pub interval: CandleInterval,
    pub window: usize,
}

impl Default for TrendFilter {
    fn default() -> Self {
        Self {
            interval: CandleInterval::Minute60,
            window: 20,
        }
    }
}

/// Which exits bar the instrument from re-entry until the next session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReentryPolicy {
    pub lock_after_take_profit: bool,
    pub lock_after_stop_loss: bool,
}

impl Default for ReentryPolicy {
    fn default() -> Self {
        Self {
            lock_after_take_profit: true,
            lock_after_stop_loss: false,
        }
    }
}

/// Full strategy parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub name: String,
    pub indicators: IndicatorConfig,
    pub entry: EntrySignal,
    pub averaging: Option<AveragingConfig>,
    pub take_profit: TakeProfitRule,
    pub stop_loss: StopLossRule,
    /// Close the position once RSI reaches this level
    pub overbought_exit: Option<f64>,
    pub trend_filter: Option<TrendFilter>,
    pub sizing: SizingConfig,
    pub round_trip_fee: Decimal,
    pub reentry: ReentryPolicy,
    pub governor: GovernorConfig,
    pub regime: RegimeConfig,
    /// Sell every open position at the daily reset
    pub liquidate_on_reset: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            name: "custom".to_string(),
            indicators: IndicatorConfig::default(),
            entry: EntrySignal::default(),
            averaging: None,
            take_profit: TakeProfitRule::default(),
            stop_loss: StopLossRule {
                entered: Some(dec!(-0.02)),
                averaged: Some(dec!(-0.02)),
            },
            overbought_exit: None,
            trend_filter: None,
            sizing: SizingConfig::default(),
            round_trip_fee: DEFAULT_ROUND_TRIP_FEE,
            reentry: ReentryPolicy::default(),
            governor: GovernorConfig::default(),
            regime: RegimeConfig::default(),
            liquidate_on_reset: false,
        }
    }
}

fn invalid(msg: impl Into<String>) -> StrategyError {
    StrategyError::InvalidConfig(msg.into())
}

fn check_rsi(level: f64, what: &str) -> Result<(), StrategyError> {
    if !(0.0..=100.0).contains(&level) {
        return Err(invalid(format!("{} {} must be between 0 and 100", what, level)));
    }
    Ok(())
}

impl StrategyConfig {
    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), StrategyError> {
        self.indicators
            .validate()
            .map_err(|e| invalid(e.to_string()))?;
        self.sizing.validate().map_err(invalid)?;
        self.stop_loss.validate().map_err(invalid)?;
        self.governor.validate().map_err(invalid)?;

        match &self.entry {
            EntrySignal::Oversold { rsi_max, .. } => check_rsi(*rsi_max, "entry rsi_max")?,
            EntrySignal::Breakout { k, ma_window } => {
                if !(*k >= 0.0) {
                    return Err(invalid("breakout k must not be negative"));
                }
                if *ma_window == 0 {
                    return Err(invalid("breakout ma_window must be > 0"));
                }
            }
        }

        if let Some(avg) = &self.averaging {
            check_rsi(avg.rsi_max, "averaging rsi_max")?;
            if avg.retrace <= Decimal::ZERO || avg.retrace >= Decimal::ONE {
                return Err(invalid("averaging retrace must be in (0, 1)"));
            }
        }

        if let Some(level) = self.overbought_exit {
            check_rsi(level, "overbought_exit")?;
        }

        if let Some(filter) = &self.trend_filter {
            if filter.window == 0 {
                return Err(invalid("trend filter window must be > 0"));
            }
        }

        if let TakeProfitRule::Fixed { entered, averaged } = &self.take_profit {
            if *entered <= Decimal::ZERO || *averaged <= Decimal::ZERO {
                return Err(invalid("take-profit targets must be positive"));
            }
        }

        if self.round_trip_fee < Decimal::ZERO || self.round_trip_fee >= Decimal::ONE {
            return Err(invalid("round_trip_fee must be in [0, 1)"));
        }
        if self.regime.window == 0 {
            return Err(invalid("regime window must be > 0"));
        }
        Ok(())
    }
}

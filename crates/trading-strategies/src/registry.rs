//! Strategy registry: named presets of the shared state machine.

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use trading_core::error::StrategyError;
use trading_indicators::IndicatorConfig;
use trading_risk::{GovernorConfig, SizingConfig, StopLossRule, TakeProfitRule};

use crate::config::{
    AveragingConfig, EntrySignal, ReentryPolicy, SignalCombine, StrategyConfig, TrendFilter,
};

/// Information about a registered preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyInfo {
    /// Preset key
    pub name: String,
    /// Strategy description
    pub description: String,
    /// Full parameter set
    pub config: StrategyConfig,
}

impl StrategyInfo {
    /// Parameters as JSON, for display and for merging overrides.
    pub fn default_config(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or(serde_json::Value::Null)
    }
}

/// Registry of the built-in presets.
pub struct StrategyRegistry {
    strategies: HashMap<String, StrategyInfo>,
}

fn scalper() -> StrategyConfig {
    StrategyConfig {
        name: "scalper".into(),
        indicators: IndicatorConfig {
            band_margin: 0.01,
            ..Default::default()
        },
        entry: EntrySignal::Oversold {
            rsi_max: 35.0,
            combine: SignalCombine::All,
        },
        take_profit: TakeProfitRule::Fixed {
            entered: dec!(0.015),
            averaged: dec!(0.015),
        },
        overbought_exit: Some(65.0),
        stop_loss: StopLossRule {
            entered: Some(dec!(-0.015)),
            averaged: Some(dec!(-0.015)),
        },
        reentry: ReentryPolicy {
            lock_after_take_profit: false,
            lock_after_stop_loss: false,
        },
        ..Default::default()
    }
}

fn dca() -> StrategyConfig {
    StrategyConfig {
        name: "dca".into(),
        entry: EntrySignal::Oversold {
            rsi_max: 35.0,
            combine: SignalCombine::Any,
        },
        trend_filter: Some(TrendFilter::default()),
        averaging: Some(AveragingConfig {
            retrace: dec!(0.03),
            rsi_max: 40.0,
        }),
        take_profit: TakeProfitRule::Dynamic,
        stop_loss: StopLossRule {
            entered: None,
            averaged: Some(dec!(-0.05)),
        },
        sizing: SizingConfig {
            entry_fraction: dec!(0.2),
            min_order: dec!(10000),
            ..Default::default()
        },
        reentry: ReentryPolicy {
            lock_after_take_profit: false,
            lock_after_stop_loss: false,
        },
        ..Default::default()
    }
}

fn survivor() -> StrategyConfig {
    StrategyConfig {
        name: "survivor".into(),
        indicators: IndicatorConfig {
            band_margin: 0.0,
            ..Default::default()
        },
        entry: EntrySignal::Oversold {
            rsi_max: 30.0,
            combine: SignalCombine::Any,
        },
        take_profit: TakeProfitRule::DailyTarget,
        stop_loss: StopLossRule {
            entered: Some(dec!(-0.037)),
            averaged: Some(dec!(-0.037)),
        },
        sizing: SizingConfig {
            entry_fraction: dec!(0.2),
            ..Default::default()
        },
        governor: GovernorConfig {
            enabled: true,
            target_up: dec!(0.015),
            target_down: dec!(0.007),
        },
        reentry: ReentryPolicy::default(),
        liquidate_on_reset: true,
        ..Default::default()
    }
}

fn breakout() -> StrategyConfig {
    StrategyConfig {
        name: "breakout".into(),
        entry: EntrySignal::Breakout { k: 0.5, ma_window: 2 },
        take_profit: TakeProfitRule::Fixed {
            entered: dec!(0.015),
            averaged: dec!(0.015),
        },
        stop_loss: StopLossRule {
            entered: Some(dec!(-0.02)),
            averaged: Some(dec!(-0.02)),
        },
        reentry: ReentryPolicy {
            lock_after_take_profit: true,
            lock_after_stop_loss: true,
        },
        liquidate_on_reset: true,
        ..Default::default()
    }
}

/// Overlay `patch` onto `base`, recursing into objects.
fn merge(base: &mut serde_json::Value, patch: serde_json::Value) {
    match (base, patch) {
        (serde_json::Value::Object(base), serde_json::Value::Object(patch)) => {
            for (key, value) in patch {
                merge(base.entry(key).or_insert(serde_json::Value::Null), value);
            }
        }
        (slot, value) => *slot = value,
    }
}

impl StrategyRegistry {
    /// Create a new strategy registry with all built-in presets.
    pub fn new() -> Self {
        let mut strategies = HashMap::new();
        let mut add = |config: StrategyConfig, description: &str| {
            strategies.insert(
                config.name.clone(),
                StrategyInfo {
                    name: config.name.clone(),
                    description: description.to_string(),
                    config,
                },
            );
        };

        add(
            scalper(),
            "RSI and lower-band scalping with a fixed 1.5% target and overbought exit",
        );
        add(
            dca(),
            "Oversold entry behind a falling-market filter, one averaging tranche, volatility-scaled target",
        );
        add(
            survivor(),
            "Regime-scaled daily portfolio target with strict per-position stop and liquidation at reset",
        );
        add(
            breakout(),
            "Daily volatility breakout, one trade per instrument per session",
        );

        Self { strategies }
    }

    /// List all presets, sorted by name.
    pub fn list(&self) -> Vec<&StrategyInfo> {
        let mut list: Vec<_> = self.strategies.values().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    /// Get preset info by name.
    pub fn get(&self, name: &str) -> Option<&StrategyInfo> {
        self.strategies.get(name)
    }

    /// Check if a preset exists.
    pub fn exists(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Preset names, sorted.
    pub fn names(&self) -> Vec<&String> {
        let mut names: Vec<_> = self.strategies.keys().collect();
        names.sort();
        names
    }

    /// Build a validated configuration from a preset and optional
    /// overrides given as a partial JSON object.
    pub fn create(
        &self,
        name: &str,
        overrides: Option<serde_json::Value>,
    ) -> Result<StrategyConfig, StrategyError> {
        let info = self
            .get(name)
            .ok_or_else(|| StrategyError::NotFound(name.to_string()))?;

        let config = match overrides {
            None => info.config.clone(),
            Some(patch) => {
                let mut value = info.default_config();
                merge(&mut value, patch);
                serde_json::from_value(value)
                    .map_err(|e| StrategyError::InvalidConfig(e.to_string()))?
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Create a preset with its default configuration.
    pub fn create_default(&self, name: &str) -> Result<StrategyConfig, StrategyError> {
        self.create(name, None)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

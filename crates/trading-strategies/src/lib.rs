//! Decision core of the position engine.
//!
//! - [`StrategyConfig`]: one parameter set per strategy
//! - [`RegimeClassifier`]: Up vs Down/Sideways from a reference market
//! - [`PositionState`] and [`PositionMachine`]: per-instrument stages and
//!   the entry, averaging and exit rules
//! - [`StrategyRegistry`]: the built-in presets

mod config;
mod machine;
mod position;
mod regime;
mod registry;

pub use config::{
    AveragingConfig, EntrySignal, ReentryPolicy, SignalCombine, StrategyConfig, TrendFilter,
};
pub use machine::{Action, DecisionContext, ExitReason, PositionMachine};
pub use position::{PositionStage, PositionState, SyncOutcome};
pub use regime::{RegimeClassifier, RegimeConfig};
pub use registry::{StrategyInfo, StrategyRegistry};

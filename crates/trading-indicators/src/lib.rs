//! Technical indicators for the position engine.
//!
//! - Momentum: RSI with bias-adjusted exponential smoothing
//! - Moving averages: SMA
//! - Volatility: Bollinger Bands and the volatility-scaled profit target
//! - Breakout: daily volatility breakout level
//!
//! [`IndicatorEngine`] bundles them into one [`IndicatorSnapshot`] per
//! instrument per tick.

pub mod breakout;
pub mod momentum;
pub mod moving_average;
pub mod snapshot;
pub mod volatility;

pub use breakout::{BreakoutLevel, BreakoutOutput};
pub use momentum::Rsi;
pub use moving_average::Sma;
pub use snapshot::{trend_average, IndicatorConfig, IndicatorEngine, IndicatorSnapshot};
pub use volatility::{BollingerBands, BollingerOutput, DynamicTarget};

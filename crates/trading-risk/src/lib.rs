//! Risk controls for the position engine.
//!
//! Provides the daily profit governor, session boundaries, order sizing
//! and the net-of-fee exit thresholds.

mod exits;
mod governor;
mod session;
mod sizing;

pub use exits::{net_profit_rate, StopLossRule, TakeProfitRule, TargetInputs, DEFAULT_ROUND_TRIP_FEE};
pub use governor::{GovernorConfig, GovernorVerdict, PortfolioState, RiskGovernor};
pub use session::DailyBoundary;
pub use sizing::{PositionSizer, SizingConfig};

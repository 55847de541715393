//! Market regime labels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad market state derived from a reference instrument's daily trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    /// Reference price above its daily moving average
    Up,
    /// Anything else, including the case where the trend is unknown
    #[default]
    DownOrSideways,
}

impl MarketRegime {
    pub fn is_up(&self) -> bool {
        matches!(self, MarketRegime::Up)
    }
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketRegime::Up => write!(f, "UP"),
            MarketRegime::DownOrSideways => write!(f, "DOWN/SIDEWAYS"),
        }
    }
}

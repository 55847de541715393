//! Candle interval definitions for market data.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Candle width supported by the exchange candle endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CandleInterval {
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "3m")]
    Minute3,
    /// 5 minute candles, the default trading interval
    #[serde(rename = "5m")]
    #[default]
    Minute5,
    #[serde(rename = "10m")]
    Minute10,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "30m")]
    Minute30,
    #[serde(rename = "60m")]
    Minute60,
    #[serde(rename = "240m")]
    Minute240,
    #[serde(rename = "1d")]
    Day,
    #[serde(rename = "1w")]
    Week,
    #[serde(rename = "1M")]
    Month,
}

impl CandleInterval {
    /// Minute unit for intraday intervals, `None` for day and longer.
    pub fn minutes(&self) -> Option<u32> {
        match self {
            CandleInterval::Minute1 => Some(1),
            CandleInterval::Minute3 => Some(3),
            CandleInterval::Minute5 => Some(5),
            CandleInterval::Minute10 => Some(10),
            CandleInterval::Minute15 => Some(15),
            CandleInterval::Minute30 => Some(30),
            CandleInterval::Minute60 => Some(60),
            CandleInterval::Minute240 => Some(240),
            CandleInterval::Day | CandleInterval::Week | CandleInterval::Month => None,
        }
    }

    /// Approximate width in seconds.
    pub fn as_secs(&self) -> u64 {
        match self {
            CandleInterval::Day => 86_400,
            CandleInterval::Week => 604_800,
            CandleInterval::Month => 2_592_000, // 30 days
            other => u64::from(other.minutes().unwrap_or(1)) * 60,
        }
    }

    /// Check if this is an intraday interval.
    pub fn is_intraday(&self) -> bool {
        self.minutes().is_some()
    }

    /// Path segment for the candle endpoint, e.g. `minutes/5` or `days`.
    pub fn endpoint(&self) -> String {
        match self {
            CandleInterval::Day => "days".to_string(),
            CandleInterval::Week => "weeks".to_string(),
            CandleInterval::Month => "months".to_string(),
            other => format!("minutes/{}", other.minutes().unwrap_or(1)),
        }
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandleInterval::Day => write!(f, "1d"),
            CandleInterval::Week => write!(f, "1w"),
            CandleInterval::Month => write!(f, "1M"),
            other => write!(f, "{}m", other.minutes().unwrap_or(1)),
        }
    }
}

impl FromStr for CandleInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "1M" {
            return Ok(CandleInterval::Month);
        }
        match s.to_lowercase().as_str() {
            "1m" | "minute1" => Ok(CandleInterval::Minute1),
            "3m" | "minute3" => Ok(CandleInterval::Minute3),
            "5m" | "minute5" => Ok(CandleInterval::Minute5),
            "10m" | "minute10" => Ok(CandleInterval::Minute10),
            "15m" | "minute15" => Ok(CandleInterval::Minute15),
            "30m" | "minute30" => Ok(CandleInterval::Minute30),
            "60m" | "1h" | "minute60" => Ok(CandleInterval::Minute60),
            "240m" | "4h" | "minute240" => Ok(CandleInterval::Minute240),
            "1d" | "day" | "daily" => Ok(CandleInterval::Day),
            "1w" | "week" | "weekly" => Ok(CandleInterval::Week),
            "month" | "monthly" => Ok(CandleInterval::Month),
            _ => Err(format!("Invalid candle interval: {}", s)),
        }
    }
}

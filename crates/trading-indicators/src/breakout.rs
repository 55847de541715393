//! Volatility breakout level on daily candles.

use serde::{Deserialize, Serialize};
use trading_core::traits::Indicator;
use trading_core::types::Bar;

use crate::moving_average::Sma;

/// Breakout trigger and short daily average for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakoutOutput {
    /// Today's open plus `k` times yesterday's range
    pub target: f64,
    /// Mean of the most recent daily closes, today included
    pub moving_average: f64,
}

impl BreakoutOutput {
    /// Price broke out above the target while above the short average.
    pub fn triggered(&self, price: f64) -> bool {
        price > self.target && price > self.moving_average
    }
}

/// Volatility breakout: buy once price clears today's open by a fraction
/// of yesterday's high-low range.
#[derive(Debug, Clone)]
pub struct BreakoutLevel {
    k: f64,
    ma: Sma,
}

impl BreakoutLevel {
    pub fn new(k: f64, ma_window: usize) -> Self {
        assert!(k >= 0.0, "k must not be negative");
        Self {
            k,
            ma: Sma::new(ma_window.max(1)),
        }
    }

    /// Daily candles needed, oldest first with today last.
    pub fn required_days(&self) -> usize {
        self.ma.period().max(2)
    }

    /// Level from daily candles, `None` when history is too short.
    pub fn calculate(&self, daily: &[Bar]) -> Option<BreakoutOutput> {
        if daily.len() < self.required_days() {
            return None;
        }
        let today = daily[daily.len() - 1];
        let yesterday = daily[daily.len() - 2];
        let closes: Vec<f64> = daily.iter().map(|b| b.close).collect();

        Some(BreakoutOutput {
            target: today.open + yesterday.range() * self.k,
            moving_average: self.ma.latest(&closes)?,
        })
    }
}

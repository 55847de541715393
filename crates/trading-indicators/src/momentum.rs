//! Momentum indicators.

use trading_core::traits::Indicator;

/// Relative Strength Index (RSI).
///
/// Up and down moves are smoothed with a bias-adjusted exponential mean
/// (alpha = 1/period), the weighting pandas uses for
/// `ewm(com = period - 1, adjust = True)`. A value is produced once
/// `period` deltas are available; it is `None` while the series has never
/// moved.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    /// Create a new RSI indicator.
    ///
    /// Common periods are 14 (default) or 9.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    /// Relative strength to RSI. No down moves saturates at 100; no moves
    /// at all is undefined.
    fn from_averages(up: f64, down: f64) -> Option<f64> {
        match (up > 0.0, down > 0.0) {
            (false, false) => None,
            (true, false) => Some(100.0),
            _ => Some(100.0 - 100.0 / (1.0 + up / down)),
        }
    }
}

impl Default for Rsi {
    fn default() -> Self {
        Self::new(14)
    }
}

/// Running bias-adjusted exponential mean.
///
/// `mean = sum(w_i * x_i) / sum(w_i)` with `w_i = (1 - alpha)^i`, newest
/// observation at `i = 0`. Numerator and denominator decay together so the
/// whole history is folded in one pass.
#[derive(Debug, Clone, Copy)]
struct AdjustedEwm {
    decay: f64,
    num: f64,
    den: f64,
}

impl AdjustedEwm {
    fn new(alpha: f64) -> Self {
        Self {
            decay: 1.0 - alpha,
            num: 0.0,
            den: 0.0,
        }
    }

    fn push(&mut self, x: f64) -> f64 {
        self.num = self.num * self.decay + x;
        self.den = self.den * self.decay + 1.0;
        self.num / self.den
    }
}

impl Indicator for Rsi {
    type Output = Option<f64>;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        if data.len() <= self.period {
            return vec![];
        }

        let alpha = 1.0 / self.period as f64;
        let mut up = AdjustedEwm::new(alpha);
        let mut down = AdjustedEwm::new(alpha);
        let mut result = Vec::with_capacity(data.len() - self.period);

        for (i, pair) in data.windows(2).enumerate() {
            let change = pair[1] - pair[0];
            let avg_up = up.push(change.max(0.0));
            let avg_down = down.push((-change).max(0.0));

            // i + 1 deltas seen so far
            if i + 1 >= self.period {
                result.push(Self::from_averages(avg_up, avg_down));
            }
        }

        result
    }

    fn period(&self) -> usize {
        self.period + 1 // Need period+1 data points
    }
}

//! Indicators over a close-price series, oldest first.

use crate::error::IndicatorError;

/// A single-valued indicator such as a moving average or RSI.
///
/// `calculate` yields one value per full window; the last element belongs
/// to the last input.
pub trait Indicator: Send + Sync {
    type Output;

    fn calculate(&self, data: &[f64]) -> Vec<Self::Output>;

    /// Inputs needed before the first value.
    fn period(&self) -> usize;

    /// Value at the newest input, `None` on short history.
    fn latest(&self, data: &[f64]) -> Option<Self::Output> {
        self.calculate(data).pop()
    }
}

/// An indicator that produces several lines per input, e.g. a band set.
pub trait MultiOutputIndicator: Send + Sync {
    type Outputs;

    fn calculate(&self, data: &[f64]) -> Vec<Self::Outputs>;

    /// Inputs needed before the first value.
    fn period(&self) -> usize;

    fn latest(&self, data: &[f64]) -> Option<Self::Outputs> {
        self.calculate(data).pop()
    }

    /// Like [`latest`](Self::latest), but a short history is an error.
    fn require_latest(&self, data: &[f64]) -> Result<Self::Outputs, IndicatorError> {
        self.latest(data).ok_or(IndicatorError::InsufficientData {
            required: self.period(),
            available: data.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Rolling window sum.
    struct WindowSum(usize);

    impl Indicator for WindowSum {
        type Output = f64;

        fn calculate(&self, data: &[f64]) -> Vec<f64> {
            data.windows(self.0).map(|w| w.iter().sum()).collect()
        }

        fn period(&self) -> usize {
            self.0
        }
    }

    /// Rolling window minimum and maximum.
    struct Range(usize);

    impl MultiOutputIndicator for Range {
        type Outputs = (f64, f64);

        fn calculate(&self, data: &[f64]) -> Vec<(f64, f64)> {
            data.windows(self.0)
                .map(|w| {
                    let lo = w.iter().copied().fold(f64::INFINITY, f64::min);
                    let hi = w.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    (lo, hi)
                })
                .collect()
        }

        fn period(&self) -> usize {
            self.0
        }
    }

    #[test]
    fn test_latest_is_last_window() {
        let indicator = WindowSum(3);
        assert_eq!(indicator.latest(&[1.0, 2.0, 3.0, 4.0, 5.0]), Some(12.0));
        assert_eq!(indicator.latest(&[1.0, 2.0]), None);
    }

    #[test]
    fn test_require_latest_reports_shortfall() {
        let range = Range(4);
        assert_eq!(range.require_latest(&[3.0, 1.0, 4.0, 1.0, 5.0]), Ok((1.0, 5.0)));
        assert_eq!(
            range.require_latest(&[3.0, 1.0]),
            Err(IndicatorError::InsufficientData {
                required: 4,
                available: 2,
            })
        );
    }
}

//! Property tests for indicator invariants.
//!
//! 1. RSI stays inside [0, 100] for any finite price path
//! 2. RSI saturates at 100 when no delta is negative, and is undefined
//!    when no delta is non-zero
//! 3. The dynamic target never leaves [floor, cap]
//! 4. Bands are ordered and collapse on constant input

use proptest::prelude::*;
use trading_core::traits::{Indicator, MultiOutputIndicator};
use trading_indicators::{BollingerBands, DynamicTarget, Rsi};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_prices() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..1_000_000.0_f64, 15..200)
}

fn arb_non_negative_steps() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0..50.0_f64, 14..100)
}

// ── 1. RSI bounds ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_is_bounded(prices in arb_prices()) {
        let rsi = Rsi::new(14);
        for value in rsi.calculate(&prices).into_iter().flatten() {
            prop_assert!((0.0..=100.0).contains(&value), "rsi {} out of range", value);
        }
    }

    #[test]
    fn rsi_saturates_without_losses(start in 1.0..10_000.0_f64, mut steps in arb_non_negative_steps()) {
        steps[0] += 1.0; // at least one positive delta
        let mut prices = vec![start];
        for step in steps {
            let last = prices[prices.len() - 1];
            prices.push(last + step);
        }
        prop_assert_eq!(Rsi::new(14).latest(&prices), Some(Some(100.0)));
    }

    #[test]
    fn rsi_undefined_on_flat_series(price in 1.0..1_000_000.0_f64, len in 15..100usize) {
        let prices = vec![price; len];
        prop_assert!(Rsi::new(14).calculate(&prices).iter().all(Option::is_none));
    }
}

// ── 2. Dynamic target clamp ──────────────────────────────────────────

proptest! {
    #[test]
    fn dynamic_target_is_clamped(bandwidth in prop::num::f64::ANY) {
        let target = DynamicTarget::default();
        let pct = target.target_pct(bandwidth);
        prop_assert!((1.2..=3.5).contains(&pct), "target {} for bandwidth {}", pct, bandwidth);
    }

    #[test]
    fn bands_are_ordered(prices in arb_prices()) {
        let bb = BollingerBands::new();
        if let Some(out) = bb.latest(&prices) {
            prop_assert!(out.lower <= out.middle);
            prop_assert!(out.middle <= out.upper);
        }
    }

    #[test]
    fn constant_window_collapses(price in 1.0..1_000_000.0_f64) {
        let bb = BollingerBands::new();
        let out = bb.latest(&[price; 20]).unwrap();
        prop_assert!((out.upper - out.lower).abs() <= price * 1e-12);
        prop_assert_eq!(DynamicTarget::default().target_pct(out.bandwidth_pct().max(0.0)), 1.2);
    }
}

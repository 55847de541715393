//! Property tests for profit-rate and session invariants.

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use trading_risk::{net_profit_rate, DailyBoundary, StopLossRule, DEFAULT_ROUND_TRIP_FEE};

fn arb_cost() -> impl Strategy<Value = Decimal> {
    (1u64..100_000_000u64).prop_map(Decimal::from)
}

fn arb_stop() -> impl Strategy<Value = Decimal> {
    (1i64..200i64).prop_map(|bp| Decimal::new(-bp, 3))
}

proptest! {
    /// Price placed exactly on stop + fee holds; one unit lower stops out.
    #[test]
    fn stop_threshold_is_net_of_fee(cost in arb_cost(), stop in arb_stop()) {
        let rule = StopLossRule { entered: Some(stop), averaged: Some(stop) };
        let exact = cost * (Decimal::ONE + stop + DEFAULT_ROUND_TRIP_FEE);
        let tick = Decimal::new(1, 8);

        let on = net_profit_rate(exact, cost, DEFAULT_ROUND_TRIP_FEE).unwrap();
        prop_assert!(!rule.is_hit(on, false));

        let below = net_profit_rate(exact - tick, cost, DEFAULT_ROUND_TRIP_FEE).unwrap();
        prop_assert!(rule.is_hit(below, true));
    }

    /// The fee always pulls the rate under the raw price ratio.
    #[test]
    fn fee_is_subtracted(cost in arb_cost(), price in arb_cost()) {
        let rate = net_profit_rate(price, cost, DEFAULT_ROUND_TRIP_FEE).unwrap();
        prop_assert_eq!(rate, price / cost - Decimal::ONE - DEFAULT_ROUND_TRIP_FEE);
    }

    /// Within one session every instant maps to the same session date, and
    /// a reset is due at most once.
    #[test]
    fn reset_is_due_once(start in 0i64..4_000_000_000i64, offsets in prop::collection::vec(0i64..86_400, 1..50)) {
        let boundary = DailyBoundary::default();
        let t0 = DateTime::<Utc>::from_timestamp(start, 0).unwrap();
        let mut last = boundary.session_date(t0);
        let mut resets = 0;

        let mut sorted = offsets.clone();
        sorted.sort_unstable();
        for secs in sorted {
            let now = t0 + Duration::seconds(secs);
            if boundary.is_due(now, last) {
                resets += 1;
                last = boundary.session_date(now);
            }
        }
        // less than a day elapsed, so at most one boundary was crossed
        prop_assert!(resets <= 1);
    }
}

use alloy::primitives::U256;
use futarchy_arb_bot::{
    pricing::{MAX_SQRT_RATIO, MIN_SQRT_RATIO, price_limit},
    types::Direction,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn sqrt_price() -> impl Strategy<Value = U256> {
    (any::<u128>(), 0usize..=40).prop_map(|(raw, shift)| {
        let value = U256::from(raw) << shift;
        value.clamp(MIN_SQRT_RATIO, MAX_SQRT_RATIO)
    })
}

fn tolerance() -> impl Strategy<Value = Decimal> {
    (0i64..9_999).prop_map(|bps| Decimal::new(bps, 4))
}

proptest! {
    #[test]
    fn decreasing_limit_stays_below_current(current in sqrt_price(), tol in tolerance()) {
        let limit = price_limit(current, Direction::Decreasing, tol).unwrap();
        prop_assert!(limit <= current);
        prop_assert!(limit >= MIN_SQRT_RATIO);
    }

    #[test]
    fn increasing_limit_stays_above_current(current in sqrt_price(), tol in tolerance()) {
        let limit = price_limit(current, Direction::Increasing, tol).unwrap();
        prop_assert!(limit >= current);
        prop_assert!(limit <= MAX_SQRT_RATIO);
    }

    #[test]
    fn wider_tolerance_never_tightens(current in sqrt_price(), a in tolerance(), b in tolerance()) {
        let (narrow, wide) = if a <= b { (a, b) } else { (b, a) };
        let down_narrow = price_limit(current, Direction::Decreasing, narrow).unwrap();
        let down_wide = price_limit(current, Direction::Decreasing, wide).unwrap();
        prop_assert!(down_wide <= down_narrow);

        let up_narrow = price_limit(current, Direction::Increasing, narrow).unwrap();
        let up_wide = price_limit(current, Direction::Increasing, wide).unwrap();
        prop_assert!(up_wide >= up_narrow);
    }

    #[test]
    fn out_of_bounds_price_is_rejected(below in 0u64..4_295_128_739u64, tol in tolerance()) {
        prop_assert!(price_limit(U256::from(below), Direction::Decreasing, tol).is_err());
        prop_assert!(price_limit(MAX_SQRT_RATIO + U256::from(below) + U256::from(1), Direction::Increasing, tol).is_err());
    }
}

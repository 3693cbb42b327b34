//! Worst-acceptable sqrt price for a concentrated-liquidity swap
//!
//! The passthrough router has no minimum-output argument, so the limit handed
//! to the pool is the only on-chain slippage guard.

use alloy::primitives::U256;
use rust_decimal::Decimal;
use crate::{
    config::DEFAULT_PRICE_TOLERANCE,
    errors::SwapError,
    types::Direction,
    utils::mul_decimal,
};

/// Smallest sqrt ratio a v3 pool accepts (tick -887272).
pub const MIN_SQRT_RATIO: U256 = U256::from_limbs([4295128739, 0, 0, 0]);

/// Largest sqrt ratio a v3 pool accepts (tick 887272):
/// 1461446703485210103287273052203988822378723970342.
pub const MAX_SQRT_RATIO: U256 = U256::from_limbs([
    0x5d951d5263988d26,
    0xefd1fc6a50648849,
    0xfffd8963,
    0,
]);

pub fn price_limit(current_sqrt_price: U256, direction: Direction, tolerance: Decimal) -> Result<U256, SwapError> {
    if tolerance < Decimal::ZERO || tolerance >= Decimal::ONE {
        return Err(SwapError::InvalidAmount {
            reason: format!("price tolerance {} outside [0, 1)", tolerance),
        });
    }
    if current_sqrt_price < MIN_SQRT_RATIO || current_sqrt_price > MAX_SQRT_RATIO {
        return Err(SwapError::InvalidAmount {
            reason: format!("sqrt price {} outside protocol bounds", current_sqrt_price),
        });
    }

    let limit = match direction {
        Direction::Decreasing => mul_decimal(current_sqrt_price, Decimal::ONE - tolerance).max(MIN_SQRT_RATIO),
        Direction::Increasing => mul_decimal(current_sqrt_price, Decimal::ONE + tolerance).min(MAX_SQRT_RATIO),
    };
    Ok(limit)
}

pub fn default_price_limit(current_sqrt_price: U256, direction: Direction) -> Result<U256, SwapError> {
    price_limit(current_sqrt_price, direction, DEFAULT_PRICE_TOLERANCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn q96() -> U256 {
        U256::from(1) << 96usize
    }

    #[test]
    fn max_ratio_matches_protocol_constant() {
        let expected = U256::from_str_radix("1461446703485210103287273052203988822378723970342", 10).unwrap();
        assert_eq!(MAX_SQRT_RATIO, expected);
    }

    #[test]
    fn unit_price_decreasing_five_percent() {
        let limit = price_limit(q96(), Direction::Decreasing, dec!(0.05)).unwrap();
        assert_eq!(limit, q96() * U256::from(95) / U256::from(100));
        assert!(limit > MIN_SQRT_RATIO);
    }

    #[test]
    fn unit_price_increasing_five_percent() {
        let limit = default_price_limit(q96(), Direction::Increasing).unwrap();
        assert_eq!(limit, q96() * U256::from(105) / U256::from(100));
    }

    #[test]
    fn clamps_to_protocol_bounds() {
        let near_min = MIN_SQRT_RATIO + U256::from(10);
        assert_eq!(price_limit(near_min, Direction::Decreasing, dec!(0.5)).unwrap(), MIN_SQRT_RATIO);

        let near_max = MAX_SQRT_RATIO - U256::from(10);
        assert_eq!(price_limit(near_max, Direction::Increasing, dec!(0.5)).unwrap(), MAX_SQRT_RATIO);
    }

    #[test]
    fn zero_tolerance_is_identity() {
        assert_eq!(price_limit(q96(), Direction::Decreasing, Decimal::ZERO).unwrap(), q96());
        assert_eq!(price_limit(q96(), Direction::Increasing, Decimal::ZERO).unwrap(), q96());
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(price_limit(q96(), Direction::Decreasing, dec!(1)).is_err());
        assert!(price_limit(q96(), Direction::Decreasing, dec!(-0.01)).is_err());
        assert!(price_limit(U256::ZERO, Direction::Increasing, dec!(0.05)).is_err());
        assert!(price_limit(MAX_SQRT_RATIO + U256::from(1), Direction::Decreasing, dec!(0.05)).is_err());
    }
}

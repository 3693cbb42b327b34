//! Fixed-point helpers between on-chain integers and decimals

use alloy::primitives::U256;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use crate::errors::SwapError;

/// `10^n`, or `None` when it falls outside what a `Decimal` can hold.
pub fn pow10(n: i32) -> Option<Decimal> {
    match n {
        0 => Some(dec!(1)),
        6 => Some(dec!(1_000_000)),
        18 => Some(dec!(1_000_000_000_000_000_000)),
        _ => {
            let mut result = dec!(1);
            for _ in 0..n.unsigned_abs() {
                result = if n > 0 {
                    result.checked_mul(dec!(10))?
                } else {
                    result.checked_div(dec!(10))?
                };
            }
            if result.is_zero() { None } else { Some(result) }
        }
    }
}

fn pow10_u256(n: u32) -> U256 {
    U256::from(10u64).pow(U256::from(n))
}

/// Converts a raw token amount to whole units. Saturates at `Decimal::MAX`.
pub fn to_units(amount: U256, decimals: u8) -> Decimal {
    let scale = u32::from(decimals);
    if scale <= 28 {
        let exact = i128::try_from(amount)
            .ok()
            .and_then(|raw| Decimal::try_from_i128_with_scale(raw, scale).ok());
        if let Some(value) = exact {
            return value.normalize();
        }
    }

    // Too many digits for a 96-bit mantissa: keep 18 fractional digits.
    let divisor = pow10_u256(scale);
    let whole = match u64::try_from(amount / divisor) {
        Ok(whole) => Decimal::from(whole),
        Err(_) => return Decimal::MAX,
    };
    let frac_digits = scale.min(18);
    let frac = (amount % divisor) / pow10_u256(scale - frac_digits);
    let frac = i128::try_from(frac)
        .ok()
        .and_then(|f| Decimal::try_from_i128_with_scale(f, frac_digits).ok())
        .unwrap_or_default();
    (whole + frac).normalize()
}

/// Converts whole units to a raw token amount, truncating beyond `decimals`.
pub fn from_units(amount: Decimal, decimals: u8) -> Result<U256, SwapError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(SwapError::InvalidAmount {
            reason: format!("negative amount {}", amount),
        });
    }
    let mantissa = U256::from(amount.mantissa().unsigned_abs());
    let scale = amount.scale();
    let decimals = u32::from(decimals);
    let raw = if decimals >= scale {
        mantissa
            .checked_mul(pow10_u256(decimals - scale))
            .ok_or_else(|| SwapError::InvalidAmount {
                reason: format!("amount {} overflows 256 bits", amount),
            })?
    } else {
        mantissa / pow10_u256(scale - decimals)
    };
    Ok(raw)
}

/// `amount * factor`, rounding down; `factor` must be non-negative.
pub fn mul_decimal(amount: U256, factor: Decimal) -> U256 {
    if factor.is_sign_negative() {
        return U256::ZERO;
    }
    let mantissa = U256::from(factor.mantissa().unsigned_abs());
    let scale = pow10_u256(factor.scale());
    match amount.checked_mul(mantissa) {
        Some(product) => product / scale,
        None => (amount / scale).saturating_mul(mantissa),
    }
}

/// Lower bound after slippage: `amount * (1 - tolerance)`.
pub fn apply_slippage(amount: U256, tolerance: Decimal) -> U256 {
    mul_decimal(amount, (Decimal::ONE - tolerance).max(Decimal::ZERO))
}

/// Absolute difference together with which side is larger.
pub fn signed_diff(a: U256, b: U256) -> (U256, bool) {
    if a >= b { (a - b, true) } else { (b - a, false) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_conversions_are_exact_for_18_decimals() {
        let one_and_half = U256::from(1_500_000_000_000_000_000u128);
        assert_eq!(to_units(one_and_half, 18), dec!(1.5));
        assert_eq!(from_units(dec!(1.5), 18).unwrap(), one_and_half);
        assert_eq!(from_units(dec!(0.000001), 18).unwrap(), U256::from(1_000_000_000_000u64));
        assert_eq!(from_units(dec!(1.2345678), 6).unwrap(), U256::from(1_234_567u64));
        assert!(from_units(dec!(-1), 18).is_err());
    }

    #[test]
    fn huge_amounts_saturate_instead_of_panicking() {
        assert_eq!(to_units(U256::MAX, 18), Decimal::MAX);
    }

    #[test]
    fn slippage_rounds_down() {
        assert_eq!(apply_slippage(U256::from(1000), dec!(0.05)), U256::from(950));
        assert_eq!(apply_slippage(U256::from(999), dec!(0.05)), U256::from(949));
        assert_eq!(mul_decimal(U256::from(10), dec!(1.05)), U256::from(10));
        assert_eq!(mul_decimal(U256::from(100), dec!(1.05)), U256::from(105));
    }

    #[test]
    fn signed_diff_reports_larger_side() {
        assert_eq!(signed_diff(U256::from(10), U256::from(4)), (U256::from(6), true));
        assert_eq!(signed_diff(U256::from(4), U256::from(10)), (U256::from(6), false));
    }

    #[test]
    fn pow10_handles_negative_exponents() {
        assert_eq!(pow10(-2), Some(dec!(0.01)));
        assert_eq!(pow10(3), Some(dec!(1000)));
        assert_eq!(pow10(-28), Some(dec!(0.0000000000000000000000000001)));
    }

    #[test]
    fn pow10_out_of_range_is_none() {
        assert_eq!(pow10(29), None);
        assert_eq!(pow10(255), None);
        assert_eq!(pow10(-29), None);
    }
}

//! Passthrough router over Uniswap-V3-style pools
//!
//! The router forwards `swap` straight to the pool and returns the pool's
//! signed deltas. Positive deltas are paid in, negative ones paid out. There is
//! no minimum-out argument; the sqrt price limit is the only on-chain guard.

use alloy::{
    primitives::{Address, Bytes, I256, U160, U256},
    sol_types::SolCall,
};
use crate::{
    contracts::IPassthroughRouter,
    errors::SwapError,
    types::SwapAmount,
};

/// Encodes a router `swap`. Exact-out is a negative `amountSpecified`.
pub fn encode_swap(
    pool: Address,
    recipient: Address,
    zero_for_one: bool,
    amount: SwapAmount,
    price_limit: U256,
) -> Result<Bytes, SwapError> {
    let magnitude = I256::try_from(amount.value()).map_err(|_| SwapError::InvalidAmount {
        reason: format!("{} does not fit a signed amount", amount.value()),
    })?;
    let amount_specified = match amount {
        SwapAmount::ExactIn(_) => magnitude,
        SwapAmount::ExactOut(_) => -magnitude,
    };

    Ok(IPassthroughRouter::swapCall {
        pool,
        recipient,
        zeroForOne: zero_for_one,
        amountSpecified: amount_specified,
        sqrtPriceLimitX96: U160::saturating_from(price_limit),
        data: Bytes::new(),
    }
    .abi_encode()
    .into())
}

/// Maps pool deltas to `(amount_in, amount_out)` for the given direction.
/// Returns `None` when the signs do not describe a swap in that direction.
pub fn amounts_from_deltas(zero_for_one: bool, amount0: I256, amount1: I256) -> Option<(U256, U256)> {
    let (paid, received) = if zero_for_one { (amount0, amount1) } else { (amount1, amount0) };
    if paid.is_negative() || !received.is_negative() {
        return None;
    }
    Some((paid.unsigned_abs(), received.unsigned_abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed(v: i64) -> I256 {
        I256::try_from(v).unwrap()
    }

    #[test]
    fn deltas_follow_direction() {
        assert_eq!(
            amounts_from_deltas(true, signed(100), signed(-95)),
            Some((U256::from(100), U256::from(95)))
        );
        assert_eq!(
            amounts_from_deltas(false, signed(-40), signed(50)),
            Some((U256::from(50), U256::from(40)))
        );
    }

    #[test]
    fn wrong_signs_are_rejected() {
        assert_eq!(amounts_from_deltas(true, signed(-100), signed(95)), None);
        assert_eq!(amounts_from_deltas(true, signed(100), signed(0)), None);
    }

    #[test]
    fn exact_out_is_negative_amount_specified() {
        let data = encode_swap(
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            false,
            SwapAmount::ExactOut(U256::from(7)),
            U256::from(1u64) << 100usize,
        )
        .unwrap();

        let call = IPassthroughRouter::swapCall::abi_decode(&data, true).unwrap();
        assert_eq!(call.amountSpecified, signed(-7));
        assert!(!call.zeroForOne);
        assert_eq!(U256::from(call.sqrtPriceLimitX96), U256::from(1u64) << 100usize);
    }
}

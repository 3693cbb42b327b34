//! Algebra-style router (Swapr on Gnosis)

use alloy::{
    primitives::{Address, Bytes, U160, U256, aliases::U24},
    sol_types::SolCall,
};
use crate::{
    contracts::IAlgebraRouter,
    types::SwapIntent,
};

/// The router's exact-output path takes a fee tier even though pools set
/// their own dynamic fee.
pub const EXACT_OUT_FEE: u32 = 500;

pub fn encode_exact_in(
    intent: &SwapIntent,
    recipient: Address,
    amount_in: U256,
    minimum_out: U256,
    price_limit: U256,
    deadline: u64,
) -> Bytes {
    IAlgebraRouter::exactInputSingleCall {
        params: IAlgebraRouter::ExactInputSingleParams {
            tokenIn: intent.token_in.address,
            tokenOut: intent.token_out.address,
            recipient,
            deadline: U256::from(deadline),
            amountIn: amount_in,
            amountOutMinimum: minimum_out,
            limitSqrtPrice: U160::saturating_from(price_limit),
        },
    }
    .abi_encode()
    .into()
}

pub fn encode_exact_out(
    intent: &SwapIntent,
    recipient: Address,
    amount_out: U256,
    price_limit: U256,
    deadline: u64,
) -> Bytes {
    IAlgebraRouter::exactOutputSingleCall {
        params: IAlgebraRouter::ExactOutputSingleParams {
            tokenIn: intent.token_in.address,
            tokenOut: intent.token_out.address,
            fee: U24::from(EXACT_OUT_FEE),
            recipient,
            deadline: U256::from(deadline),
            amountOut: amount_out,
            amountInMaximum: U256::from(u128::MAX),
            limitSqrtPrice: U160::saturating_from(price_limit),
        },
    }
    .abi_encode()
    .into()
}

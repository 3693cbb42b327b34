//! Balancer V3 batch router over weighted pools
//!
//! Quotes come from the router's `query*` functions through a plain
//! `eth_call`. Swaps pull funds through Permit2.

use alloy::{
    primitives::{Address, Bytes, U256},
    sol_types::SolCall,
};
use crate::{
    contracts::IBatchRouter,
    errors::SwapError,
    types::SwapIntent,
};

fn steps(intent: &SwapIntent) -> Vec<IBatchRouter::SwapPathStep> {
    vec![IBatchRouter::SwapPathStep {
        pool: intent.pool.address,
        tokenOut: intent.token_out.address,
        isBuffer: false,
    }]
}

fn exact_in_path(intent: &SwapIntent, amount_in: U256, minimum_out: U256) -> IBatchRouter::SwapPathExactAmountIn {
    IBatchRouter::SwapPathExactAmountIn {
        tokenIn: intent.token_in.address,
        steps: steps(intent),
        exactAmountIn: amount_in,
        minAmountOut: minimum_out,
    }
}

pub fn encode_query_exact_in(intent: &SwapIntent, sender: Address, amount_in: U256) -> Bytes {
    IBatchRouter::querySwapExactInCall {
        paths: vec![exact_in_path(intent, amount_in, U256::ZERO)],
        sender,
        userData: Bytes::new(),
    }
    .abi_encode()
    .into()
}

pub fn encode_query_exact_out(intent: &SwapIntent, sender: Address, amount_out: U256) -> Bytes {
    IBatchRouter::querySwapExactOutCall {
        paths: vec![IBatchRouter::SwapPathExactAmountOut {
            tokenIn: intent.token_in.address,
            steps: steps(intent),
            maxAmountIn: U256::MAX,
            exactAmountOut: amount_out,
        }],
        sender,
        userData: Bytes::new(),
    }
    .abi_encode()
    .into()
}

pub fn encode_swap_exact_in(intent: &SwapIntent, amount_in: U256, minimum_out: U256, deadline: u64) -> Bytes {
    IBatchRouter::swapExactInCall {
        paths: vec![exact_in_path(intent, amount_in, minimum_out)],
        deadline: U256::from(deadline),
        wethIsEth: false,
        userData: Bytes::new(),
    }
    .abi_encode()
    .into()
}

fn first_amount(amounts: Vec<U256>) -> Result<U256, SwapError> {
    amounts.into_iter().next().ok_or_else(|| SwapError::QuoteFailure {
        message: "batch router returned no path amounts".to_string(),
    })
}

pub fn decode_query_exact_in(data: &[u8]) -> Result<U256, SwapError> {
    let ret = IBatchRouter::querySwapExactInCall::abi_decode_returns(data, true).map_err(|e| {
        SwapError::QuoteFailure {
            message: format!("undecodable querySwapExactIn output: {}", e),
        }
    })?;
    first_amount(ret.pathAmountsOut)
}

pub fn decode_query_exact_out(data: &[u8]) -> Result<U256, SwapError> {
    let ret = IBatchRouter::querySwapExactOutCall::abi_decode_returns(data, true).map_err(|e| {
        SwapError::QuoteFailure {
            message: format!("undecodable querySwapExactOut output: {}", e),
        }
    })?;
    first_amount(ret.pathAmountsIn)
}

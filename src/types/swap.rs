//! Swap intents, quotes and realized executions

use alloy::primitives::{TxHash, U256};
use serde::Serialize;
use super::{Pool, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Increasing,
    Decreasing,
}

impl Direction {
    pub fn for_swap(zero_for_one: bool) -> Self {
        if zero_for_one {
            Direction::Decreasing
        } else {
            Direction::Increasing
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SwapAmount {
    ExactIn(U256),
    ExactOut(U256),
}

impl SwapAmount {
    pub fn value(&self) -> U256 {
        match self {
            SwapAmount::ExactIn(v) | SwapAmount::ExactOut(v) => *v,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SwapIntent {
    pub token_in: Token,
    pub token_out: Token,
    pub amount: SwapAmount,
    pub pool: Pool,
}

impl SwapIntent {
    pub fn exact_in(token_in: &Token, token_out: &Token, amount_in: U256, pool: &Pool) -> Self {
        Self {
            token_in: token_in.clone(),
            token_out: token_out.clone(),
            amount: SwapAmount::ExactIn(amount_in),
            pool: pool.clone(),
        }
    }

    pub fn exact_out(token_in: &Token, token_out: &Token, amount_out: U256, pool: &Pool) -> Self {
        Self {
            token_in: token_in.clone(),
            token_out: token_out.clone(),
            amount: SwapAmount::ExactOut(amount_out),
            pool: pool.clone(),
        }
    }

    pub fn with_amount(&self, amount: SwapAmount) -> Self {
        Self {
            amount,
            ..self.clone()
        }
    }

    pub fn zero_for_one(&self) -> bool {
        self.pool.zero_for_one(self.token_in.address)
    }

    pub fn describe(&self) -> String {
        format!("{} → {} via {}", self.token_in.symbol, self.token_out.symbol, self.pool.symbol)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapQuote {
    pub amount_in: U256,
    pub amount_out: U256,
    /// Absent for venues without a sqrt-price (weighted pools).
    pub price_limit: Option<U256>,
    pub minimum_out: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confirmation {
    Receipt,
    /// Receipt wait expired but balances show the transaction landed.
    InferredFromBalances,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub tx_hash: TxHash,
    pub success: bool,
    pub realized_delta_in: U256,
    pub realized_delta_out: U256,
    pub confirmation: Confirmation,
}

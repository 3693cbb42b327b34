//! Bundle simulation requests and results

use alloy::primitives::{Address, Bytes, I256, U256};
use super::PreparedTx;

/// How a call's return data is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Router exact-in / exact-out: a single `uint256`.
    SingleUint,
    /// Raw pool swap: `(int256 amount0, int256 amount1)`.
    PoolSwapDeltas,
    /// Balancer batch exact-in: `(uint256[], address[], uint256[])`.
    BalancerExactIn,
    /// Approvals, split, merge.
    None,
}

#[derive(Debug, Clone)]
pub struct SimulationCall {
    pub tx: PreparedTx,
    pub decode: OutputKind,
}

impl SimulationCall {
    pub fn new(tx: PreparedTx, decode: OutputKind) -> Self {
        Self { tx, decode }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedOutput {
    Amount(U256),
    PoolDeltas { amount0: I256, amount1: I256 },
    BalancerAmounts {
        path_amounts_out: Vec<U256>,
        tokens_out: Vec<Address>,
        amounts_out: Vec<U256>,
    },
    /// Call has no meaningful return value.
    Empty,
    /// Output missing or not decodable for the expected shape.
    Unknown,
}

impl DecodedOutput {
    pub fn is_unknown(&self) -> bool {
        matches!(self, DecodedOutput::Unknown)
    }
}

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub label: String,
    pub reverted: bool,
    pub revert_reason: Option<String>,
    pub decoded_output: DecodedOutput,
    pub raw_output: Option<Bytes>,
    pub raw_trace: serde_json::Value,
    /// An earlier entry in the same bundle reverted, so this one ran on unexpected state.
    pub unreliable: bool,
}

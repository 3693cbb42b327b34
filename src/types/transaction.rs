//! Unsigned transactions and receipt outcomes

use alloy::primitives::{Address, Bytes, TxHash, U256};
use serde::Serialize;

/// An unsigned call, used both for bundle simulation and for broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedTx {
    pub label: String,
    pub from: Address,
    pub to: Address,
    pub input: Bytes,
    pub value: U256,
    pub gas: u64,
}

impl PreparedTx {
    pub fn new(label: impl Into<String>, from: Address, to: Address, input: impl Into<Bytes>, gas: u64) -> Self {
        Self {
            label: label.into(),
            from,
            to,
            input: input.into(),
            value: U256::ZERO,
            gas,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReceiptStatus {
    Success,
    Reverted,
    /// No receipt inside the wait window.
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TxOutcome {
    pub tx_hash: TxHash,
    pub status: ReceiptStatus,
}

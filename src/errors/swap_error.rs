//! Typed outcomes for swap, split/merge and wrap operations
//!
//! Insufficient balances and reverts are ordinary trading results, so every
//! component returns them as values and the orchestrator decides what to do.

use alloy::primitives::{Address, TxHash, U256};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use super::BotError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCategory {
    /// Balance, allowance or amount problems caught before any network call.
    LocalPrecondition,
    /// Simulator unreachable or the simulated call reverted.
    QuoteFailure,
    /// Mined but failed: gas spent, no asset movement.
    ExecutionRevert,
    /// No receipt inside the wait window and no balance movement observed.
    Timeout,
    /// RPC or signing failure underneath the operation.
    Infrastructure,
}

#[derive(Error, Debug)]
pub enum SwapError {
    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    #[error("Insufficient {symbol} balance: required {required}, available {available}")]
    InsufficientBalance {
        symbol: String,
        token: Address,
        required: U256,
        available: U256,
    },

    #[error("Insufficient {symbol} allowance for {spender}: required {required}, current {current}")]
    InsufficientAllowance {
        symbol: String,
        token: Address,
        spender: Address,
        required: U256,
        current: U256,
    },

    #[error("Quote reverted: {}", reason.as_deref().unwrap_or("no reason returned"))]
    QuoteRevert { reason: Option<String> },

    #[error("Quote failed: {message}")]
    QuoteFailure { message: String },

    #[error("Transaction {tx_hash} reverted on-chain")]
    ExecutionRevert { tx_hash: TxHash },

    #[error("Transaction {tx_hash} unconfirmed after {waited:?} and balances did not move")]
    Timeout { tx_hash: TxHash, waited: Duration },

    #[error("{venue} does not support {operation}")]
    Unsupported {
        venue: &'static str,
        operation: &'static str,
    },

    #[error(transparent)]
    Chain(#[from] BotError),
}

impl SwapError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SwapError::InvalidAmount { .. }
            | SwapError::InsufficientBalance { .. }
            | SwapError::InsufficientAllowance { .. }
            | SwapError::Unsupported { .. } => ErrorCategory::LocalPrecondition,
            SwapError::QuoteRevert { .. } | SwapError::QuoteFailure { .. } => {
                ErrorCategory::QuoteFailure
            }
            SwapError::ExecutionRevert { .. } => ErrorCategory::ExecutionRevert,
            SwapError::Timeout { .. } => ErrorCategory::Timeout,
            SwapError::Chain(_) => ErrorCategory::Infrastructure,
        }
    }

    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            SwapError::ExecutionRevert { tx_hash } | SwapError::Timeout { tx_hash, .. } => {
                Some(*tx_hash)
            }
            _ => None,
        }
    }
}

/// Rejects zero amounts before anything touches the network.
pub fn ensure_positive(amount: U256, what: &str) -> Result<(), SwapError> {
    if amount.is_zero() {
        return Err(SwapError::InvalidAmount {
            reason: format!("{} must be strictly positive", what),
        });
    }
    Ok(())
}

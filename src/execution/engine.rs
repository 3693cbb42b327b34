//! Transaction execution with balance-delta accounting
//!
//! Every mutating step is measured by re-reading balances around the
//! transaction. Receipts decide success or revert; when no receipt arrives in
//! time the balance movement decides whether the transaction landed.

use alloy::primitives::{Address, TxHash, U256};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{info, warn};
use crate::{
    errors::{BotResult, SwapError},
    network::{ChainAccess, submit_and_wait},
    types::{Confirmation, PreparedTx, ReceiptStatus, Token},
    utils::{from_units, to_units},
};

/// Reads `owner`'s balance of each token. Two- and three-token reads run
/// concurrently.
pub async fn read_balances(chain: &dyn ChainAccess, owner: Address, tokens: &[Address]) -> BotResult<Vec<U256>> {
    match tokens {
        [a, b] => {
            let (x, y) = tokio::try_join!(chain.balance_of(*a, owner), chain.balance_of(*b, owner))?;
            Ok(vec![x, y])
        }
        [a, b, c] => {
            let (x, y, z) = tokio::try_join!(
                chain.balance_of(*a, owner),
                chain.balance_of(*b, owner),
                chain.balance_of(*c, owner),
            )?;
            Ok(vec![x, y, z])
        }
        _ => {
            let mut balances = Vec::with_capacity(tokens.len());
            for token in tokens {
                balances.push(chain.balance_of(*token, owner).await?);
            }
            Ok(balances)
        }
    }
}

/// Outcome of a transaction measured against a set of tracked balances.
#[derive(Debug, Clone)]
pub struct TrackedExecution {
    pub tx_hash: TxHash,
    pub before: Vec<U256>,
    pub after: Vec<U256>,
    pub confirmation: Confirmation,
}

impl TrackedExecution {
    pub fn gained(&self, index: usize) -> U256 {
        self.after[index].saturating_sub(self.before[index])
    }

    pub fn spent(&self, index: usize) -> U256 {
        self.before[index].saturating_sub(self.after[index])
    }
}

/// Sends `tx`, waits for its receipt and measures the tracked balances.
///
/// A revert is `ExecutionRevert`. A missing receipt is resolved from balances:
/// any movement counts as landed, none is `Timeout`.
pub async fn execute_tracked(
    chain: &dyn ChainAccess,
    tx: &PreparedTx,
    tracked: &[Address],
    timeout: Duration,
) -> Result<TrackedExecution, SwapError> {
    let owner = chain.account();
    let before = read_balances(chain, owner, tracked).await?;
    let outcome = submit_and_wait(chain, tx, timeout).await?;

    if outcome.status == ReceiptStatus::Reverted {
        return Err(SwapError::ExecutionRevert { tx_hash: outcome.tx_hash });
    }

    let after = read_balances(chain, owner, tracked).await?;
    let confirmation = match outcome.status {
        ReceiptStatus::Pending if after == before => {
            return Err(SwapError::Timeout {
                tx_hash: outcome.tx_hash,
                waited: timeout,
            });
        }
        ReceiptStatus::Pending => {
            warn!("⏳ {} has no receipt but balances moved, treating as landed", tx.label);
            Confirmation::InferredFromBalances
        }
        _ => Confirmation::Receipt,
    };

    Ok(TrackedExecution {
        tx_hash: outcome.tx_hash,
        before,
        after,
        confirmation,
    })
}

/// Checks that `owner` holds `required` of `token`.
///
/// A shortfall smaller than `shortfall_tolerance` whole tokens is absorbed by
/// spending the whole balance instead; the returned amount is what to spend.
pub async fn usable_amount(
    chain: &dyn ChainAccess,
    token: &Token,
    required: U256,
    shortfall_tolerance: Decimal,
) -> Result<U256, SwapError> {
    let available = chain.balance_of(token.address, chain.account()).await?;
    resolve_shortfall(token, required, available, shortfall_tolerance)
}

pub fn resolve_shortfall(
    token: &Token,
    required: U256,
    available: U256,
    shortfall_tolerance: Decimal,
) -> Result<U256, SwapError> {
    if available >= required {
        return Ok(required);
    }

    let shortfall = required - available;
    let tolerance = from_units(shortfall_tolerance, token.decimals)?;
    if !available.is_zero() && shortfall < tolerance {
        info!(
            "🪙 Using full {} balance {} (short by {})",
            token.symbol,
            to_units(available, token.decimals),
            to_units(shortfall, token.decimals)
        );
        return Ok(available);
    }

    Err(SwapError::InsufficientBalance {
        symbol: token.symbol.clone(),
        token: token.address,
        required,
        available,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sdai() -> Token {
        Token::new("sDAI", Address::repeat_byte(0xaa), 18)
    }

    #[test]
    fn sufficient_balance_spends_requested_amount() {
        let amount = resolve_shortfall(&sdai(), U256::from(100), U256::from(500), dec!(0.0001)).unwrap();
        assert_eq!(amount, U256::from(100));
    }

    #[test]
    fn tiny_shortfall_uses_whole_balance() {
        let required = U256::from(10u64).pow(U256::from(18));
        let available = required - U256::from(10u64).pow(U256::from(13));
        let amount = resolve_shortfall(&sdai(), required, available, dec!(0.0001)).unwrap();
        assert_eq!(amount, available);
    }

    #[test]
    fn real_shortfall_is_insufficient_balance() {
        let required = U256::from(10u64).pow(U256::from(18));
        let available = required / U256::from(2);
        let err = resolve_shortfall(&sdai(), required, available, dec!(0.0001)).unwrap_err();
        assert!(matches!(err, SwapError::InsufficientBalance { .. }));

        let err = resolve_shortfall(&sdai(), U256::from(1), U256::ZERO, dec!(0.0001)).unwrap_err();
        assert!(matches!(err, SwapError::InsufficientBalance { .. }));
    }
}

//! Allowance checks and auto-approval
//!
//! Approvals are sent and confirmed one at a time before the transaction they
//! gate is built, so the signer's nonce is observed to advance in between.

use alloy::{
    primitives::{Address, U160, U256, aliases::U48},
    sol_types::SolCall,
};
use std::time::Duration;
use tracing::{info, warn};
use crate::{
    contracts::IPermit2,
    errors::{BotError, SwapError},
    network::{APPROVAL_GAS_LIMIT, ChainAccess, submit_and_wait},
    types::{PreparedTx, ReceiptStatus, Token},
};

const APPROVAL_ATTEMPTS: u32 = 2;
/// Router approvals cover a few trades of the same size.
const APPROVAL_MULTIPLIER: u64 = 10;
const PERMIT2_EXPIRY_SECS: i64 = 24 * 60 * 60;

pub async fn ensure_allowance(
    chain: &dyn ChainAccess,
    token: &Token,
    spender: Address,
    required: U256,
    timeout: Duration,
) -> Result<(), SwapError> {
    let owner = chain.account();
    let mut current = chain.allowance(token.address, owner, spender).await?;
    if current >= required {
        return Ok(());
    }

    let target = required.saturating_mul(U256::from(APPROVAL_MULTIPLIER));
    for attempt in 1..=APPROVAL_ATTEMPTS {
        info!("🔓 Approving {} for {} (attempt {}/{})", token.symbol, spender, attempt, APPROVAL_ATTEMPTS);
        let tx_hash = chain.approve(token.address, spender, target).await?;
        match chain.wait_for_receipt(tx_hash, timeout).await? {
            ReceiptStatus::Success => {}
            status => warn!("⚠️ Approval {} ended as {:?}", tx_hash, status),
        }

        current = chain.allowance(token.address, owner, spender).await?;
        if current >= required {
            return Ok(());
        }
    }

    Err(SwapError::InsufficientAllowance {
        symbol: token.symbol.clone(),
        token: token.address,
        spender,
        required,
        current,
    })
}

/// Current Permit2 allowance of `spender` over `owner`'s `token`, ignoring
/// expired grants.
pub async fn permit2_allowance(
    chain: &dyn ChainAccess,
    permit2: Address,
    token: Address,
    owner: Address,
    spender: Address,
) -> Result<U256, SwapError> {
    let input = IPermit2::allowanceCall { user: owner, token, spender }.abi_encode();
    let data = chain.read_view(permit2, input.into()).await?;
    let ret = IPermit2::allowanceCall::abi_decode_returns(&data, true).map_err(|e| BotError::Contract {
        contract: permit2,
        message: "decoding permit2 allowance".to_string(),
        source: e.into(),
    })?;

    let now = chrono::Utc::now().timestamp().max(0) as u64;
    if ret.expiration.to::<u64>() <= now {
        return Ok(U256::ZERO);
    }
    Ok(U256::from(ret.amount))
}

/// Two-level approval for routers that pull through Permit2: the token is
/// approved to Permit2, then Permit2 grants the router a bounded allowance.
pub async fn ensure_permit2_allowance(
    chain: &dyn ChainAccess,
    permit2: Address,
    token: &Token,
    router: Address,
    required: U256,
    timeout: Duration,
) -> Result<(), SwapError> {
    ensure_allowance(chain, token, permit2, required, timeout).await?;

    let owner = chain.account();
    let mut current = permit2_allowance(chain, permit2, token.address, owner, router).await?;
    if current >= required {
        return Ok(());
    }

    let amount = U160::saturating_from(required.saturating_mul(U256::from(APPROVAL_MULTIPLIER)));
    for attempt in 1..=APPROVAL_ATTEMPTS {
        let expiration = (chrono::Utc::now().timestamp() + PERMIT2_EXPIRY_SECS).max(0) as u64;
        let input = IPermit2::approveCall {
            token: token.address,
            spender: router,
            amount,
            expiration: U48::saturating_from(expiration),
        }
        .abi_encode();
        let tx = PreparedTx::new(
            format!("permit2 approve {} (attempt {})", token.symbol, attempt),
            owner,
            permit2,
            input,
            APPROVAL_GAS_LIMIT,
        );
        submit_and_wait(chain, &tx, timeout).await?;

        current = permit2_allowance(chain, permit2, token.address, owner, router).await?;
        if current >= required {
            return Ok(());
        }
    }

    Err(SwapError::InsufficientAllowance {
        symbol: token.symbol.clone(),
        token: token.address,
        spender: router,
        required,
        current,
    })
}

//! Chain-access boundary
//!
//! Everything that touches the signing key, the nonce or a node goes through
//! [`ChainAccess`]. Core components only build [`PreparedTx`] values and read
//! state through this trait.

use alloy::{
    primitives::{Address, Bytes, TxHash, U256},
    sol_types::SolCall,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};
use crate::{
    contracts::IERC20,
    errors::{BotError, BotResult},
    types::{PreparedTx, ReceiptStatus, TxOutcome},
};

pub const APPROVAL_GAS_LIMIT: u64 = 120_000;

#[async_trait]
pub trait ChainAccess: Send + Sync {
    /// Address that signs and receives.
    fn account(&self) -> Address;

    /// `eth_call` against latest state.
    async fn read_view(&self, to: Address, input: Bytes) -> BotResult<Bytes>;

    /// Signs with the next observed nonce and broadcasts.
    async fn sign_and_send(&self, tx: &PreparedTx) -> BotResult<TxHash>;

    /// Waits up to `timeout`; `Pending` means no receipt was seen in time.
    async fn wait_for_receipt(&self, tx_hash: TxHash, timeout: Duration) -> BotResult<ReceiptStatus>;

    async fn balance_of(&self, token: Address, owner: Address) -> BotResult<U256> {
        let input = IERC20::balanceOfCall { account: owner }.abi_encode();
        let data = self.read_view(token, input.into()).await?;
        IERC20::balanceOfCall::abi_decode_returns(&data, true)
            .map(|r| r.balance)
            .map_err(|e| BotError::Contract {
                contract: token,
                message: "decoding balanceOf".to_string(),
                source: e.into(),
            })
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> BotResult<U256> {
        let input = IERC20::allowanceCall { owner, spender }.abi_encode();
        let data = self.read_view(token, input.into()).await?;
        IERC20::allowanceCall::abi_decode_returns(&data, true)
            .map(|r| r.remaining)
            .map_err(|e| BotError::Contract {
                contract: token,
                message: "decoding allowance".to_string(),
                source: e.into(),
            })
    }

    async fn approve(&self, token: Address, spender: Address, amount: U256) -> BotResult<TxHash> {
        let input = IERC20::approveCall { spender, amount }.abi_encode();
        let tx = PreparedTx::new(
            format!("approve {}", spender),
            self.account(),
            token,
            input,
            APPROVAL_GAS_LIMIT,
        );
        self.sign_and_send(&tx).await
    }
}

/// Sends one transaction and waits for its receipt, logging the outcome.
pub async fn submit_and_wait(
    chain: &dyn ChainAccess,
    tx: &PreparedTx,
    timeout: Duration,
) -> BotResult<TxOutcome> {
    let tx_hash = chain.sign_and_send(tx).await?;
    info!("📡 {} sent: {}", tx.label, tx_hash);

    let status = chain.wait_for_receipt(tx_hash, timeout).await?;
    match status {
        ReceiptStatus::Success => info!("✅ {} confirmed", tx.label),
        ReceiptStatus::Reverted => warn!("❌ {} reverted: {}", tx.label, tx_hash),
        ReceiptStatus::Pending => warn!("⏳ {} still pending after {:?}", tx.label, timeout),
    }
    Ok(TxOutcome { tx_hash, status })
}

//! Alloy-backed provider setup and chain access

use alloy::{
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes, TxHash},
    providers::{Provider, ProviderBuilder},
    rpc::types::eth::TransactionRequest,
    signers::local::PrivateKeySigner,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use crate::{
    config::Config,
    errors::{BotError, BotResult},
    network::{
        chain::ChainAccess,
        retry::{retry_with_backoff, RetryConfig},
    },
    types::{PreparedTx, ReceiptStatus},
    ConcreteProvider,
};

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub async fn setup_provider(config: &Config) -> Result<Arc<ConcreteProvider>> {
    let provider: Arc<ConcreteProvider> = Arc::new(
        ProviderBuilder::new()
            .on_http(config.rpc_url.parse().context("Invalid RPC_URL")?)
            .boxed()
    );

    info!("🔗 Testing connection to {}...", config.rpc_url);
    let (block, chain_id) = retry_with_backoff(
        || async {
            let block = provider.get_block_number().await
                .context("Failed to get block number")?;
            let chain_id = provider.get_chain_id().await
                .context("Failed to get chain id")?;
            Ok((block, chain_id))
        },
        &RetryConfig {
            max_attempts: 5,
            initial_delay_ms: 500,
            max_delay_ms: 10000,
            exponential_base: 2.0,
        },
        "RPC connection",
    ).await
    .map_err(|e| {
        warn!("⚠️ Network connection attempt failed: {}", e);
        anyhow::anyhow!("Network connection failed: {}", e)
    })?;

    if chain_id != config.chain_id {
        return Err(anyhow::anyhow!(
            "RPC reports chain id {} but CHAIN_ID is {}",
            chain_id,
            config.chain_id
        ));
    }

    info!("✅ Connected to chain {} at block {}", chain_id, block);
    Ok(provider)
}

/// Chain access over an HTTP provider with a local private key.
///
/// Sends are serialized behind a mutex and the pending nonce is read fresh
/// for every transaction, so no caller ever sees or caches a nonce.
pub struct AlloyChainAccess {
    provider: Arc<ConcreteProvider>,
    wallet: Option<EthereumWallet>,
    account: Address,
    chain_id: u64,
    send_lock: Mutex<()>,
    read_retry: RetryConfig,
}

impl AlloyChainAccess {
    pub fn new(provider: Arc<ConcreteProvider>, private_key: Option<&str>, chain_id: u64) -> BotResult<Self> {
        let (wallet, account) = match private_key {
            Some(pk) => {
                let signer = PrivateKeySigner::from_str(pk.trim()).map_err(|e| BotError::Signing {
                    message: "Failed to parse private key".to_string(),
                    source: e.into(),
                })?;
                let account = signer.address();
                (Some(EthereumWallet::from(signer)), account)
            }
            None => (None, Address::ZERO),
        };

        if wallet.is_some() {
            info!("🔑 Signing as {}", account);
        } else {
            info!("👀 No private key configured, running read-only");
        }

        Ok(Self {
            provider,
            wallet,
            account,
            chain_id,
            send_lock: Mutex::new(()),
            read_retry: RetryConfig {
                max_attempts: 3,
                initial_delay_ms: 200,
                ..Default::default()
            },
        })
    }

    fn network_error(message: impl Into<String>, source: impl Into<anyhow::Error>) -> BotError {
        BotError::Network {
            message: message.into(),
            source: Some(source.into()),
            retry_count: 0,
        }
    }
}

#[async_trait]
impl ChainAccess for AlloyChainAccess {
    fn account(&self) -> Address {
        self.account
    }

    async fn read_view(&self, to: Address, input: Bytes) -> BotResult<Bytes> {
        let operation = || {
            let tx = TransactionRequest::default()
                .from(self.account)
                .to(to)
                .input(input.clone().into());
            async move {
                self.provider.call(&tx).await
                    .with_context(|| format!("eth_call to {} failed", to))
            }
        };

        retry_with_backoff(operation, &self.read_retry, &format!("read {}", to)).await
    }

    async fn sign_and_send(&self, tx: &PreparedTx) -> BotResult<TxHash> {
        let wallet = self.wallet.as_ref()
            .ok_or_else(|| BotError::config("PRIVATE_KEY is not set; cannot sign transactions"))?;

        let _guard = self.send_lock.lock().await;

        let nonce = self.provider.get_transaction_count(self.account).pending().await
            .map_err(|e| Self::network_error("Failed to read pending nonce", e))?;
        let gas_price = self.provider.get_gas_price().await
            .map_err(|e| Self::network_error("Failed to read gas price", e))?;

        let request = TransactionRequest::default()
            .with_from(self.account)
            .with_to(tx.to)
            .with_input(tx.input.clone())
            .with_value(tx.value)
            .with_nonce(nonce)
            .with_chain_id(self.chain_id)
            .with_gas_limit(tx.gas)
            .with_gas_price(gas_price);

        let envelope = request.build(wallet).await.map_err(|e| BotError::Signing {
            message: format!("Failed to sign {}", tx.label),
            source: anyhow::anyhow!("{}", e),
        })?;

        let pending = self.provider.send_tx_envelope(envelope).await
            .map_err(|e| Self::network_error(format!("Failed to broadcast {}", tx.label), e))?;
        let tx_hash = *pending.tx_hash();

        debug!(tx_hash = %tx_hash, nonce, label = %tx.label, "Broadcast transaction");
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash, timeout: Duration) -> BotResult<ReceiptStatus> {
        let poll = async {
            loop {
                match self.provider.get_transaction_receipt(tx_hash).await {
                    Ok(Some(receipt)) => {
                        return if receipt.status() {
                            ReceiptStatus::Success
                        } else {
                            ReceiptStatus::Reverted
                        };
                    }
                    Ok(None) => {}
                    Err(e) => warn!("⚠️ Receipt lookup for {} failed: {}", tx_hash, e),
                }
                tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
            }
        };

        tokio::select! {
            status = poll => Ok(status),
            _ = tokio::time::sleep(timeout) => {
                warn!("⏳ No receipt for {} after {:?}", tx_hash, timeout);
                Ok(ReceiptStatus::Pending)
            }
        }
    }
}

/// HTTP client with a bounded request timeout.
pub fn http_client(timeout: Duration) -> BotResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| {
            warn!("⚠️ Failed to initialize HTTP client: {}", e);
            BotError::Network {
                message: "Failed to build HTTP client".to_string(),
                source: Some(e.into()),
                retry_count: 0,
            }
        })
}

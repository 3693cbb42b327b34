//! ERC-4626 wrapping of the company token (GNO ⇄ waGNO)

use alloy::{
    primitives::{TxHash, U256},
    sol_types::SolCall,
};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use crate::{
    config::{ExecutionSettings, MarketConfig},
    contracts::IERC4626,
    errors::{BotError, BotResult, SwapError, ensure_positive},
    execution::{ensure_allowance, execute_tracked, usable_amount},
    network::ChainAccess,
    types::{Confirmation, PreparedTx, Token},
    utils::to_units,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrapOutcome {
    pub received: U256,
    pub tx_hash: TxHash,
    pub confirmation: Confirmation,
}

#[async_trait]
pub trait AssetWrapper: Send + Sync {
    /// Deposits `assets` of the underlying and returns the shares received.
    async fn wrap(&self, assets: U256) -> Result<WrapOutcome, SwapError>;

    /// Redeems `shares` and returns the underlying received.
    async fn unwrap(&self, shares: U256) -> Result<WrapOutcome, SwapError>;

    /// Underlying value of `shares` at the vault's current rate.
    async fn convert_to_assets(&self, shares: U256) -> BotResult<U256>;
}

pub struct Erc4626Wrapper {
    chain: Arc<dyn ChainAccess>,
    underlying: Token,
    vault: Token,
    settings: ExecutionSettings,
}

impl Erc4626Wrapper {
    pub fn new(chain: Arc<dyn ChainAccess>, market: &MarketConfig, settings: ExecutionSettings) -> BotResult<Self> {
        Ok(Self {
            chain,
            underlying: market.company_pair()?.base.clone(),
            vault: market.wrapped_company()?.clone(),
            settings,
        })
    }
}

#[async_trait]
impl AssetWrapper for Erc4626Wrapper {
    async fn wrap(&self, assets: U256) -> Result<WrapOutcome, SwapError> {
        ensure_positive(assets, "wrap amount")?;
        let chain = self.chain.as_ref();
        let timeout = self.settings.receipt_timeout;

        let assets = usable_amount(chain, &self.underlying, assets, self.settings.balance_shortfall_tolerance).await?;
        ensure_allowance(chain, &self.underlying, self.vault.address, assets, timeout).await?;

        let input = IERC4626::depositCall { assets, receiver: chain.account() }.abi_encode();
        let tx = PreparedTx::new(
            format!("wrap {}", self.underlying.symbol),
            chain.account(),
            self.vault.address,
            input,
            self.settings.gas_limit,
        );
        let tracked = execute_tracked(chain, &tx, &[self.underlying.address, self.vault.address], timeout).await?;

        let received = tracked.gained(1);
        info!(
            "📦 Wrapped {} {} into {} {}",
            to_units(assets, self.underlying.decimals),
            self.underlying.symbol,
            to_units(received, self.vault.decimals),
            self.vault.symbol,
        );
        Ok(WrapOutcome {
            received,
            tx_hash: tracked.tx_hash,
            confirmation: tracked.confirmation,
        })
    }

    async fn unwrap(&self, shares: U256) -> Result<WrapOutcome, SwapError> {
        ensure_positive(shares, "unwrap amount")?;
        let chain = self.chain.as_ref();
        let timeout = self.settings.receipt_timeout;

        let shares = usable_amount(chain, &self.vault, shares, self.settings.balance_shortfall_tolerance).await?;

        let input = IERC4626::redeemCall {
            shares,
            receiver: chain.account(),
            owner: chain.account(),
        }
        .abi_encode();
        let tx = PreparedTx::new(
            format!("unwrap {}", self.vault.symbol),
            chain.account(),
            self.vault.address,
            input,
            self.settings.gas_limit,
        );
        let tracked = execute_tracked(chain, &tx, &[self.vault.address, self.underlying.address], timeout).await?;

        let received = tracked.gained(1);
        info!(
            "📭 Unwrapped {} {} into {} {}",
            to_units(shares, self.vault.decimals),
            self.vault.symbol,
            to_units(received, self.underlying.decimals),
            self.underlying.symbol,
        );
        Ok(WrapOutcome {
            received,
            tx_hash: tracked.tx_hash,
            confirmation: tracked.confirmation,
        })
    }

    async fn convert_to_assets(&self, shares: U256) -> BotResult<U256> {
        let input = IERC4626::convertToAssetsCall { shares }.abi_encode();
        let data = self.chain.read_view(self.vault.address, input.into()).await?;
        IERC4626::convertToAssetsCall::abi_decode_returns(&data, true)
            .map(|r| r.assets)
            .map_err(|e| BotError::Contract {
                contract: self.vault.address,
                message: "decoding convertToAssets".to_string(),
                source: e.into(),
            })
    }
}

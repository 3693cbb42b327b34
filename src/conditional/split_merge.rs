//! Splitting collateral into YES/NO conditional tokens and merging back

use alloy::{
    primitives::{Address, Bytes, TxHash, U256},
    sol_types::SolCall,
};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use crate::{
    config::{ExecutionSettings, MarketConfig},
    contracts::IFutarchyRouter,
    errors::{SwapError, ensure_positive},
    execution::{ensure_allowance, execute_tracked, read_balances, usable_amount},
    network::ChainAccess,
    types::{Confirmation, ConditionalPair, PreparedTx},
    utils::to_units,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitOutcome {
    pub yes_amount: U256,
    pub no_amount: U256,
    pub tx_hash: TxHash,
    pub confirmation: Confirmation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub base_received: U256,
    pub tx_hash: TxHash,
    pub confirmation: Confirmation,
}

#[async_trait]
pub trait ConditionalTokens: Send + Sync {
    /// Locks `amount` of the base token and mints the same amount of YES and NO.
    async fn split(&self, pair: &ConditionalPair, amount: U256) -> Result<SplitOutcome, SwapError>;

    /// Burns `amount` of both YES and NO and releases the base token.
    async fn merge(&self, pair: &ConditionalPair, amount: U256) -> Result<MergeOutcome, SwapError>;
}

pub fn encode_split(proposal: Address, collateral: Address, amount: U256) -> Bytes {
    IFutarchyRouter::splitPositionCall {
        proposal,
        collateralToken: collateral,
        amount,
    }
    .abi_encode()
    .into()
}

pub fn encode_merge(proposal: Address, collateral: Address, amount: U256) -> Bytes {
    IFutarchyRouter::mergePositionsCall {
        proposal,
        collateralToken: collateral,
        amount,
    }
    .abi_encode()
    .into()
}

/// Split and merge through the futarchy router for one proposal.
pub struct FutarchyRouterService {
    chain: Arc<dyn ChainAccess>,
    router: Address,
    proposal: Address,
    settings: ExecutionSettings,
}

impl FutarchyRouterService {
    pub fn new(chain: Arc<dyn ChainAccess>, market: &MarketConfig, settings: ExecutionSettings) -> Self {
        Self {
            chain,
            router: market.futarchy.router,
            proposal: market.futarchy.proposal,
            settings,
        }
    }
}

#[async_trait]
impl ConditionalTokens for FutarchyRouterService {
    async fn split(&self, pair: &ConditionalPair, amount: U256) -> Result<SplitOutcome, SwapError> {
        ensure_positive(amount, "split amount")?;
        let chain = self.chain.as_ref();
        let timeout = self.settings.receipt_timeout;

        let amount = usable_amount(chain, &pair.base, amount, self.settings.balance_shortfall_tolerance).await?;
        ensure_allowance(chain, &pair.base, self.router, amount, timeout).await?;

        let tx = PreparedTx::new(
            format!("split {}", pair.base.symbol),
            chain.account(),
            self.router,
            encode_split(self.proposal, pair.base.address, amount),
            self.settings.gas_limit,
        );
        let tracked = execute_tracked(
            chain,
            &tx,
            &[pair.base.address, pair.yes.address, pair.no.address],
            timeout,
        )
        .await?;

        let outcome = SplitOutcome {
            yes_amount: tracked.gained(1),
            no_amount: tracked.gained(2),
            tx_hash: tracked.tx_hash,
            confirmation: tracked.confirmation,
        };
        info!(
            "✂️ Split {} {} into {} {} / {} {}",
            to_units(amount, pair.base.decimals),
            pair.base.symbol,
            to_units(outcome.yes_amount, pair.yes.decimals),
            pair.yes.symbol,
            to_units(outcome.no_amount, pair.no.decimals),
            pair.no.symbol,
        );
        Ok(outcome)
    }

    async fn merge(&self, pair: &ConditionalPair, amount: U256) -> Result<MergeOutcome, SwapError> {
        ensure_positive(amount, "merge amount")?;
        let chain = self.chain.as_ref();
        let timeout = self.settings.receipt_timeout;

        let held = read_balances(chain, chain.account(), &[pair.yes.address, pair.no.address]).await?;
        for (token, available) in [(&pair.yes, held[0]), (&pair.no, held[1])] {
            if available < amount {
                return Err(SwapError::InsufficientBalance {
                    symbol: token.symbol.clone(),
                    token: token.address,
                    required: amount,
                    available,
                });
            }
        }

        ensure_allowance(chain, &pair.yes, self.router, amount, timeout).await?;
        ensure_allowance(chain, &pair.no, self.router, amount, timeout).await?;

        let tx = PreparedTx::new(
            format!("merge {}", pair.base.symbol),
            chain.account(),
            self.router,
            encode_merge(self.proposal, pair.base.address, amount),
            self.settings.gas_limit,
        );
        let tracked = execute_tracked(
            chain,
            &tx,
            &[pair.base.address, pair.yes.address, pair.no.address],
            timeout,
        )
        .await?;

        let outcome = MergeOutcome {
            base_received: tracked.gained(0),
            tx_hash: tracked.tx_hash,
            confirmation: tracked.confirmation,
        };
        info!(
            "🔗 Merged {} {} pairs into {} {}",
            to_units(amount, pair.base.decimals),
            pair.base.symbol,
            to_units(outcome.base_received, pair.base.decimals),
            pair.base.symbol,
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_calls_carry_proposal_and_collateral() {
        let proposal = Address::repeat_byte(0x0a);
        let collateral = Address::repeat_byte(0x0b);

        let split = IFutarchyRouter::splitPositionCall::abi_decode(&encode_split(proposal, collateral, U256::from(5)), true).unwrap();
        assert_eq!(split.proposal, proposal);
        assert_eq!(split.collateralToken, collateral);
        assert_eq!(split.amount, U256::from(5));

        let merge = encode_merge(proposal, collateral, U256::from(5));
        assert_eq!(&merge[..4], IFutarchyRouter::mergePositionsCall::SELECTOR.as_slice());
    }
}

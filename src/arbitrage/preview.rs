//! Whole-prefix dry run
//!
//! Approve, split and both conditional legs go out as one bundle so every
//! call sees the state its predecessors leave behind. Nothing is broadcast.
//! The split is sized the way a sell-synthetic run sizes it: the currency
//! amount is quoted into the wrapped company token on the spot pool and
//! converted to underlying assets.

use alloy::{
    primitives::{Address, U256},
    sol_types::SolCall,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use crate::{
    config::{ExecutionSettings, MarketConfig},
    conditional::{AssetWrapper, encode_split},
    contracts::IERC20,
    errors::{BotResult, SwapError},
    network::{APPROVAL_GAS_LIMIT, ChainAccess},
    pricing::{price_limit, read_sqrt_price},
    simulation::BundleSimulator,
    types::{
        ConditionalPair, Direction, OutputKind, Pool, PreparedTx, SimulationCall, SimulationResult,
        SwapIntent, Token,
    },
    utils::{from_units, to_units},
    venues::{SwapVenue, VenueExecutor},
};

#[derive(Debug, Clone, Serialize)]
pub struct PreviewStep {
    pub label: String,
    pub reverted: bool,
    pub unreliable: bool,
    pub revert_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BundlePreview {
    /// Currency the previewed run would spend.
    pub amount: Decimal,
    /// Company token the spot leg is quoted to deliver, and the split size.
    pub company_amount: Decimal,
    pub steps: Vec<PreviewStep>,
    /// Currency-YES expected from the YES leg.
    pub yes_out: Option<Decimal>,
    /// Currency-NO expected from the NO leg.
    pub no_out: Option<Decimal>,
}

impl BundlePreview {
    pub fn succeeded(&self) -> bool {
        self.steps.iter().all(|s| !s.reverted && !s.unreliable)
    }
}

pub struct BundlePreviewer {
    chain: Arc<dyn ChainAccess>,
    simulator: Arc<dyn BundleSimulator>,
    venues: Arc<dyn SwapVenue>,
    wrapper: Arc<dyn AssetWrapper>,
    company: ConditionalPair,
    currency: ConditionalPair,
    wrapped: Token,
    spot_pool: Pool,
    yes_pool: Pool,
    no_pool: Pool,
    futarchy_router: Address,
    proposal: Address,
    yes_executor: VenueExecutor,
    no_executor: VenueExecutor,
    settings: ExecutionSettings,
}

impl BundlePreviewer {
    pub fn new(
        chain: Arc<dyn ChainAccess>,
        simulator: Arc<dyn BundleSimulator>,
        venues: Arc<dyn SwapVenue>,
        wrapper: Arc<dyn AssetWrapper>,
        market: &MarketConfig,
        settings: ExecutionSettings,
    ) -> BotResult<Self> {
        let yes_pool = market.yes_pool()?.clone();
        let no_pool = market.no_pool()?.clone();
        Ok(Self {
            chain,
            simulator,
            venues,
            wrapper,
            company: market.company_pair()?.clone(),
            currency: market.currency_pair()?.clone(),
            wrapped: market.wrapped_company()?.clone(),
            spot_pool: market.spot_pool()?.clone(),
            yes_executor: VenueExecutor::for_kind(yes_pool.venue, market),
            no_executor: VenueExecutor::for_kind(no_pool.venue, market),
            yes_pool,
            no_pool,
            futarchy_router: market.futarchy.router,
            proposal: market.futarchy.proposal,
            settings,
        })
    }

    /// Builds `[approve, split, approve, YES leg, approve, NO leg]` for
    /// `amount` of the company token. Approvals are always included since
    /// the simulated state starts from the live chain.
    pub async fn build_bundle(&self, amount: U256) -> Result<Vec<SimulationCall>, SwapError> {
        let from = self.chain.account();
        let gas = self.settings.simulation_gas;

        let yes_leg = SwapIntent::exact_in(&self.company.yes, &self.currency.yes, amount, &self.yes_pool);
        let no_leg = SwapIntent::exact_in(&self.company.no, &self.currency.no, amount, &self.no_pool);
        let (yes_limit, no_limit) = tokio::try_join!(
            self.leg_limit(&yes_leg, &self.yes_executor),
            self.leg_limit(&no_leg, &self.no_executor),
        )?;

        let split_tx = PreparedTx::new(
            format!("split {}", self.company.base.symbol),
            from,
            self.futarchy_router,
            encode_split(self.proposal, self.company.base.address, amount),
            gas,
        );

        Ok(vec![
            approve(from, &self.company.base, self.futarchy_router),
            SimulationCall::new(split_tx, OutputKind::None),
            approve(from, &self.company.yes, self.yes_executor.router()),
            self.yes_executor.build_swap(&yes_leg, from, yes_limit, U256::ZERO, gas)?,
            approve(from, &self.company.no, self.no_executor.router()),
            self.no_executor.build_swap(&no_leg, from, no_limit, U256::ZERO, gas)?,
        ])
    }

    /// Company-token units `amount` of currency buys at spot right now.
    pub async fn company_amount(&self, amount: U256) -> Result<U256, SwapError> {
        let buy = SwapIntent::exact_in(&self.currency.base, &self.wrapped, amount, &self.spot_pool);
        let quote = self.venues.quote_exact_in(&buy).await?;
        Ok(self.wrapper.convert_to_assets(quote.amount_out).await?)
    }

    /// Previews the split and both legs for `amount` of the currency token.
    pub async fn preview(&self, amount: Decimal) -> Result<BundlePreview, SwapError> {
        let currency_units = from_units(amount, self.currency.base.decimals)?;
        let units = self.company_amount(currency_units).await?;
        let company_amount = to_units(units, self.company.base.decimals);
        if units.is_zero() {
            return Err(SwapError::InvalidAmount {
                reason: format!("{} {} buys no {}", amount, self.currency.base.symbol, self.company.base.symbol),
            });
        }

        let calls = self.build_bundle(units).await?;
        info!(
            "🔍 Previewing {} {} (≈{} {}) through {} simulated calls",
            amount,
            self.currency.base.symbol,
            company_amount,
            self.company.base.symbol,
            calls.len()
        );

        let results = self.simulator.simulate(&calls).await?;

        let yes_leg = SwapIntent::exact_in(&self.company.yes, &self.currency.yes, units, &self.yes_pool);
        let no_leg = SwapIntent::exact_in(&self.company.no, &self.currency.no, units, &self.no_pool);
        let yes_out = leg_output(&self.yes_executor, &yes_leg, results.get(3), &self.currency.yes);
        let no_out = leg_output(&self.no_executor, &no_leg, results.get(5), &self.currency.no);

        let steps: Vec<PreviewStep> = results
            .into_iter()
            .map(|r| PreviewStep {
                label: r.label,
                reverted: r.reverted,
                unreliable: r.unreliable,
                revert_reason: r.revert_reason,
            })
            .collect();

        if let Some(failed) = steps.iter().find(|s| s.reverted) {
            warn!(
                "⚠️ Preview reverted at '{}': {}",
                failed.label,
                failed.revert_reason.as_deref().unwrap_or("no reason")
            );
        }

        Ok(BundlePreview {
            amount,
            company_amount,
            steps,
            yes_out,
            no_out,
        })
    }

    async fn leg_limit(&self, intent: &SwapIntent, executor: &VenueExecutor) -> Result<Option<U256>, SwapError> {
        if !executor.uses_price_limit() {
            return Ok(None);
        }
        let current = read_sqrt_price(self.chain.as_ref(), &intent.pool).await?;
        let limit = price_limit(current, Direction::for_swap(intent.zero_for_one()), self.settings.price_tolerance)?;
        Ok(Some(limit))
    }
}

fn approve(from: Address, token: &Token, spender: Address) -> SimulationCall {
    let input = IERC20::approveCall {
        spender,
        amount: U256::MAX,
    }
    .abi_encode();
    let tx = PreparedTx::new(format!("approve {}", token.symbol), from, token.address, input, APPROVAL_GAS_LIMIT);
    SimulationCall::new(tx, OutputKind::None)
}

fn leg_output(
    executor: &VenueExecutor,
    intent: &SwapIntent,
    result: Option<&SimulationResult>,
    token_out: &Token,
) -> Option<Decimal> {
    let result = result.filter(|r| !r.reverted && !r.unreliable)?;
    executor
        .read_amounts(intent, &result.decoded_output)
        .ok()
        .map(|(_, out)| to_units(out, token_out.decimals))
}

//! Venue executors
//!
//! `VenueExecutor` knows how to encode calls for one venue kind.
//! `VenueService` binds an executor to chain access and the simulator and
//! runs the shared quote and execute flow.

use alloy::{
    primitives::{Address, U256},
    sol_types::SolCall,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};
use crate::{
    config::{ExecutionSettings, MarketConfig},
    contracts::IERC20,
    errors::{SwapError, ensure_positive},
    execution::{ensure_allowance, ensure_permit2_allowance, execute_tracked, usable_amount},
    network::{APPROVAL_GAS_LIMIT, ChainAccess},
    pricing::{price_limit, read_sqrt_price},
    simulation::{BundleSimulator, decode_output},
    types::{
        DecodedOutput, Direction, ExecutionResult, OutputKind, PreparedTx, SimulationCall,
        SwapAmount, SwapIntent, SwapQuote, VenueKind,
    },
    utils::{apply_slippage, to_units},
    venues::{SwapVenue, algebra, balancer, passthrough},
};

/// Deadline far enough out to never bind; the price limit and minimum output
/// are the guards.
pub const MAX_DEADLINE: u64 = 9_007_199_254_740_991;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VenueExecutor {
    PassthroughV3 { router: Address },
    Algebra { router: Address },
    BalancerBatch { router: Address, permit2: Address },
}

impl VenueExecutor {
    pub fn for_kind(kind: VenueKind, market: &MarketConfig) -> Self {
        let router = market.router_for(kind);
        match kind {
            VenueKind::PassthroughV3 => VenueExecutor::PassthroughV3 { router },
            VenueKind::Algebra => VenueExecutor::Algebra { router },
            VenueKind::BalancerBatch => VenueExecutor::BalancerBatch {
                router,
                permit2: market.venues.permit2,
            },
        }
    }

    pub fn kind(&self) -> VenueKind {
        match self {
            VenueExecutor::PassthroughV3 { .. } => VenueKind::PassthroughV3,
            VenueExecutor::Algebra { .. } => VenueKind::Algebra,
            VenueExecutor::BalancerBatch { .. } => VenueKind::BalancerBatch,
        }
    }

    pub fn router(&self) -> Address {
        match self {
            VenueExecutor::PassthroughV3 { router }
            | VenueExecutor::Algebra { router }
            | VenueExecutor::BalancerBatch { router, .. } => *router,
        }
    }

    /// Weighted pools have no sqrt price to bound.
    pub fn uses_price_limit(&self) -> bool {
        !matches!(self, VenueExecutor::BalancerBatch { .. })
    }

    /// Builds the real swap transaction for `intent`.
    pub fn build_swap(
        &self,
        intent: &SwapIntent,
        from: Address,
        limit: Option<U256>,
        minimum_out: U256,
        gas: u64,
    ) -> Result<SimulationCall, SwapError> {
        let need_limit = || {
            limit.ok_or(SwapError::QuoteFailure {
                message: format!("{} needs a price limit", self.kind().name()),
            })
        };

        let (input, decode) = match (self, intent.amount) {
            (VenueExecutor::PassthroughV3 { .. }, amount) => (
                passthrough::encode_swap(intent.pool.address, from, intent.zero_for_one(), amount, need_limit()?)?,
                OutputKind::PoolSwapDeltas,
            ),
            (VenueExecutor::Algebra { .. }, SwapAmount::ExactIn(amount_in)) => (
                algebra::encode_exact_in(intent, from, amount_in, minimum_out, need_limit()?, MAX_DEADLINE),
                OutputKind::SingleUint,
            ),
            (VenueExecutor::Algebra { .. }, SwapAmount::ExactOut(amount_out)) => (
                algebra::encode_exact_out(intent, from, amount_out, need_limit()?, MAX_DEADLINE),
                OutputKind::SingleUint,
            ),
            (VenueExecutor::BalancerBatch { .. }, SwapAmount::ExactIn(amount_in)) => (
                balancer::encode_swap_exact_in(intent, amount_in, minimum_out, MAX_DEADLINE),
                OutputKind::BalancerExactIn,
            ),
            (VenueExecutor::BalancerBatch { .. }, SwapAmount::ExactOut(_)) => {
                return Err(SwapError::Unsupported {
                    venue: self.kind().name(),
                    operation: "exact-out execution",
                });
            }
        };

        let tx = PreparedTx::new(format!("swap {}", intent.describe()), from, self.router(), input, gas);
        Ok(SimulationCall::new(tx, decode))
    }

    /// Reads `(amount_in, amount_out)` from a decoded swap result.
    pub fn read_amounts(&self, intent: &SwapIntent, decoded: &DecodedOutput) -> Result<(U256, U256), SwapError> {
        let undecodable = || SwapError::QuoteFailure {
            message: format!("undecodable {} output for {}", self.kind().name(), intent.describe()),
        };

        match decoded {
            DecodedOutput::PoolDeltas { amount0, amount1 } => {
                passthrough::amounts_from_deltas(intent.zero_for_one(), *amount0, *amount1).ok_or_else(undecodable)
            }
            DecodedOutput::Amount(value) => Ok(match intent.amount {
                SwapAmount::ExactIn(amount_in) => (amount_in, *value),
                SwapAmount::ExactOut(amount_out) => (*value, amount_out),
            }),
            DecodedOutput::BalancerAmounts { amounts_out, .. } => {
                let out = amounts_out.first().copied().ok_or_else(undecodable)?;
                Ok((intent.amount.value(), out))
            }
            DecodedOutput::Empty | DecodedOutput::Unknown => Err(undecodable()),
        }
    }
}

/// One venue bound to the chain, the optional simulator and execution knobs.
pub struct VenueService {
    executor: VenueExecutor,
    chain: Arc<dyn ChainAccess>,
    simulator: Option<Arc<dyn BundleSimulator>>,
    settings: ExecutionSettings,
}

impl VenueService {
    pub fn new(
        executor: VenueExecutor,
        chain: Arc<dyn ChainAccess>,
        simulator: Option<Arc<dyn BundleSimulator>>,
        settings: ExecutionSettings,
    ) -> Self {
        Self {
            executor,
            chain,
            simulator,
            settings,
        }
    }

    pub fn executor(&self) -> &VenueExecutor {
        &self.executor
    }

    /// Derives a limit from the pool's live price. Never reused across calls.
    pub async fn fresh_limit(&self, intent: &SwapIntent) -> Result<Option<U256>, SwapError> {
        if !self.executor.uses_price_limit() {
            return Ok(None);
        }
        let current = read_sqrt_price(self.chain.as_ref(), &intent.pool).await?;
        let direction = Direction::for_swap(intent.zero_for_one());
        let limit = price_limit(current, direction, self.settings.price_tolerance)?;
        debug!(pool = %intent.pool.symbol, %current, %limit, ?direction, "Derived price limit");
        Ok(Some(limit))
    }

    /// Runs `call` against current state without side effects. A short
    /// allowance gets a simulated approval prepended.
    async fn dry_run(&self, call: SimulationCall, intent: &SwapIntent) -> Result<DecodedOutput, SwapError> {
        let owner = self.chain.account();
        let token_in = &intent.token_in;
        let required = match intent.amount {
            SwapAmount::ExactIn(amount_in) => amount_in,
            SwapAmount::ExactOut(_) => self.chain.balance_of(token_in.address, owner).await?,
        };
        let allowance = self.chain.allowance(token_in.address, owner, self.executor.router()).await?;
        let needs_approval = allowance < required;

        let Some(simulator) = &self.simulator else {
            if needs_approval {
                return Err(SwapError::QuoteFailure {
                    message: format!(
                        "no simulator configured and {} allowance is short for a quote",
                        token_in.symbol
                    ),
                });
            }
            let data = self
                .chain
                .read_view(call.tx.to, call.tx.input.clone())
                .await
                .map_err(|e| SwapError::QuoteRevert { reason: Some(e.to_string()) })?;
            return Ok(decode_output(call.decode, &data));
        };

        let mut bundle = Vec::with_capacity(2);
        if needs_approval {
            let approve = IERC20::approveCall {
                spender: self.executor.router(),
                amount: U256::MAX,
            }
            .abi_encode();
            bundle.push(SimulationCall::new(
                PreparedTx::new(format!("approve {}", token_in.symbol), owner, token_in.address, approve, APPROVAL_GAS_LIMIT),
                OutputKind::None,
            ));
        }
        bundle.push(call);

        let results = simulator.simulate(&bundle).await?;
        let swap = results.last().ok_or_else(|| SwapError::QuoteFailure {
            message: "simulator returned an empty bundle".to_string(),
        })?;

        if swap.reverted {
            return Err(SwapError::QuoteRevert {
                reason: swap.revert_reason.clone(),
            });
        }
        if swap.unreliable {
            return Err(SwapError::QuoteFailure {
                message: "simulated approval reverted ahead of the swap".to_string(),
            });
        }
        Ok(swap.decoded_output.clone())
    }

    async fn quote(&self, intent: &SwapIntent) -> Result<SwapQuote, SwapError> {
        ensure_positive(intent.amount.value(), "swap amount")?;
        let owner = self.chain.account();

        let (amount_in, amount_out, limit) = match (&self.executor, intent.amount) {
            (VenueExecutor::BalancerBatch { router, .. }, SwapAmount::ExactIn(amount_in)) => {
                let input = balancer::encode_query_exact_in(intent, owner, amount_in);
                let data = self.chain.read_view(*router, input).await
                    .map_err(|e| SwapError::QuoteRevert { reason: Some(e.to_string()) })?;
                (amount_in, balancer::decode_query_exact_in(&data)?, None)
            }
            (VenueExecutor::BalancerBatch { router, .. }, SwapAmount::ExactOut(amount_out)) => {
                let input = balancer::encode_query_exact_out(intent, owner, amount_out);
                let data = self.chain.read_view(*router, input).await
                    .map_err(|e| SwapError::QuoteRevert { reason: Some(e.to_string()) })?;
                (balancer::decode_query_exact_out(&data)?, amount_out, None)
            }
            _ => {
                let limit = self.fresh_limit(intent).await?;
                let call = self.executor.build_swap(intent, owner, limit, U256::ZERO, self.settings.simulation_gas)?;
                let decoded = self.dry_run(call, intent).await?;
                let (amount_in, amount_out) = self.executor.read_amounts(intent, &decoded)?;
                (amount_in, amount_out, limit)
            }
        };

        Ok(SwapQuote {
            amount_in,
            amount_out,
            price_limit: limit,
            minimum_out: apply_slippage(amount_out, self.settings.price_tolerance),
        })
    }
}

#[async_trait]
impl SwapVenue for VenueService {
    async fn quote_exact_in(&self, intent: &SwapIntent) -> Result<SwapQuote, SwapError> {
        let SwapAmount::ExactIn(_) = intent.amount else {
            return Err(SwapError::InvalidAmount {
                reason: "quote_exact_in needs an exact-in amount".to_string(),
            });
        };
        self.quote(intent).await
    }

    async fn quote_exact_out(&self, intent: &SwapIntent) -> Result<SwapQuote, SwapError> {
        let SwapAmount::ExactOut(_) = intent.amount else {
            return Err(SwapError::InvalidAmount {
                reason: "quote_exact_out needs an exact-out amount".to_string(),
            });
        };
        self.quote(intent).await
    }

    async fn execute_exact_in(&self, intent: &SwapIntent) -> Result<ExecutionResult, SwapError> {
        let SwapAmount::ExactIn(requested) = intent.amount else {
            return Err(SwapError::Unsupported {
                venue: self.executor.kind().name(),
                operation: "exact-out execution",
            });
        };
        ensure_positive(requested, "swap amount")?;

        let chain = self.chain.as_ref();
        let amount_in = usable_amount(chain, &intent.token_in, requested, self.settings.balance_shortfall_tolerance).await?;
        let intent = intent.with_amount(SwapAmount::ExactIn(amount_in));
        let timeout = self.settings.receipt_timeout;

        match self.executor {
            VenueExecutor::BalancerBatch { router, permit2 } => {
                ensure_permit2_allowance(chain, permit2, &intent.token_in, router, amount_in, timeout).await?
            }
            _ => ensure_allowance(chain, &intent.token_in, self.executor.router(), amount_in, timeout).await?,
        }

        let quote = self.quote(&intent).await?;
        info!(
            "💱 {}: {} in, quoted {} out (min {})",
            intent.describe(),
            to_units(quote.amount_in, intent.token_in.decimals),
            to_units(quote.amount_out, intent.token_out.decimals),
            to_units(quote.minimum_out, intent.token_out.decimals),
        );

        let limit = self.fresh_limit(&intent).await?;
        let call = self.executor.build_swap(&intent, chain.account(), limit, quote.minimum_out, self.settings.gas_limit)?;
        let tracked = execute_tracked(
            chain,
            &call.tx,
            &[intent.token_in.address, intent.token_out.address],
            timeout,
        )
        .await?;

        let realized_in = tracked.spent(0);
        let realized_out = tracked.gained(1);
        if realized_out < quote.minimum_out {
            warn!(
                "⚠️ {} realized {} out, below minimum {}",
                intent.describe(),
                to_units(realized_out, intent.token_out.decimals),
                to_units(quote.minimum_out, intent.token_out.decimals),
            );
        }

        Ok(ExecutionResult {
            tx_hash: tracked.tx_hash,
            success: true,
            realized_delta_in: realized_in,
            realized_delta_out: realized_out,
            confirmation: tracked.confirmation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Pool, Token};
    use alloy::primitives::I256;

    fn intent(venue: VenueKind, amount: SwapAmount) -> SwapIntent {
        let a = Token::new("GNO-YES", Address::repeat_byte(1), 18);
        let b = Token::new("sDAI-YES", Address::repeat_byte(2), 18);
        let pool = Pool {
            symbol: "GNO-YES/sDAI-YES".into(),
            address: Address::repeat_byte(3),
            venue,
            token0: a.address,
            token1: b.address,
            fee: 3000,
        };
        SwapIntent::exact_in(&a, &b, U256::ZERO, &pool).with_amount(amount)
    }

    #[test]
    fn executors_follow_configured_routers() {
        let market = MarketConfig::gnosis_default().unwrap();
        let balancer = VenueExecutor::for_kind(VenueKind::BalancerBatch, &market);
        assert_eq!(balancer.router(), market.venues.balancer_batch_router);
        assert!(!balancer.uses_price_limit());
        assert_eq!(VenueExecutor::for_kind(VenueKind::Algebra, &market).kind(), VenueKind::Algebra);
    }

    #[test]
    fn concentrated_swaps_need_a_limit() {
        let exec = VenueExecutor::PassthroughV3 { router: Address::repeat_byte(7) };
        let swap = intent(VenueKind::PassthroughV3, SwapAmount::ExactIn(U256::from(5)));
        assert!(exec.build_swap(&swap, Address::ZERO, None, U256::ZERO, 1).is_err());

        let call = exec.build_swap(&swap, Address::ZERO, Some(U256::from(1u64) << 96usize), U256::ZERO, 1).unwrap();
        assert_eq!(call.decode, OutputKind::PoolSwapDeltas);
        assert_eq!(call.tx.to, Address::repeat_byte(7));
    }

    #[test]
    fn balancer_does_not_execute_exact_out() {
        let exec = VenueExecutor::BalancerBatch {
            router: Address::repeat_byte(7),
            permit2: Address::repeat_byte(8),
        };
        let swap = intent(VenueKind::BalancerBatch, SwapAmount::ExactOut(U256::from(5)));
        let err = exec.build_swap(&swap, Address::ZERO, None, U256::ZERO, 1).unwrap_err();
        assert!(matches!(err, SwapError::Unsupported { .. }));
    }

    #[test]
    fn amounts_read_per_output_shape() {
        let algebra = VenueExecutor::Algebra { router: Address::ZERO };
        let exact_out = intent(VenueKind::Algebra, SwapAmount::ExactOut(U256::from(10)));
        assert_eq!(
            algebra.read_amounts(&exact_out, &DecodedOutput::Amount(U256::from(12))).unwrap(),
            (U256::from(12), U256::from(10))
        );

        let passthrough = VenueExecutor::PassthroughV3 { router: Address::ZERO };
        let exact_in = intent(VenueKind::PassthroughV3, SwapAmount::ExactIn(U256::from(10)));
        let deltas = DecodedOutput::PoolDeltas {
            amount0: I256::try_from(10i64).unwrap(),
            amount1: I256::try_from(-9i64).unwrap(),
        };
        assert_eq!(passthrough.read_amounts(&exact_in, &deltas).unwrap(), (U256::from(10), U256::from(9)));
        assert!(passthrough.read_amounts(&exact_in, &DecodedOutput::Unknown).is_err());
    }
}

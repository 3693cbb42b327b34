//! Arbitrage run state machine
//!
//! `Start → AcquireBase → ConvertToConditional → ExecuteLegs → Reconcile →
//! MergeOrFinalize → Report`. A hard failure halts the run where it is and
//! jumps to `Report` on whatever balances are held at that point. Nothing is
//! rolled back.

use alloy::primitives::{Address, TxHash, U256};
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use crate::{
    config::{ExecutionSettings, MarketConfig},
    conditional::{AssetWrapper, ConditionalTokens},
    errors::{BotResult, SwapError},
    execution::read_balances,
    network::ChainAccess,
    pricing::token_price,
    reconcile::{BalanceReconciler, ReconcileOutcome},
    types::{
        ArbitrageRun, ConditionalPair, ExecutionResult, Pool, RunOutcome, RunStage, RunStep,
        Strategy, SwapIntent, Token, TokenBalance,
    },
    utils::{from_units, to_units},
    venues::SwapVenue,
};

/// Tokens and pools a run touches, resolved once from the market config.
#[derive(Debug, Clone)]
struct Layout {
    currency: ConditionalPair,
    company: ConditionalPair,
    wrapped: Token,
    yes_pool: Pool,
    no_pool: Pool,
    currency_yes_pool: Pool,
    spot_pool: Pool,
    tracked: Vec<Token>,
}

impl Layout {
    fn resolve(market: &MarketConfig) -> BotResult<Self> {
        Ok(Self {
            currency: market.currency_pair()?.clone(),
            company: market.company_pair()?.clone(),
            wrapped: market.wrapped_company()?.clone(),
            yes_pool: market.yes_pool()?.clone(),
            no_pool: market.no_pool()?.clone(),
            currency_yes_pool: market.currency_yes_pool()?.clone(),
            spot_pool: market.spot_pool()?.clone(),
            tracked: market.tracked_tokens(),
        })
    }
}

/// Per-run bookkeeping that does not belong in the persisted report.
#[derive(Default)]
struct RunContext {
    /// `None` when the opening snapshot failed.
    initial_balances: Option<HashMap<Address, U256>>,
    /// Prices in the accounting asset observed during the run.
    observed_prices: HashMap<Address, Decimal>,
}

pub struct ArbitrageOrchestrator {
    chain: Arc<dyn ChainAccess>,
    venues: Arc<dyn SwapVenue>,
    conditional: Arc<dyn ConditionalTokens>,
    wrapper: Arc<dyn AssetWrapper>,
    reconciler: BalanceReconciler,
    layout: Layout,
    settings: ExecutionSettings,
}

impl ArbitrageOrchestrator {
    pub fn new(
        chain: Arc<dyn ChainAccess>,
        market: &MarketConfig,
        venues: Arc<dyn SwapVenue>,
        conditional: Arc<dyn ConditionalTokens>,
        wrapper: Arc<dyn AssetWrapper>,
        settings: ExecutionSettings,
    ) -> BotResult<Self> {
        let layout = Layout::resolve(market)?;
        let reconciler = BalanceReconciler::new(
            venues.clone(),
            chain.clone(),
            layout.currency_yes_pool.clone(),
            settings.clone(),
        );
        Ok(Self {
            chain,
            venues,
            conditional,
            wrapper,
            reconciler,
            layout,
            settings,
        })
    }

    /// Runs `strategy` with `amount` of the accounting asset. Always returns a
    /// report; failures are recorded in it rather than returned.
    pub async fn run(&self, strategy: Strategy, amount: Decimal) -> ArbitrageRun {
        let base = &self.layout.currency.base;
        let mut ctx = RunContext::default();

        let initial = match self.snapshot().await {
            Ok(balances) => balances,
            Err(e) => {
                let mut run = ArbitrageRun::start(strategy, &base.symbol, amount, None);
                self.fail(&mut run, RunStage::Start, "read starting balances", &SwapError::from(e));
                return self.report(run, &ctx).await;
            }
        };
        let initial_base = initial.get(&base.address).copied().unwrap_or_default();
        ctx.initial_balances = Some(initial);

        let mut run = ArbitrageRun::start(strategy, &base.symbol, amount, Some(to_units(initial_base, base.decimals)));
        info!(run_id = %run.id, %strategy, %amount, "🚀 Starting arbitrage run");

        let amount_units = match from_units(amount, base.decimals) {
            Ok(units) if !units.is_zero() => units,
            Ok(_) => {
                let err = SwapError::InvalidAmount {
                    reason: "trade amount rounds to zero".to_string(),
                };
                self.fail(&mut run, RunStage::Start, "validate amount", &err);
                return self.report(run, &ctx).await;
            }
            Err(e) => {
                self.fail(&mut run, RunStage::Start, "validate amount", &e);
                return self.report(run, &ctx).await;
            }
        };

        match strategy {
            Strategy::SellSynthetic => self.sell_synthetic(&mut run, &mut ctx, amount_units).await,
            Strategy::BuySynthetic => self.buy_synthetic(&mut run, &mut ctx, amount_units).await,
        }

        self.report(run, &ctx).await
    }

    /// Spot below synthetic: buy the company token, split it and sell both
    /// conditional sides for conditional currency, then merge the currency.
    async fn sell_synthetic(&self, run: &mut ArbitrageRun, ctx: &mut RunContext, amount: U256) {
        let l = &self.layout;

        // AcquireBase
        let buy = SwapIntent::exact_in(&l.currency.base, &l.wrapped, amount, &l.spot_pool);
        let Some(bought) = self.swap(run, RunStage::AcquireBase, &buy).await else { return };

        let unwrapped = match self.wrapper.unwrap(bought.realized_delta_out).await {
            Ok(out) => {
                self.succeed(run, RunStage::AcquireBase, "unwrap", (&l.wrapped, bought.realized_delta_out), Some((&l.company.base, out.received)), Some(out.tx_hash));
                out.received
            }
            Err(e) => return self.fail(run, RunStage::AcquireBase, "unwrap", &e),
        };

        // ConvertToConditional
        let split = match self.conditional.split(&l.company, unwrapped).await {
            Ok(split) => {
                self.succeed(run, RunStage::ConvertToConditional, "split", (&l.company.base, unwrapped), Some((&l.company.yes, split.yes_amount)), Some(split.tx_hash));
                split
            }
            Err(e) => return self.fail(run, RunStage::ConvertToConditional, "split", &e),
        };

        // ExecuteLegs, one at a time
        let yes_leg = SwapIntent::exact_in(&l.company.yes, &l.currency.yes, split.yes_amount, &l.yes_pool);
        let Some(yes_out) = self.swap(run, RunStage::ExecuteLegs, &yes_leg).await else { return };
        let no_leg = SwapIntent::exact_in(&l.company.no, &l.currency.no, split.no_amount, &l.no_pool);
        let Some(no_out) = self.swap(run, RunStage::ExecuteLegs, &no_leg).await else { return };

        // Reconcile
        let outcome = self.reconcile(run, ctx, yes_out.realized_delta_out, no_out.realized_delta_out).await;

        // MergeOrFinalize
        self.merge_matched(run, &l.currency, outcome.matched()).await;
    }

    /// Synthetic below spot: split currency, buy both conditional sides of
    /// the company token, merge them and sell the company token at spot.
    async fn buy_synthetic(&self, run: &mut ArbitrageRun, ctx: &mut RunContext, amount: U256) {
        let l = &self.layout;

        // ConvertToConditional
        let split = match self.conditional.split(&l.currency, amount).await {
            Ok(split) => {
                self.succeed(run, RunStage::ConvertToConditional, "split", (&l.currency.base, amount), Some((&l.currency.yes, split.yes_amount)), Some(split.tx_hash));
                split
            }
            Err(e) => return self.fail(run, RunStage::ConvertToConditional, "split", &e),
        };

        // ExecuteLegs
        let yes_leg = SwapIntent::exact_in(&l.currency.yes, &l.company.yes, split.yes_amount, &l.yes_pool);
        let Some(yes_out) = self.swap(run, RunStage::ExecuteLegs, &yes_leg).await else { return };
        let no_leg = SwapIntent::exact_in(&l.currency.no, &l.company.no, split.no_amount, &l.no_pool);
        let Some(no_out) = self.swap(run, RunStage::ExecuteLegs, &no_leg).await else { return };

        // Reconcile whatever conditional currency the legs left behind.
        let yes_left = split.yes_amount.saturating_sub(yes_out.realized_delta_in);
        let no_left = split.no_amount.saturating_sub(no_out.realized_delta_in);
        let leftovers = self.reconcile(run, ctx, yes_left, no_left).await;

        // MergeOrFinalize
        self.merge_matched(run, &l.currency, leftovers.matched()).await;
        if run.is_halted() {
            return;
        }

        let matched = yes_out.realized_delta_out.min(no_out.realized_delta_out);
        let Some(merged) = self.merge_matched(run, &l.company, matched).await else { return };
        if merged.is_zero() {
            return;
        }

        let wrapped = match self.wrapper.wrap(merged).await {
            Ok(out) => {
                self.succeed(run, RunStage::MergeOrFinalize, "wrap", (&l.company.base, merged), Some((&l.wrapped, out.received)), Some(out.tx_hash));
                out.received
            }
            Err(e) => return self.fail(run, RunStage::MergeOrFinalize, "wrap", &e),
        };

        let sell = SwapIntent::exact_in(&l.wrapped, &l.currency.base, wrapped, &l.spot_pool);
        self.swap(run, RunStage::MergeOrFinalize, &sell).await;
    }

    async fn swap(&self, run: &mut ArbitrageRun, stage: RunStage, intent: &SwapIntent) -> Option<ExecutionResult> {
        let operation = format!("swap {}", intent.describe());
        match self.venues.execute_exact_in(intent).await {
            Ok(result) => {
                self.succeed(
                    run,
                    stage,
                    &operation,
                    (&intent.token_in, result.realized_delta_in),
                    Some((&intent.token_out, result.realized_delta_out)),
                    Some(result.tx_hash),
                );
                Some(result)
            }
            Err(e) => {
                self.fail(run, stage, &operation, &e);
                None
            }
        }
    }

    /// Balances the conditional currency pair. Never halts the run.
    async fn reconcile(&self, run: &mut ArbitrageRun, ctx: &mut RunContext, yes: U256, no: U256) -> ReconcileOutcome {
        let pair = &self.layout.currency;
        let price = match token_price(self.chain.as_ref(), &self.layout.currency_yes_pool, &pair.yes, &pair.base).await {
            Ok(price) => {
                ctx.observed_prices.insert(pair.yes.address, price);
                Some(price)
            }
            Err(e) => {
                warn!("⚠️ Could not read {} price, reconciling without a cost check: {}", pair.yes.symbol, e);
                None
            }
        };

        let outcome = self.reconciler.reconcile(pair, yes, no, price).await;
        run.record(RunStep {
            stage: RunStage::Reconcile,
            operation: "reconcile".to_string(),
            success: outcome.residual.is_none(),
            amount_in: outcome.trade.as_ref().map(|t| to_units(t.realized_delta_in, pair.yes.decimals)),
            amount_out: outcome.trade.as_ref().map(|t| to_units(t.realized_delta_out, pair.base.decimals)),
            tx_hashes: outcome.trade.iter().map(|t| t.tx_hash).collect(),
            error: outcome.residual.as_ref().map(|r| r.reason.clone()),
            error_category: None,
            timestamp: Utc::now(),
        });
        outcome
    }

    /// Merges `amount` of a pair unless it is dust. Returns the base received.
    async fn merge_matched(&self, run: &mut ArbitrageRun, pair: &ConditionalPair, amount: U256) -> Option<U256> {
        let dust = from_units(self.settings.dust_epsilon, pair.base.decimals).unwrap_or_default();
        if amount <= dust {
            info!("🔗 Nothing to merge for {}", pair.base.symbol);
            return Some(U256::ZERO);
        }

        let operation = format!("merge {}", pair.base.symbol);
        match self.conditional.merge(pair, amount).await {
            Ok(out) => {
                self.succeed(run, RunStage::MergeOrFinalize, &operation, (&pair.yes, amount), Some((&pair.base, out.base_received)), Some(out.tx_hash));
                Some(out.base_received)
            }
            Err(e) => {
                self.fail(run, RunStage::MergeOrFinalize, &operation, &e);
                None
            }
        }
    }

    fn succeed(
        &self,
        run: &mut ArbitrageRun,
        stage: RunStage,
        operation: &str,
        amount_in: (&Token, U256),
        amount_out: Option<(&Token, U256)>,
        tx_hash: Option<TxHash>,
    ) {
        let amount_in_units = to_units(amount_in.1, amount_in.0.decimals);
        let amount_out_units = amount_out.map(|(token, v)| to_units(v, token.decimals));
        info!(
            run_id = %run.id,
            stage = ?stage,
            "✅ {}: {} {} → {}",
            operation,
            amount_in_units,
            amount_in.0.symbol,
            amount_out
                .map(|(token, v)| format!("{} {}", to_units(v, token.decimals), token.symbol))
                .unwrap_or_default(),
        );
        run.record(RunStep {
            stage,
            operation: operation.to_string(),
            success: true,
            amount_in: Some(amount_in_units),
            amount_out: amount_out_units,
            tx_hashes: tx_hash.into_iter().collect(),
            error: None,
            error_category: None,
            timestamp: Utc::now(),
        });
    }

    fn fail(&self, run: &mut ArbitrageRun, stage: RunStage, operation: &str, err: &SwapError) {
        error!(run_id = %run.id, stage = ?stage, category = ?err.category(), "❌ {} failed: {}", operation, err);
        run.record(RunStep {
            stage,
            operation: operation.to_string(),
            success: false,
            amount_in: None,
            amount_out: None,
            tx_hashes: err.tx_hash().into_iter().collect(),
            error: Some(err.to_string()),
            error_category: Some(err.category()),
            timestamp: Utc::now(),
        });
        run.halt(stage, operation, err.to_string());
    }

    async fn snapshot(&self) -> BotResult<HashMap<Address, U256>> {
        let addresses: Vec<Address> = self.layout.tracked.iter().map(|t| t.address).collect();
        let balances = read_balances(self.chain.as_ref(), self.chain.account(), &addresses).await?;
        Ok(addresses.into_iter().zip(balances).collect())
    }

    /// Re-reads balances, computes realized P&L on the accounting asset and
    /// lists everything else the run left behind.
    async fn report(&self, mut run: ArbitrageRun, ctx: &RunContext) -> ArbitrageRun {
        let base = &self.layout.currency.base;

        match self.snapshot().await {
            Ok(current) => {
                let mut residual_value = Decimal::ZERO;
                let mut priced = false;

                for token in &self.layout.tracked {
                    let held = current.get(&token.address).copied().unwrap_or_default();
                    run.balances.push(TokenBalance {
                        symbol: token.symbol.clone(),
                        address: token.address,
                        amount: to_units(held, token.decimals),
                    });

                    if token.address == base.address {
                        let final_base = to_units(held, base.decimals);
                        run.final_base_balance = Some(final_base);
                        run.profit = run.initial_base_balance.and_then(|start| final_base.checked_sub(start));
                        continue;
                    }

                    // Without a starting snapshot nothing can be attributed to this run.
                    let Some(initial) = &ctx.initial_balances else { continue };
                    let before = initial.get(&token.address).copied().unwrap_or_default();
                    if held > before {
                        let gained = to_units(held - before, token.decimals);
                        if let Some(price) = ctx.observed_prices.get(&token.address) {
                            residual_value = gained
                                .checked_mul(*price)
                                .and_then(|value| residual_value.checked_add(value))
                                .unwrap_or(Decimal::MAX);
                            priced = true;
                        }
                        run.residuals.push(TokenBalance {
                            symbol: token.symbol.clone(),
                            address: token.address,
                            amount: gained,
                        });
                    }
                }

                if priced {
                    run.residual_value_estimate = Some(residual_value);
                }
            }
            Err(e) => error!(run_id = %run.id, "❌ Could not read final balances: {}", e),
        }

        if !run.is_halted() {
            run.outcome = RunOutcome::Completed;
        }
        run.finished_at = Some(Utc::now());

        match &run.outcome {
            RunOutcome::PartialSequenceFailure { failed_stage, operation, reason } => warn!(
                run_id = %run.id,
                "🛑 Run halted at {:?} during {}: {}",
                failed_stage, operation, reason
            ),
            _ => info!(
                run_id = %run.id,
                profit = ?run.profit,
                "🏁 Run complete"
            ),
        }
        run
    }
}

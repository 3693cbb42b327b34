//! Balancing YES and NO holdings of a conditional pair
//!
//! Merging only consumes matched pairs, so any excess on one side is traded
//! against the base asset first. Reconciliation is best-effort: a failed trade
//! is reported as a residual rather than aborting the run.

use alloy::primitives::U256;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use crate::{
    config::ExecutionSettings,
    errors::SwapError,
    network::ChainAccess,
    types::{ConditionalPair, ExecutionResult, Pool, SwapIntent, Token},
    utils::{from_units, signed_diff, to_units},
    venues::SwapVenue,
};

/// Holdings left unmatched after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Residual {
    pub token: Token,
    pub amount: U256,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub yes_after: U256,
    pub no_after: U256,
    pub trade: Option<ExecutionResult>,
    pub residual: Option<Residual>,
}

impl ReconcileOutcome {
    fn untouched(yes: U256, no: U256) -> Self {
        Self {
            yes_after: yes,
            no_after: no,
            trade: None,
            residual: None,
        }
    }

    pub fn matched(&self) -> U256 {
        self.yes_after.min(self.no_after)
    }
}

pub struct BalanceReconciler {
    venues: Arc<dyn SwapVenue>,
    chain: Arc<dyn ChainAccess>,
    /// YES/base pool used to trade the YES side.
    yes_pool: Pool,
    settings: ExecutionSettings,
}

impl BalanceReconciler {
    pub fn new(
        venues: Arc<dyn SwapVenue>,
        chain: Arc<dyn ChainAccess>,
        yes_pool: Pool,
        settings: ExecutionSettings,
    ) -> Self {
        Self {
            venues,
            chain,
            yes_pool,
            settings,
        }
    }

    /// Trades the YES side toward the NO side. `yes_pool_price` is the price
    /// of YES in the base asset, used to pre-check the cost of buying YES;
    /// without it the buy goes straight to the quote.
    pub async fn reconcile(
        &self,
        pair: &ConditionalPair,
        yes_available: U256,
        no_available: U256,
        yes_pool_price: Option<Decimal>,
    ) -> ReconcileOutcome {
        let dust = match from_units(self.settings.dust_epsilon, pair.yes.decimals) {
            Ok(dust) => dust,
            Err(e) => {
                warn!("⚠️ Invalid dust tolerance: {}", e);
                U256::ZERO
            }
        };

        let (diff, yes_larger) = signed_diff(yes_available, no_available);
        if diff <= dust {
            info!("⚖️ {} / {} already balanced", pair.yes.symbol, pair.no.symbol);
            return ReconcileOutcome::untouched(yes_available, no_available);
        }

        if yes_larger {
            self.sell_excess_yes(pair, yes_available, no_available, diff).await
        } else {
            self.buy_missing_yes(pair, yes_available, no_available, diff, yes_pool_price).await
        }
    }

    async fn sell_excess_yes(&self, pair: &ConditionalPair, yes: U256, no: U256, excess: U256) -> ReconcileOutcome {
        info!(
            "⚖️ Selling {} excess {} for {}",
            to_units(excess, pair.yes.decimals),
            pair.yes.symbol,
            pair.base.symbol
        );
        let intent = SwapIntent::exact_in(&pair.yes, &pair.base, excess, &self.yes_pool);

        match self.venues.execute_exact_in(&intent).await {
            Ok(trade) => ReconcileOutcome {
                yes_after: yes.saturating_sub(trade.realized_delta_in),
                no_after: no,
                trade: Some(trade),
                residual: None,
            },
            Err(e) => self.unreconciled(&pair.yes, yes, no, excess, &e),
        }
    }

    async fn buy_missing_yes(
        &self,
        pair: &ConditionalPair,
        yes: U256,
        no: U256,
        shortfall: U256,
        yes_pool_price: Option<Decimal>,
    ) -> ReconcileOutcome {
        if let Some(price) = yes_pool_price {
            if let Some(outcome) = self.check_affordable(pair, yes, no, shortfall, price).await {
                return outcome;
            }
        }

        info!(
            "⚖️ Buying {} missing {} with {}",
            to_units(shortfall, pair.yes.decimals),
            pair.yes.symbol,
            pair.base.symbol
        );
        let wanted = SwapIntent::exact_out(&pair.base, &pair.yes, shortfall, &self.yes_pool);
        let result = match self.venues.quote_exact_out(&wanted).await {
            Ok(quote) => {
                let spend = SwapIntent::exact_in(&pair.base, &pair.yes, quote.amount_in, &self.yes_pool);
                self.venues.execute_exact_in(&spend).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(trade) => ReconcileOutcome {
                yes_after: yes + trade.realized_delta_out,
                no_after: no,
                trade: Some(trade),
                residual: None,
            },
            Err(e) => self.unreconciled(&pair.no, yes, no, shortfall, &e),
        }
    }

    /// Returns a partial outcome when the base balance cannot cover the
    /// estimated cost of `shortfall` YES at `price`.
    async fn check_affordable(
        &self,
        pair: &ConditionalPair,
        yes: U256,
        no: U256,
        shortfall: U256,
        price: Decimal,
    ) -> Option<ReconcileOutcome> {
        let base_balance = match self.chain.balance_of(pair.base.address, self.chain.account()).await {
            Ok(balance) => balance,
            Err(e) => return Some(self.unreconciled(&pair.no, yes, no, shortfall, &SwapError::from(e))),
        };

        let estimated = match to_units(shortfall, pair.yes.decimals)
            .checked_mul(price)
            .and_then(|cost| cost.checked_mul(Decimal::ONE + self.settings.price_tolerance))
        {
            Some(estimated) => estimated,
            None => {
                let e = SwapError::InvalidAmount {
                    reason: format!(
                        "cost of {} {} at {} overflows",
                        to_units(shortfall, pair.yes.decimals),
                        pair.yes.symbol,
                        price
                    ),
                };
                return Some(self.unreconciled(&pair.no, yes, no, shortfall, &e));
            }
        };
        let estimated_cost = match from_units(estimated, pair.base.decimals) {
            Ok(cost) => cost,
            Err(e) => return Some(self.unreconciled(&pair.no, yes, no, shortfall, &e)),
        };

        if base_balance < estimated_cost {
            let reason = format!(
                "need ~{} {} to buy {} {}, hold {}",
                estimated,
                pair.base.symbol,
                to_units(shortfall, pair.yes.decimals),
                pair.yes.symbol,
                to_units(base_balance, pair.base.decimals)
            );
            warn!("⚠️ Partial reconcile: {}", reason);
            return Some(ReconcileOutcome {
                yes_after: yes,
                no_after: no,
                trade: None,
                residual: Some(Residual {
                    token: pair.no.clone(),
                    amount: shortfall,
                    reason,
                }),
            });
        }
        None
    }

    fn unreconciled(&self, excess_token: &Token, yes: U256, no: U256, amount: U256, error: &SwapError) -> ReconcileOutcome {
        warn!("⚠️ Reconcile failed, leaving {} {} unmatched: {}", to_units(amount, excess_token.decimals), excess_token.symbol, error);
        ReconcileOutcome {
            yes_after: yes,
            no_after: no,
            trade: None,
            residual: Some(Residual {
                token: excess_token.clone(),
                amount,
                reason: error.to_string(),
            }),
        }
    }
}

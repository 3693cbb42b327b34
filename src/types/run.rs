//! Arbitrage run records

use alloy::primitives::{Address, TxHash};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use crate::errors::ErrorCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Buy the company token on the spot venue and sell it through the conditional markets.
    SellSynthetic,
    /// Assemble the company token from conditional markets and sell it on the spot venue.
    BuySynthetic,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::SellSynthetic => write!(f, "sell_synthetic"),
            Strategy::BuySynthetic => write!(f, "buy_synthetic"),
        }
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sell_synthetic" | "sell" => Ok(Strategy::SellSynthetic),
            "buy_synthetic" | "buy" => Ok(Strategy::BuySynthetic),
            other => Err(format!("unknown strategy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RunStage {
    Start,
    AcquireBase,
    ConvertToConditional,
    ExecuteLegs,
    Reconcile,
    MergeOrFinalize,
    Report,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunStep {
    pub stage: RunStage,
    pub operation: String,
    pub success: bool,
    pub amount_in: Option<Decimal>,
    pub amount_out: Option<Decimal>,
    pub tx_hashes: Vec<TxHash>,
    pub error: Option<String>,
    pub error_category: Option<ErrorCategory>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenBalance {
    pub symbol: String,
    pub address: Address,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    InProgress,
    Completed,
    PartialSequenceFailure {
        failed_stage: RunStage,
        operation: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ArbitrageRun {
    pub id: String,
    pub strategy: Strategy,
    pub accounting_symbol: String,
    pub amount: Decimal,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// `None` when the starting balance could not be read.
    pub initial_base_balance: Option<Decimal>,
    pub steps: Vec<RunStep>,
    pub final_base_balance: Option<Decimal>,
    /// Realized change in the accounting asset only.
    pub profit: Option<Decimal>,
    /// Non-accounting holdings left over after the run.
    pub residuals: Vec<TokenBalance>,
    /// Market value of residuals, kept apart from `profit`.
    pub residual_value_estimate: Option<Decimal>,
    pub balances: Vec<TokenBalance>,
    pub halted_at: Option<RunStage>,
    pub outcome: RunOutcome,
}

impl ArbitrageRun {
    pub fn start(strategy: Strategy, accounting_symbol: &str, amount: Decimal, initial_base_balance: Option<Decimal>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            strategy,
            accounting_symbol: accounting_symbol.to_string(),
            amount,
            started_at: Utc::now(),
            finished_at: None,
            initial_base_balance,
            steps: Vec::new(),
            final_base_balance: None,
            profit: None,
            residuals: Vec::new(),
            residual_value_estimate: None,
            balances: Vec::new(),
            halted_at: None,
            outcome: RunOutcome::InProgress,
        }
    }

    pub fn record(&mut self, step: RunStep) {
        self.steps.push(step);
    }

    pub fn halt(&mut self, stage: RunStage, operation: &str, reason: String) {
        self.halted_at = Some(stage);
        self.outcome = RunOutcome::PartialSequenceFailure {
            failed_stage: stage,
            operation: operation.to_string(),
            reason,
        };
    }

    pub fn is_halted(&self) -> bool {
        self.halted_at.is_some()
    }

    pub fn step(&self, operation: &str) -> Option<&RunStep> {
        self.steps.iter().find(|s| s.operation == operation)
    }

    pub fn operation_reports(&self) -> Vec<OperationReport> {
        self.steps.iter().map(OperationReport::from).collect()
    }
}

/// Uniform result shape handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct OperationReport {
    pub operation: String,
    pub success: bool,
    pub amounts: Vec<(String, Decimal)>,
    pub tx_hash: Option<TxHash>,
    pub error: Option<String>,
}

impl From<&RunStep> for OperationReport {
    fn from(step: &RunStep) -> Self {
        let amounts = [("in", step.amount_in), ("out", step.amount_out)]
            .into_iter()
            .filter_map(|(label, amount)| amount.map(|a| (label.to_string(), a)))
            .collect();

        Self {
            operation: step.operation.clone(),
            success: step.success,
            amounts,
            tx_hash: step.tx_hashes.last().copied(),
            error: step.error.clone(),
        }
    }
}

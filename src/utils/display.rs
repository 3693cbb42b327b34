//! Display and printing utilities

use std::collections::HashMap;
use std::time::Instant;
use rust_decimal::Decimal;
use tracing::{info, warn, error};
use crate::{
    arbitrage::BundlePreview,
    errors::CircuitBreaker,
    types::{ArbitrageRun, MarketPrices, PriceSignal, RunOutcome, SwapIntent, SwapQuote, Token},
    utils::to_units,
};

pub struct SessionStats<'a> {
    pub start_time: Instant,
    pub cycles: u64,
    pub signals: u64,
    pub runs: u64,
    pub completed_runs: u64,
    pub realized_profit: Decimal,
    pub accounting_symbol: &'a str,
    pub error_counts: &'a HashMap<String, u32>,
}

pub async fn print_session_stats(stats: &SessionStats<'_>, circuit_breaker: &CircuitBreaker) {
    let runtime = stats.start_time.elapsed().as_secs() / 60;

    info!("\n📊 Session Statistics ({} minutes)", runtime);
    info!("   📈 MONITORING:");
    info!("     Price cycles: {}", stats.cycles);
    info!("     Signals above threshold: {}", stats.signals);

    info!("   🚀 RUNS:");
    info!("     Total runs: {}", stats.runs);
    info!("     Completed: {}", stats.completed_runs);
    info!("     Completion rate: {:.1}%",
        if stats.runs > 0 {
            (stats.completed_runs as f64 / stats.runs as f64) * 100.0
        } else {
            0.0
        }
    );
    info!("     Realized P&L: {} {}", stats.realized_profit, stats.accounting_symbol);

    info!("   ⚙️  SYSTEM:");
    info!("     Circuit breaker: {}",
        if *circuit_breaker.is_open.read().await { "OPEN" } else { "CLOSED" }
    );

    if !stats.error_counts.is_empty() {
        info!("     Error summary:");
        for (error_type, count) in stats.error_counts.iter() {
            info!("       {}: {}", error_type, count);
        }
    }

    info!("");
}

pub fn print_market_prices(prices: &MarketPrices) {
    info!("💹 Prices @ {}", prices.observed_at.format("%H:%M:%S"));
    info!("   YES: {:.6}  NO: {:.6}  p: {:.4}", prices.yes_price, prices.no_price, prices.probability);
    if prices.raw_probability != prices.probability {
        warn!("   Raw probability {:.4} was capped", prices.raw_probability);
    }
    info!("   Synthetic: {:.6}  Spot: {:.6}", prices.synthetic_price, prices.spot_price);
    info!("   Wrapped spot: {:.6}  Vault ratio: {:.6}", prices.wrapped_spot_price, prices.wrapped_ratio);
}

pub fn print_price_signal(signal: &PriceSignal) {
    warn!("\n🎯 PRICE SIGNAL #{}", signal.id);
    warn!("📋 Strategy: {}", signal.strategy);
    warn!("   Spot:      {:.6}", signal.spot_price);
    warn!("   Synthetic: {:.6}", signal.synthetic_price);
    warn!("   Spread:    {:.3}%", signal.spread_pct);
    warn!("   Probability: {:.4}", signal.probability);
}

pub fn print_swap_quote(intent: &SwapIntent, quote: &SwapQuote) {
    info!("💱 Quote {}", intent.describe());
    info!("   In:  {} {}", amount(quote.amount_in, &intent.token_in), intent.token_in.symbol);
    info!("   Out: {} {}", amount(quote.amount_out, &intent.token_out), intent.token_out.symbol);
    info!("   Min out: {} {}", amount(quote.minimum_out, &intent.token_out), intent.token_out.symbol);
    match quote.price_limit {
        Some(limit) => info!("   Price limit: {}", limit),
        None => info!("   Price limit: n/a"),
    }
}

pub fn print_run_summary(run: &ArbitrageRun) {
    match &run.outcome {
        RunOutcome::Completed => warn!("\n✅ ARBITRAGE RUN #{}", run.id),
        RunOutcome::PartialSequenceFailure { failed_stage, operation, reason } => {
            error!("\n❌ ARBITRAGE RUN HALTED #{}", run.id);
            error!("   Stage: {:?}", failed_stage);
            error!("   Operation: {}", operation);
            error!("   Reason: {}", reason);
        }
        RunOutcome::InProgress => warn!("\n⏳ ARBITRAGE RUN #{} (unfinished)", run.id),
    }

    warn!("📋 Strategy: {}  Amount: {} {}", run.strategy, run.amount, run.accounting_symbol);
    warn!("📝 Operations:");
    for report in run.operation_reports() {
        let mark = if report.success { "✅" } else { "❌" };
        let amounts: Vec<String> = report.amounts.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        warn!("   {} {} {}", mark, report.operation, amounts.join(" "));
        if let Some(tx_hash) = report.tx_hash {
            warn!("      tx {}", tx_hash);
        }
        if let Some(err) = &report.error {
            warn!("      error: {}", err);
        }
    }

    warn!("💰 Result:");
    match run.initial_base_balance {
        Some(start) => warn!("   Start:  {} {}", start, run.accounting_symbol),
        None => warn!("   Start:  unknown, P&L not computed"),
    }
    if let Some(final_balance) = run.final_base_balance {
        warn!("   Final:  {} {}", final_balance, run.accounting_symbol);
    }
    if let Some(profit) = run.profit {
        warn!("   P&L:    {} {}", profit, run.accounting_symbol);
    }
    if !run.residuals.is_empty() {
        warn!("📦 Residuals:");
        for residual in &run.residuals {
            warn!("   {} {}", residual.amount, residual.symbol);
        }
        if let Some(value) = run.residual_value_estimate {
            warn!("   Estimated value: {} {} (not in P&L)", value, run.accounting_symbol);
        }
    }
}

pub fn print_bundle_preview(preview: &BundlePreview) {
    let headline = if preview.succeeded() { "✅" } else { "❌" };
    warn!(
        "\n{} BUNDLE PREVIEW ({} currency → {} company token split)",
        headline, preview.amount, preview.company_amount
    );
    for (i, step) in preview.steps.iter().enumerate() {
        let status = if step.reverted {
            "reverted"
        } else if step.unreliable {
            "unreliable"
        } else {
            "ok"
        };
        warn!("   {}. {} [{}]", i + 1, step.label, status);
        if let Some(reason) = &step.revert_reason {
            warn!("      reason: {}", reason);
        }
    }
    if let Some(out) = preview.yes_out {
        warn!("   YES leg out: {}", out);
    }
    if let Some(out) = preview.no_out {
        warn!("   NO leg out: {}", out);
    }
}

fn amount(value: alloy::primitives::U256, token: &Token) -> Decimal {
    to_units(value, token.decimals)
}

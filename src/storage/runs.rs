//! Finished arbitrage run storage

use anyhow::Result;
use chrono::Utc;
use tracing::info;
use crate::types::ArbitrageRun;
use super::append_jsonl;

pub fn save_run_report(run: &ArbitrageRun) -> Result<()> {
    let filename = format!("output/runs/runs_{}.jsonl",
        Utc::now().format("%Y-%m-%d"));

    append_jsonl(&filename, run)?;

    info!(
        run_id = %run.id,
        strategy = %run.strategy,
        outcome = ?run.outcome,
        profit = ?run.profit,
        "Saved arbitrage run"
    );

    Ok(())
}

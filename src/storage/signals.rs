//! Price signal storage

use anyhow::Result;
use chrono::Utc;
use tracing::debug;
use crate::types::PriceSignal;
use super::append_jsonl;

pub fn save_price_signal(signal: &PriceSignal) -> Result<()> {
    let filename = format!("output/signals/signals_{}.jsonl",
        Utc::now().format("%Y-%m-%d"));

    append_jsonl(&filename, signal)?;

    debug!(
        signal_id = %signal.id,
        strategy = %signal.strategy,
        spread_pct = %signal.spread_pct,
        "Saved price signal"
    );

    Ok(())
}

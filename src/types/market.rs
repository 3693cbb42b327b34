//! Market price snapshots and strategy signals

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use super::Strategy;

#[derive(Debug, Clone, Serialize)]
pub struct MarketPrices {
    /// Company YES priced in currency YES.
    pub yes_price: Decimal,
    /// Company NO priced in currency NO.
    pub no_price: Decimal,
    /// Currency YES priced in plain currency, capped at 1.
    pub probability: Decimal,
    pub raw_probability: Decimal,
    pub synthetic_price: Decimal,
    /// Wrapped company token priced in currency on the spot venue.
    pub wrapped_spot_price: Decimal,
    /// Underlying assets per wrapped share.
    pub wrapped_ratio: Decimal,
    pub spot_price: Decimal,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceSignal {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub strategy: Strategy,
    pub spot_price: Decimal,
    pub synthetic_price: Decimal,
    pub spread_pct: Decimal,
    pub probability: Decimal,
}

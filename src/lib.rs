//! Futarchy Arbitrage Bot - spot vs synthetic arbitrage on Gnosis Chain
//!
//! Buys or sells a company token against its synthetic price assembled from
//! futarchy conditional markets. Quotes are dry-run against a bundle
//! simulator; executions are measured by re-reading balances.

pub mod config;
pub mod types;
pub mod errors;
pub mod contracts;
pub mod network;
pub mod pricing;
pub mod simulation;
pub mod execution;
pub mod venues;
pub mod conditional;
pub mod reconcile;
pub mod arbitrage;
pub mod utils;
pub mod storage;

// Re-export commonly used items
pub use config::{Config, MarketConfig};
pub use errors::{BotError, BotResult, SwapError};
pub use types::*;

// Type alias for our concrete provider
pub type ConcreteProvider = alloy::providers::RootProvider<alloy::transports::BoxTransport>;

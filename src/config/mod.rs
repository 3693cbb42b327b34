//! Configuration for the futarchy arbitrage bot
//!
//! `Config` carries runtime settings read from the environment and
//! `MarketConfig` the static token/pool/venue layout. Both are built once in
//! `main` and handed to constructors.

pub mod settings;
pub mod addresses;
pub mod market;

pub use settings::*;
pub use addresses::*;
pub use market::*;

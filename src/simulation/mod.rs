//! Bundle simulation against a state-forking remote simulator
//!
//! A bundle is simulated atomically: each entry sees the state left behind by
//! the entries before it. The adapter encodes nothing venue-specific; callers
//! hand it prepared transactions together with the output shape they expect.

pub mod decode;
pub mod tenderly;

pub use decode::*;
pub use tenderly::*;

use async_trait::async_trait;
use thiserror::Error;
use crate::{
    errors::{BotError, SwapError},
    types::{SimulationCall, SimulationResult},
};

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("simulator unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("simulator did not answer within {0}s")]
    Timeout(u64),

    #[error("simulator returned HTTP {status}: {body}")]
    Server { status: u16, body: String },

    #[error("malformed simulator response: {0}")]
    Malformed(String),

    #[error("simulator returned {got} results for {expected} transactions")]
    CountMismatch { expected: usize, got: usize },
}

impl From<SimulationError> for SwapError {
    fn from(e: SimulationError) -> Self {
        SwapError::QuoteFailure { message: e.to_string() }
    }
}

impl From<SimulationError> for BotError {
    fn from(e: SimulationError) -> Self {
        BotError::Simulation { message: e.to_string() }
    }
}

#[async_trait]
pub trait BundleSimulator: Send + Sync {
    /// Simulates `calls` in order as one bundle. Either every entry gets a
    /// result or the whole call fails.
    async fn simulate(&self, calls: &[SimulationCall]) -> Result<Vec<SimulationResult>, SimulationError>;
}

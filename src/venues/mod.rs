//! Swap venues behind one interface

pub mod algebra;
pub mod balancer;
pub mod executor;
pub mod passthrough;
pub mod registry;

pub use executor::*;
pub use registry::*;

use async_trait::async_trait;
use crate::{
    errors::SwapError,
    types::{ExecutionResult, SwapIntent, SwapQuote},
};

#[async_trait]
pub trait SwapVenue: Send + Sync {
    /// Expected output for a fixed input, without side effects.
    async fn quote_exact_in(&self, intent: &SwapIntent) -> Result<SwapQuote, SwapError>;

    /// Required input for a fixed output, without side effects.
    async fn quote_exact_out(&self, intent: &SwapIntent) -> Result<SwapQuote, SwapError>;

    /// Quotes, re-derives the price limit, sends the swap and reports the
    /// realized balance deltas.
    async fn execute_exact_in(&self, intent: &SwapIntent) -> Result<ExecutionResult, SwapError>;
}

//! Venue selection by pool configuration

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use crate::{
    config::{ExecutionSettings, MarketConfig},
    errors::SwapError,
    network::ChainAccess,
    simulation::BundleSimulator,
    types::{ExecutionResult, Pool, SwapIntent, SwapQuote, VenueKind},
    venues::{SwapVenue, VenueExecutor, VenueService},
};

/// One service per venue kind, chosen from the pool's configured venue.
pub struct VenueRegistry {
    services: HashMap<VenueKind, VenueService>,
}

impl VenueRegistry {
    pub fn new(
        market: &MarketConfig,
        chain: Arc<dyn ChainAccess>,
        simulator: Option<Arc<dyn BundleSimulator>>,
        settings: &ExecutionSettings,
    ) -> Self {
        let services = [VenueKind::PassthroughV3, VenueKind::Algebra, VenueKind::BalancerBatch]
            .into_iter()
            .map(|kind| {
                let service = VenueService::new(
                    VenueExecutor::for_kind(kind, market),
                    chain.clone(),
                    simulator.clone(),
                    settings.clone(),
                );
                (kind, service)
            })
            .collect();
        Self { services }
    }

    pub fn service_for(&self, pool: &Pool) -> Result<&VenueService, SwapError> {
        self.services.get(&pool.venue).ok_or(SwapError::Unsupported {
            venue: pool.venue.name(),
            operation: "swaps (venue not registered)",
        })
    }
}

#[async_trait]
impl SwapVenue for VenueRegistry {
    async fn quote_exact_in(&self, intent: &SwapIntent) -> Result<SwapQuote, SwapError> {
        self.service_for(&intent.pool)?.quote_exact_in(intent).await
    }

    async fn quote_exact_out(&self, intent: &SwapIntent) -> Result<SwapQuote, SwapError> {
        self.service_for(&intent.pool)?.quote_exact_out(intent).await
    }

    async fn execute_exact_in(&self, intent: &SwapIntent) -> Result<ExecutionResult, SwapError> {
        self.service_for(&intent.pool)?.execute_exact_in(intent).await
    }
}

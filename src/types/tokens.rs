//! Tokens, conditional pairs and pools

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
}

impl Token {
    pub fn new(symbol: impl Into<String>, address: Address, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            address,
            decimals,
        }
    }
}

/// A collateral token and the YES/NO positions minted 1:1 against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionalPair {
    pub base: Token,
    pub yes: Token,
    pub no: Token,
}

impl ConditionalPair {
    pub fn side(&self, side: Outcome) -> &Token {
        match side {
            Outcome::Yes => &self.yes,
            Outcome::No => &self.no,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Yes,
    No,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Yes => write!(f, "YES"),
            Outcome::No => write!(f, "NO"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueKind {
    /// Uniswap-v3 style pool driven through the passthrough router.
    PassthroughV3,
    /// Algebra (Swapr) single-pool router.
    Algebra,
    /// Balancer v3 batch router over a weighted pool.
    BalancerBatch,
}

impl VenueKind {
    pub fn name(&self) -> &'static str {
        match self {
            VenueKind::PassthroughV3 => "passthrough-v3",
            VenueKind::Algebra => "algebra",
            VenueKind::BalancerBatch => "balancer-batch",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pool {
    pub symbol: String,
    pub address: Address,
    pub venue: VenueKind,
    pub token0: Address,
    pub token1: Address,
    pub fee: u32,
}

impl Pool {
    /// Selling token0 moves the pool price down.
    pub fn zero_for_one(&self, token_in: Address) -> bool {
        token_in == self.token0
    }

    pub fn contains(&self, token: Address) -> bool {
        token == self.token0 || token == self.token1
    }
}

//! Infrastructure error types

use alloy::primitives::Address;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
        retry_count: u32,
    },

    #[error("Contract interaction failed: {contract} - {message}")]
    Contract {
        contract: Address,
        message: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Data parsing error: {context}")]
    DataParsing {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Simulation failed: {message}")]
    Simulation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Signing failed: {message}")]
    Signing {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Circuit breaker active: {reason}")]
    CircuitBreakerOpen {
        reason: String,
        cooldown_remaining: Duration,
    },
}

impl BotError {
    pub fn config(message: impl Into<String>) -> Self {
        BotError::Configuration { message: message.into() }
    }

    pub fn parsing(context: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        BotError::DataParsing {
            context: context.into(),
            source: source.into(),
        }
    }
}

pub type BotResult<T> = Result<T, BotError>;

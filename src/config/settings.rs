//! Runtime settings and environment variable handling

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use crate::errors::{BotError, BotResult};
use crate::types::Strategy;

// Execution constants
pub const DEFAULT_PRICE_TOLERANCE: Decimal = dec!(0.05);
pub const MAX_PRICE_TOLERANCE: Decimal = dec!(0.5);
pub const DUST_EPSILON: Decimal = dec!(0.000001);
pub const BALANCE_SHORTFALL_TOLERANCE: Decimal = dec!(0.0001);
pub const RECEIPT_TIMEOUT_SECS: u64 = 120;
pub const SIMULATOR_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_TX_GAS_LIMIT: u64 = 700_000;
pub const DEFAULT_SIMULATION_GAS: u64 = 10_000_000;

// Network constants
pub const GNOSIS_CHAIN_ID: u64 = 100;
pub const DEFAULT_RPC_URL: &str = "https://rpc.gnosischain.com";
pub const TENDERLY_API_BASE: &str = "https://api.tenderly.co/api/v1";

// Monitoring constants
pub const MIN_TRADE_AMOUNT: Decimal = dec!(0.001);
pub const MAX_TRADE_AMOUNT: Decimal = dec!(10000);
pub const DEFAULT_MIN_SPREAD_PCT: Decimal = dec!(1.0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Poll prices and act on signals.
    Monitor,
    /// Run one strategy and exit.
    Once(Strategy),
    /// Simulate the sell-synthetic prefix as a single bundle.
    Preview,
}

#[derive(Debug, Clone)]
pub struct SimulatorSettings {
    pub base_url: String,
    pub account_slug: String,
    pub project_slug: String,
    pub access_key: String,
    pub network_id: u64,
    pub timeout_secs: u64,
}

impl SimulatorSettings {
    pub fn bundle_url(&self) -> String {
        format!(
            "{}/account/{}/project/{}/simulate-bundle",
            self.base_url.trim_end_matches('/'),
            self.account_slug,
            self.project_slug
        )
    }
}

/// Knobs shared by every executor, split/merge and wrapper service.
#[derive(Debug, Clone)]
pub struct ExecutionSettings {
    pub price_tolerance: Decimal,
    pub dust_epsilon: Decimal,
    pub balance_shortfall_tolerance: Decimal,
    pub receipt_timeout: Duration,
    pub gas_limit: u64,
    pub simulation_gas: u64,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            price_tolerance: DEFAULT_PRICE_TOLERANCE,
            dust_epsilon: DUST_EPSILON,
            balance_shortfall_tolerance: BALANCE_SHORTFALL_TOLERANCE,
            receipt_timeout: Duration::from_secs(RECEIPT_TIMEOUT_SECS),
            gas_limit: DEFAULT_TX_GAS_LIMIT,
            simulation_gas: DEFAULT_SIMULATION_GAS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub private_key: Option<String>,
    pub chain_id: u64,
    // Execution
    pub price_tolerance: Decimal,
    pub dust_epsilon: Decimal,
    pub balance_shortfall_tolerance: Decimal,
    pub receipt_timeout_secs: u64,
    pub tx_gas_limit: u64,
    pub simulation_gas: u64,
    // Simulator
    pub simulator: Option<SimulatorSettings>,
    /// Simulator credentials left unset while others were given.
    pub missing_simulator_keys: Vec<&'static str>,
    // Strategy
    pub mode: RunMode,
    /// `ARB_STRATEGY` value that names no mode or strategy.
    pub unknown_strategy: Option<String>,
    pub trade_amount: Decimal,
    pub monitor_interval_secs: u64,
    pub min_spread_pct: Decimal,
    pub auto_execute: bool,
    pub market_config_path: Option<String>,
    // Resilience
    pub max_consecutive_errors: u32,
    pub circuit_breaker_cooldown_secs: u64,
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; `load` uses the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let decimal = |key: &str| lookup(key).and_then(|s| Decimal::from_str(s.trim()).ok());
        let number = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());
        let flag = |key: &str, default: bool| {
            lookup(key)
                .and_then(|s| s.trim().parse::<bool>().ok())
                .unwrap_or(default)
        };

        let chain_id = number("CHAIN_ID").unwrap_or(GNOSIS_CHAIN_ID);

        let credentials = (
            lookup("TENDERLY_ACCESS_KEY"),
            lookup("TENDERLY_ACCOUNT_SLUG"),
            lookup("TENDERLY_PROJECT_SLUG"),
        );
        let missing_simulator_keys: Vec<&'static str> = [
            ("TENDERLY_ACCESS_KEY", credentials.0.is_none()),
            ("TENDERLY_ACCOUNT_SLUG", credentials.1.is_none()),
            ("TENDERLY_PROJECT_SLUG", credentials.2.is_none()),
        ]
        .into_iter()
        .filter_map(|(key, missing)| missing.then_some(key))
        .collect();
        let missing_simulator_keys = if missing_simulator_keys.len() == 3 {
            Vec::new()
        } else {
            missing_simulator_keys
        };

        let simulator = match credentials {
            (Some(access_key), Some(account_slug), Some(project_slug)) => Some(SimulatorSettings {
                base_url: lookup("TENDERLY_BASE_URL").unwrap_or_else(|| TENDERLY_API_BASE.to_string()),
                account_slug,
                project_slug,
                access_key,
                network_id: chain_id,
                timeout_secs: number("SIMULATOR_TIMEOUT_SECS")
                    .unwrap_or(SIMULATOR_TIMEOUT_SECS)
                    .clamp(1, 300),
            }),
            _ => None,
        };

        let mut unknown_strategy = None;
        let mode = match lookup("ARB_STRATEGY").map(|s| s.trim().to_ascii_lowercase()) {
            Some(s) if s == "preview" => RunMode::Preview,
            Some(s) if s == "monitor" || s.is_empty() => RunMode::Monitor,
            Some(s) => match Strategy::from_str(&s) {
                Ok(strategy) => RunMode::Once(strategy),
                Err(_) => {
                    unknown_strategy = Some(s);
                    RunMode::Monitor
                }
            },
            None => RunMode::Monitor,
        };

        Self {
            rpc_url: lookup("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            private_key: lookup("PRIVATE_KEY"),
            chain_id,
            price_tolerance: decimal("PRICE_TOLERANCE")
                .unwrap_or(DEFAULT_PRICE_TOLERANCE)
                .max(Decimal::ZERO)
                .min(MAX_PRICE_TOLERANCE),
            dust_epsilon: decimal("DUST_EPSILON")
                .unwrap_or(DUST_EPSILON)
                .max(Decimal::ZERO),
            balance_shortfall_tolerance: decimal("BALANCE_SHORTFALL_TOLERANCE")
                .unwrap_or(BALANCE_SHORTFALL_TOLERANCE)
                .max(Decimal::ZERO),
            receipt_timeout_secs: number("RECEIPT_TIMEOUT_SECS")
                .unwrap_or(RECEIPT_TIMEOUT_SECS)
                .clamp(5, 900),
            tx_gas_limit: number("TX_GAS_LIMIT").unwrap_or(DEFAULT_TX_GAS_LIMIT),
            simulation_gas: number("SIMULATION_GAS").unwrap_or(DEFAULT_SIMULATION_GAS),
            simulator,
            missing_simulator_keys,
            mode,
            unknown_strategy,
            trade_amount: decimal("TRADE_AMOUNT")
                .unwrap_or(dec!(1))
                .max(MIN_TRADE_AMOUNT)
                .min(MAX_TRADE_AMOUNT),
            monitor_interval_secs: number("MONITOR_INTERVAL_SECS").unwrap_or(60).max(5),
            min_spread_pct: decimal("MIN_SPREAD_PCT")
                .unwrap_or(DEFAULT_MIN_SPREAD_PCT)
                .max(Decimal::ZERO),
            auto_execute: flag("AUTO_EXECUTE", false),
            market_config_path: lookup("MARKET_CONFIG_PATH"),
            max_consecutive_errors: number("MAX_CONSECUTIVE_ERRORS")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(5),
            circuit_breaker_cooldown_secs: number("CIRCUIT_BREAKER_COOLDOWN_SECS").unwrap_or(300),
        }
    }

    pub fn validate(&self) -> BotResult<()> {
        if let Some(value) = &self.unknown_strategy {
            return Err(BotError::config(format!(
                "ARB_STRATEGY '{value}' is not one of monitor, preview, buy_synthetic, sell_synthetic"
            )));
        }
        if !self.missing_simulator_keys.is_empty() {
            return Err(BotError::config(format!(
                "simulator credentials incomplete, missing {}",
                self.missing_simulator_keys.join(", ")
            )));
        }
        if self.price_tolerance >= Decimal::ONE {
            return Err(BotError::config("PRICE_TOLERANCE must be below 1"));
        }
        if self.tx_gas_limit == 0 || self.simulation_gas == 0 {
            return Err(BotError::config("gas limits must be non-zero"));
        }
        let needs_signer = matches!(self.mode, RunMode::Once(_)) || self.auto_execute;
        if needs_signer && self.private_key.is_none() {
            return Err(BotError::config("PRIVATE_KEY is required to submit transactions"));
        }
        if matches!(self.mode, RunMode::Preview) && self.simulator.is_none() {
            return Err(BotError::config(
                "preview mode needs TENDERLY_ACCESS_KEY, TENDERLY_ACCOUNT_SLUG and TENDERLY_PROJECT_SLUG",
            ));
        }
        Ok(())
    }

    pub fn execution_settings(&self) -> ExecutionSettings {
        ExecutionSettings {
            price_tolerance: self.price_tolerance,
            dust_epsilon: self.dust_epsilon,
            balance_shortfall_tolerance: self.balance_shortfall_tolerance,
            receipt_timeout: Duration::from_secs(self.receipt_timeout_secs),
            gas_limit: self.tx_gas_limit,
            simulation_gas: self.simulation_gas,
        }
    }
}

//! Futarchy Arbitrage Bot - Main Entry Point
//!
//! Spot vs synthetic arbitrage on Gnosis Chain futarchy markets

use futarchy_arb_bot::*;
use anyhow::Result;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::{Duration, Instant};
use std::collections::HashMap;
use tokio::time;
use tracing::{info, warn, error, debug};

use futarchy_arb_bot::{
    arbitrage::{ArbitrageOrchestrator, BundlePreviewer},
    conditional::{AssetWrapper, ConditionalTokens, Erc4626Wrapper, FutarchyRouterService},
    config::RunMode,
    network::{AlloyChainAccess, ChainAccess},
    simulation::{BundleSimulator, TenderlyClient},
    venues::{SwapVenue, VenueRegistry},
};

/// Everything a cycle or run needs, wired once at startup.
struct Services {
    market: MarketConfig,
    chain: Arc<dyn ChainAccess>,
    venues: Arc<dyn SwapVenue>,
    wrapper: Arc<dyn AssetWrapper>,
    simulator: Option<Arc<dyn BundleSimulator>>,
    orchestrator: ArbitrageOrchestrator,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    let _logging_guard = utils::setup_logging()?;
    utils::setup_output_directories()?;

    // Load configuration
    let config = Config::load();
    config.validate()?;

    info!("🔮 Futarchy Arbitrage Bot v{}", env!("CARGO_PKG_VERSION"));
    info!("📋 Configuration:");
    info!("   RPC: {} (chain {})", config.rpc_url, config.chain_id);
    info!("   Mode: {:?}", config.mode);
    info!("   Trade Amount: {}", config.trade_amount);
    info!("   Price Tolerance: {}", config.price_tolerance);
    info!("   Simulator: {}", if config.simulator.is_some() { "tenderly" } else { "eth_call only" });
    info!("   Auto Execute: {}", config.auto_execute);

    let market = match &config.market_config_path {
        Some(path) => {
            info!("🗺️  Loading market from {}", path);
            MarketConfig::from_json_file(path)?
        }
        None => MarketConfig::gnosis_default()?,
    };

    let services = build_services(&config, market).await?;

    match config.mode.clone() {
        RunMode::Once(strategy) => {
            let run = services.orchestrator.run(strategy, config.trade_amount).await;
            finish_run(&run);
        }
        RunMode::Preview => run_preview(&config, &services).await?,
        RunMode::Monitor => run_monitor(&config, &services).await,
    }

    Ok(())
}

async fn build_services(config: &Config, market: MarketConfig) -> Result<Services> {
    let settings = config.execution_settings();
    let provider = network::setup_provider(config).await?;
    let chain: Arc<dyn ChainAccess> = Arc::new(AlloyChainAccess::new(
        provider,
        config.private_key.as_deref(),
        config.chain_id,
    )?);

    let simulator: Option<Arc<dyn BundleSimulator>> = match &config.simulator {
        Some(sim) => Some(Arc::new(TenderlyClient::new(sim)?)),
        None => None,
    };

    let venues: Arc<dyn SwapVenue> = Arc::new(VenueRegistry::new(
        &market,
        chain.clone(),
        simulator.clone(),
        &settings,
    ));
    let conditional: Arc<dyn ConditionalTokens> =
        Arc::new(FutarchyRouterService::new(chain.clone(), &market, settings.clone()));
    let wrapper: Arc<dyn AssetWrapper> =
        Arc::new(Erc4626Wrapper::new(chain.clone(), &market, settings.clone())?);

    let orchestrator = ArbitrageOrchestrator::new(
        chain.clone(),
        &market,
        venues.clone(),
        conditional,
        wrapper.clone(),
        settings,
    )?;

    Ok(Services {
        market,
        chain,
        venues,
        wrapper,
        simulator,
        orchestrator,
    })
}

fn finish_run(run: &ArbitrageRun) {
    utils::print_run_summary(run);
    if let Err(e) = storage::save_run_report(run) {
        error!("Failed to save run report: {}", e);
    }
}

async fn run_preview(config: &Config, services: &Services) -> Result<()> {
    let simulator = services
        .simulator
        .clone()
        .ok_or_else(|| anyhow::anyhow!("preview needs a configured simulator"))?;

    let previewer = BundlePreviewer::new(
        services.chain.clone(),
        simulator,
        services.venues.clone(),
        services.wrapper.clone(),
        &services.market,
        config.execution_settings(),
    )?;
    let preview = previewer.preview(config.trade_amount).await?;
    utils::print_bundle_preview(&preview);
    Ok(())
}

/// Monitoring statistics for the session
struct MonitoringState {
    cycles: u64,
    signals: u64,
    runs: u64,
    completed_runs: u64,
    realized_profit: Decimal,
    error_counts: HashMap<String, u32>,
}

impl MonitoringState {
    fn new() -> Self {
        Self {
            cycles: 0,
            signals: 0,
            runs: 0,
            completed_runs: 0,
            realized_profit: Decimal::ZERO,
            error_counts: HashMap::new(),
        }
    }
}

async fn run_monitor(config: &Config, services: &Services) {
    let circuit_breaker = errors::CircuitBreaker::new(
        config.max_consecutive_errors,
        config.circuit_breaker_cooldown_secs,
    );
    let start_time = Instant::now();
    let mut state = MonitoringState::new();
    let accounting_symbol = services
        .market
        .currency_pair()
        .map(|p| p.base.symbol.clone())
        .unwrap_or_default();

    // Setup shutdown handler
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("\n📛 Received shutdown signal (Ctrl+C)...");
        let _ = shutdown_tx.send(());
    });

    info!("\n🚀 Starting price monitor every {}s...\n", config.monitor_interval_secs);

    let mut interval = time::interval(Duration::from_secs(config.monitor_interval_secs));
    let mut stats_interval = time::interval(Duration::from_secs(600));
    stats_interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if !circuit_breaker.can_proceed().await {
                    warn!(
                        "⏸️  Circuit breaker open, {}s until retry",
                        circuit_breaker.cooldown_remaining().await.as_secs()
                    );
                    continue;
                }

                match run_monitoring_cycle(config, services, &mut state).await {
                    Ok(()) => circuit_breaker.record_success().await,
                    Err(e) => {
                        error!("Monitoring cycle error: {}", e);
                        *state.error_counts.entry(error_kind(&e)).or_insert(0) += 1;
                        if circuit_breaker.record_error().await {
                            error!("Circuit breaker activated due to monitoring errors");
                        }
                    }
                }
            }
            _ = stats_interval.tick() => {
                print_stats(&state, &accounting_symbol, start_time, &circuit_breaker).await;
            }
            _ = &mut shutdown_rx => {
                info!("Shutdown signal received, exiting main loop...");
                break;
            }
        }
    }

    print_stats(&state, &accounting_symbol, start_time, &circuit_breaker).await;
}

async fn run_monitoring_cycle(
    config: &Config,
    services: &Services,
    state: &mut MonitoringState,
) -> std::result::Result<(), SwapError> {
    state.cycles += 1;

    let prices = arbitrage::read_market_prices(
        services.chain.as_ref(),
        services.venues.as_ref(),
        services.wrapper.as_ref(),
        &services.market,
    )
    .await?;
    utils::print_market_prices(&prices);

    let Some(signal) = arbitrage::evaluate_signal(&prices, config.min_spread_pct) else {
        debug!("Spread below {}%, nothing to do", config.min_spread_pct);
        return Ok(());
    };

    state.signals += 1;
    utils::print_price_signal(&signal);
    if let Err(e) = storage::save_price_signal(&signal) {
        error!("Failed to save price signal: {}", e);
    }

    if !config.auto_execute {
        info!("AUTO_EXECUTE is off, not trading");
        return Ok(());
    }

    let run = services.orchestrator.run(signal.strategy, config.trade_amount).await;
    state.runs += 1;
    if matches!(run.outcome, RunOutcome::Completed) {
        state.completed_runs += 1;
    }
    if let Some(profit) = run.profit {
        state.realized_profit += profit;
    }
    finish_run(&run);

    Ok(())
}

fn error_kind(e: &SwapError) -> String {
    format!("{:?}", e.category())
}

async fn print_stats(
    state: &MonitoringState,
    accounting_symbol: &str,
    start_time: Instant,
    circuit_breaker: &errors::CircuitBreaker,
) {
    let stats = utils::SessionStats {
        start_time,
        cycles: state.cycles,
        signals: state.signals,
        runs: state.runs,
        completed_runs: state.completed_runs,
        realized_profit: state.realized_profit,
        accounting_symbol,
        error_counts: &state.error_counts,
    };
    utils::print_session_stats(&stats, circuit_breaker).await;
}

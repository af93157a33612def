//! Raceline Server
//!
//! Mirrors race and wagering state from the ledger into memory, serves it
//! over HTTP and WebSocket, and forwards vehicle telemetry to the ledger.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, Overrides};
use raceline_core::cache::StateCache;
use raceline_core::config::ConfigStore;
use raceline_core::events::NotificationBus;
use raceline_core::ledger::{JsonRpcLedger, Ledger};
use raceline_core::market::MarketEngine;
use raceline_core::processors::LedgerSync;
use raceline_core::telemetry::TelemetrySubmitter;
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Raceline - ledger-backed race state and telemetry service
#[derive(Parser, Debug)]
#[command(name = "raceline-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./raceline-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Override the first block of the startup catch-up scan
    #[arg(long)]
    start_block: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting raceline-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(
        &args.config,
        Overrides {
            listen: args.listen,
            start_block: args.start_block,
        },
    ));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let listen_addr = loaded_config.server.listen;
    let ledger_config = loaded_config.ledger;

    // Ledger client
    tracing::info!(rpc_url = %ledger_config.rpc_url, "Connecting to ledger");
    let ledger: Arc<dyn Ledger> = Arc::new(JsonRpcLedger::new(
        ledger_config.rpc_url.clone(),
        ledger_config.request_timeout,
    )?);

    // Core components
    let cache = StateCache::new(Arc::clone(&ledger));
    let engine = MarketEngine::new(cache);
    let bus = NotificationBus::new();
    let submitter = TelemetrySubmitter::new(Arc::clone(&ledger));
    let sync_config = ConfigStore::new(loaded_config.sync);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let state = AppState::new(engine.clone(), bus.clone(), submitter, shutdown_rx.clone());

    // Catch up before serving anything; failure here is fatal.
    let sync = LedgerSync::new(engine, bus, ledger_config.start_block);
    let report = sync.catch_up().await.map_err(|e| {
        tracing::error!("Ledger catch-up failed: {}", e);
        e
    })?;
    state.mark_ready();

    // Live synchronization
    let sync_handles = sync.spawn_listeners(&report, shutdown_rx, sync_config.clone());

    // Spawn config reload handler (listens for SIGHUP)
    let reload_notify = spawn_config_reload_handler(config_loader, sync_config);

    // Build the router
    let router = build_router(state);

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    // The server owns the shutdown sender; dropping it on any exit path
    // also stops the listeners, the writer and open WebSocket streams.
    let result = run_server(router, listen_addr, shutdown_tx).await;
    reload_notify.notify_one();

    for handle in sync_handles {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Synchronization task ended abnormally");
        }
    }
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,raceline_core=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

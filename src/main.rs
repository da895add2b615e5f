//! Binary entry point: loads configuration, wires up the engine, and runs
//! until Ctrl+C.

mod arb;
mod bundle;
mod buffer_pool;
mod config;
mod constants;
mod decode;
mod engine;
mod errors;
mod health;
mod hotlist;
mod ingest;
mod opportunity_log;
mod pool;
mod registry;
mod rpc;
mod types;

use anyhow::Result;
use config::Config;
use engine::Engine;
use solana_sdk::signature::{Keypair, Signer};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info,venue_topology_engine=debug").init();

    info!("starting venue topology engine");

    let config = Config::from_env()?;
    info!(
        grpc_endpoint = %config.grpc_endpoint,
        rpc_endpoint = %config.rpc_endpoint,
        enable_real_trading = config.enable_real_trading,
        "configuration loaded"
    );

    let payer = load_or_generate_payer();
    info!(payer = %payer.pubkey(), "payer keypair ready");

    let hotlist = hotlist::Hotlist::open(std::path::Path::new(&config.hotlist_path))?;
    let seeded = hotlist.load();
    info!(count = seeded.len(), "loaded alt hotlist");

    let engine = Arc::new(Engine::new(config, payer.pubkey())?);
    for address in &seeded {
        engine.alt_cache_handle().seed_known_addresses(std::slice::from_ref(address));
    }

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let health_engine = engine.clone();
    let health_handle = tokio::spawn(async move {
        let thresholds = health::HealthThresholds::default();
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            let registry = health_engine.registry_handle();
            let registry = registry.read().await;
            let orphans = health_engine.orphan_buffer_handle();
            let orphans = orphans.read().await;
            let alt_cache = health_engine.alt_cache_handle();
            let alt_misses = health_engine.alt_miss_tracker_handle();
            let report = health::check(&registry, &orphans, &alt_cache, &alt_misses, &thresholds);
            if !report.healthy {
                warn!(reasons = ?report.reasons, "health check failed");
            }
        }
    });

    let shutdown_handle = tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                let _ = shutdown_tx.send(());
            }
            Err(e) => error!(error = %e, "failed to listen for shutdown signal"),
        }
    });

    let engine_run = engine.clone();
    tokio::select! {
        _ = engine_run.run(shutdown_rx) => {
            info!("engine loop exited");
        }
        _ = shutdown_handle => {
            info!("shutdown handler completed");
        }
    }

    health_handle.abort();

    let stats = engine.stats_snapshot().await;
    info!(
        commits_applied = stats.commits_applied,
        commits_rejected = stats.commits_rejected,
        opportunities_detected = stats.opportunities_detected,
        bundles_built = stats.bundles_built,
        bundles_submitted = stats.bundles_submitted,
        "final engine statistics"
    );

    Ok(())
}

fn load_or_generate_payer() -> Keypair {
    match std::env::var("WALLET_KEYPAIR_PATH") {
        Ok(path) => solana_sdk::signature::read_keypair_file(&path).unwrap_or_else(|e| {
            warn!(error = %e, path, "failed to read wallet keypair file, generating an ephemeral one");
            Keypair::new()
        }),
        Err(_) => {
            warn!("WALLET_KEYPAIR_PATH not set, generating an ephemeral keypair (fine for dry-run/NullSink)");
            Keypair::new()
        }
    }
}

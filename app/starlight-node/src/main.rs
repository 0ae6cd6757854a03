//! Supervisor binary: wires the chain client, block
//! pipeline, reconciliation engine, and sweep engine into one
//! process — a tip-follow ticker and a
//! periodic reconcile-sweep, each a long-lived task, serialized
//! against each other by a shared reconcile mutex, both observing one
//! stop signal.

mod adapters;
mod config;
mod supervisor;

use std::sync::Arc;

use block_pipeline::{BlockMonitor, PipelineConfig};
use chain_client::{EsploraChainClient, RateLimiter};
use reconciliation::ReconcileConfig;

use crate::adapters::{HttpIpfsClient, JsonFileIngestionStore, JsonFileSweepStore, ScannerBridgeClient};
use crate::config::Config;
use crate::supervisor::{PeriodicDeps, Supervisor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let config = Config::from_env();
    tracing::info!(network = ?config.network.network, blocks_dir = %config.blocks_dir.display(), "starlight-node starting");

    let rate_limiter = Arc::new(RateLimiter::default_public_api());
    let chain_client = Arc::new(EsploraChainClient::new(config.chain_client_bases(), rate_limiter));

    let ingestion_dir = config.state_dir.join("ingestion");
    let tasks_dir = config.state_dir.join("tasks");
    let ingestion_store = Arc::new(JsonFileIngestionStore::new(ingestion_dir));
    let sweep_store = Arc::new(JsonFileSweepStore::new(tasks_dir));
    let ipfs = Arc::new(HttpIpfsClient::new(config.ipfs_api_base.clone()));
    let scanner = Arc::new(ScannerBridgeClient::new(config.scanner_api_base.clone()));

    let reconcile_config = ReconcileConfig {
        network: config.network.network,
        uploads_dir: config.uploads_dir.clone(),
        donation_address: config.donation_address.clone(),
        sweep_fee_rate: config.sweep_fee_rate,
    };

    let mut pipeline_config = PipelineConfig::default();
    pipeline_config.blocks_dir = config.blocks_dir.clone();

    let monitor = Arc::new(BlockMonitor::new(
        chain_client.clone(),
        scanner.clone(),
        ingestion_store.clone(),
        ipfs.clone(),
        sweep_store.clone(),
        pipeline_config.clone(),
        reconcile_config.clone(),
        Arc::new(tokio::sync::Mutex::new(())),
    ));

    let periodic_deps = PeriodicDeps::default_schedule(
        chain_client,
        scanner,
        ingestion_store,
        ipfs,
        sweep_store,
        reconcile_config,
        config.blocks_dir.clone(),
    );

    let supervisor = Supervisor::start(monitor, pipeline_config.tick_interval, periodic_deps);

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    supervisor.stop().await;

    Ok(())
}

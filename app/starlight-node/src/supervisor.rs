//! Two long-lived worker threads plus a stop signal: the
//! tip-follow ticker and the periodic reconcile-sweep, serialized
//! against each other by the reconcile mutex `BlockMonitor` exposes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use block_pipeline::BlockMonitor;
use chain_client::ChainClient;
use reconciliation::{
    periodic_reconcile_sweep, IngestionStore, IpfsClient, ReconcileConfig, ReprocessBlock, DEFAULT_PERIODIC_BLOCK_COUNT, DEFAULT_PERIODIC_INTERVAL,
};
use scanner_bridge::{not_scanned_response, ScannerClient};
use starlight_types::{BlockArtifact, ScanOptions};
use sweep::SweepStore;
use tokio::sync::watch;

/// Collaborators the periodic job needs that are not already owned by
/// the `BlockMonitor` it runs alongside.
pub struct PeriodicDeps {
    pub chain_client: Arc<dyn ChainClient>,
    pub scanner: Arc<dyn ScannerClient>,
    pub ingestion_store: Arc<dyn IngestionStore>,
    pub ipfs: Arc<dyn IpfsClient>,
    pub sweep_store: Arc<dyn SweepStore>,
    pub reconcile_config: ReconcileConfig,
    pub blocks_dir: PathBuf,
    pub interval: Duration,
    pub block_count: usize,
}

impl PeriodicDeps {
    pub fn default_schedule(
        chain_client: Arc<dyn ChainClient>,
        scanner: Arc<dyn ScannerClient>,
        ingestion_store: Arc<dyn IngestionStore>,
        ipfs: Arc<dyn IpfsClient>,
        sweep_store: Arc<dyn SweepStore>,
        reconcile_config: ReconcileConfig,
        blocks_dir: PathBuf,
    ) -> Self {
        Self {
            chain_client,
            scanner,
            ingestion_store,
            ipfs,
            sweep_store,
            reconcile_config,
            blocks_dir,
            interval: DEFAULT_PERIODIC_INTERVAL,
            block_count: DEFAULT_PERIODIC_BLOCK_COUNT,
        }
    }
}

/// Reloads the most recently processed block directories from disk so
/// they can be re-reconciled. Directories are named
/// `<height>_<hash8>`; `block.json` holds the full serialized
/// artifact written by the pipeline's PERSIST_RAW step.
async fn load_recent_blocks(blocks_dir: &PathBuf, count: usize) -> Vec<(u64, PathBuf, BlockArtifact)> {
    let mut found = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(blocks_dir).await else { return found };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().to_string();
        if name == "reorgs" || name == "recent-blocks.json" {
            continue;
        }
        let Some(height_str) = name.split('_').next() else { continue };
        let Ok(height) = height_str.parse::<u64>() else { continue };
        let block_json = entry.path().join("block.json");
        if let Ok(raw) = tokio::fs::read(&block_json).await {
            if let Ok(artifact) = serde_json::from_slice::<BlockArtifact>(&raw) {
                found.push((height, entry.path(), artifact));
            }
        }
    }
    found.sort_by_key(|(height, _, _)| std::cmp::Reverse(*height));
    found.truncate(count);
    found
}

async fn run_periodic_pass(deps: &PeriodicDeps, now: u64) {
    let loaded = load_recent_blocks(&deps.blocks_dir, deps.block_count).await;
    let mut reprocess: Vec<ReprocessBlock> = Vec::with_capacity(loaded.len());
    for (height, block_dir, artifact) in loaded {
        let scanned = match deps.scanner.scan_block(height, ScanOptions::default()).await {
            Ok(response) => response.inscriptions,
            Err(e) => {
                tracing::warn!(height, error = %e, "periodic reconcile: scanner unavailable, continuing with empty scan results");
                not_scanned_response(&[]).inscriptions
            }
        };
        reprocess.push(ReprocessBlock { artifact, block_dir, scanned });
    }

    if let Err(e) = periodic_reconcile_sweep(
        deps.ingestion_store.as_ref(),
        deps.ipfs.as_ref(),
        deps.sweep_store.as_ref(),
        deps.chain_client.as_ref(),
        &deps.reconcile_config,
        &mut reprocess,
        now,
    )
    .await
    {
        tracing::warn!(error = %e, "periodic reconcile-sweep pass failed");
    }
}

/// Runs the tip-follow ticker until `stop` fires.
pub async fn run_tip_follow_loop(monitor: Arc<BlockMonitor>, tick_interval: Duration, mut stop: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(tick_interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = unix_now();
                if let Err(e) = monitor.tick(now).await {
                    tracing::warn!(error = %e, "pipeline tick failed");
                }
            }
            _ = stop.changed() => {
                if *stop.borrow() {
                    tracing::info!("tip-follow loop stopping");
                    return;
                }
            }
        }
    }
}

/// Runs the periodic reconcile-sweep until `stop` fires,
/// holding `reconcile_mutex` for the duration of each pass so it
/// never overlaps the tip-follow loop's own per-block reconcile step.
pub async fn run_periodic_reconcile_loop(deps: PeriodicDeps, reconcile_mutex: Arc<tokio::sync::Mutex<()>>, mut stop: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(deps.interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = unix_now();
                let _guard = reconcile_mutex.lock().await;
                run_periodic_pass(&deps, now).await;
            }
            _ = stop.changed() => {
                if *stop.borrow() {
                    tracing::info!("periodic reconcile loop stopping");
                    return;
                }
            }
        }
    }
}

/// Spawns both worker threads and returns a handle that stops them.
pub struct Supervisor {
    stop_tx: watch::Sender<bool>,
    tip_follow: tokio::task::JoinHandle<()>,
    periodic: tokio::task::JoinHandle<()>,
}

impl Supervisor {
    pub fn start(monitor: Arc<BlockMonitor>, tick_interval: Duration, periodic_deps: PeriodicDeps) -> Self {
        let (stop_tx, stop_rx1) = watch::channel(false);
        let stop_rx2 = stop_tx.subscribe();
        let reconcile_mutex = monitor.reconcile_mutex();

        let tip_follow = tokio::spawn(run_tip_follow_loop(monitor, tick_interval, stop_rx1));
        let periodic = tokio::spawn(run_periodic_reconcile_loop(periodic_deps, reconcile_mutex, stop_rx2));

        Self { stop_tx, tip_follow, periodic }
    }

    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.tip_follow.await;
        let _ = self.periodic.await;
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

//! Periodic sweep: re-runs block reconciliation over the
//! last B blocks to recover matches missed due to storage latency.

use std::path::PathBuf;
use std::time::Duration;

use chain_client::ChainClient;
use scanner_bridge::ScannedInscription;
use starlight_types::BlockArtifact;
use sweep::SweepStore;

use crate::block::{reconcile_block, ReconcileConfig};
use crate::error::Result;
use crate::traits::{IngestionStore, IpfsClient};

pub const DEFAULT_PERIODIC_INTERVAL: Duration = Duration::from_secs(20 * 60);
pub const DEFAULT_PERIODIC_BLOCK_COUNT: usize = 6;

/// One previously-processed block, reloaded for re-reconciliation.
pub struct ReprocessBlock {
    pub artifact: BlockArtifact,
    pub block_dir: PathBuf,
    pub scanned: Vec<ScannedInscription>,
}

#[allow(clippy::too_many_arguments)]
pub async fn periodic_reconcile_sweep(
    ingestion_store: &dyn IngestionStore,
    ipfs: &dyn IpfsClient,
    sweep_store: &dyn SweepStore,
    chain_client: &dyn ChainClient,
    config: &ReconcileConfig,
    blocks: &mut [ReprocessBlock],
    now: u64,
) -> Result<()> {
    for block in blocks {
        reconcile_block(ingestion_store, ipfs, sweep_store, chain_client, config, &mut block.artifact, &block.block_dir, &block.scanned, now)
            .await?;
    }
    Ok(())
}

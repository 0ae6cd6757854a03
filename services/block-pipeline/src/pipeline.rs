//! The tip-follow state machine `IDLE ->
//! FETCH -> PARSE -> PERSIST_RAW -> SAVE_IMAGES -> SCAN ->
//! BUILD_CONTRACTS -> RECONCILE -> WRITE_SUMMARY -> DONE`.

use std::sync::Arc;

use chain_client::ChainClient;
use reconciliation::{IngestionStore, IpfsClient, ReconcileConfig};
use scanner_bridge::{not_scanned_response, ScanBlockResponse, ScannerClient};
use starlight_types::{BlockArtifact, ProcessingMeta, ScanOptions};
use sweep::SweepStore;
use tokio::sync::{Mutex, RwLock};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::layout::{block_dir_path, images_dir_path, ContractSummary, ImageSummary, InscriptionSummary, InscriptionsJson, StegoScanSummary};
use crate::reorg::detect_and_quarantine;

/// Observability counters for the tip-follow loop, guarded by an
/// internal RW lock so readers never block behind a write longer than
/// the read critical section.
#[derive(Debug, Clone, Default)]
pub struct MonitorStats {
    pub internal_height: u64,
    pub blocks_processed: u64,
    pub blocks_failed: u64,
    pub last_tick_at: Option<u64>,
}

/// Collaborators the pipeline needs, injected at construction.
pub struct BlockMonitor {
    chain_client: Arc<dyn ChainClient>,
    scanner: Arc<dyn ScannerClient>,
    ingestion_store: Arc<dyn IngestionStore>,
    ipfs: Arc<dyn IpfsClient>,
    sweep_store: Arc<dyn SweepStore>,
    config: PipelineConfig,
    reconcile_config: ReconcileConfig,
    stats: RwLock<MonitorStats>,
    /// Serializes this tick's per-block reconcile step against the
    /// periodic reconcile-sweep job. Shared with whatever drives the periodic job.
    reconcile_mutex: Arc<Mutex<()>>,
}

impl BlockMonitor {
    pub fn new(
        chain_client: Arc<dyn ChainClient>,
        scanner: Arc<dyn ScannerClient>,
        ingestion_store: Arc<dyn IngestionStore>,
        ipfs: Arc<dyn IpfsClient>,
        sweep_store: Arc<dyn SweepStore>,
        config: PipelineConfig,
        reconcile_config: ReconcileConfig,
        reconcile_mutex: Arc<Mutex<()>>,
    ) -> Self {
        Self {
            chain_client,
            scanner,
            ingestion_store,
            ipfs,
            sweep_store,
            config,
            reconcile_config,
            stats: RwLock::new(MonitorStats::default()),
            reconcile_mutex,
        }
    }

    pub async fn stats(&self) -> MonitorStats {
        self.stats.read().await.clone()
    }

    /// The mutex the periodic reconcile-sweep job must hold for the
    /// duration of its pass, so it never overlaps this monitor's
    /// per-block reconcile step.
    pub fn reconcile_mutex(&self) -> Arc<Mutex<()>> {
        self.reconcile_mutex.clone()
    }

    /// Runs one tick: reorg detection, then throttled sequential
    /// processing of new heights.
    pub async fn tick(&self, now: u64) -> Result<()> {
        let tip = self.chain_client.current_height().await?;
        let internal_height = self.stats.read().await.internal_height;

        let reorg_heights = detect_and_quarantine(self.chain_client.as_ref(), &self.config.blocks_dir, tip, self.config.reorg_depth).await?;

        let mut to_process: Vec<u64> = if internal_height == 0 {
            let start = tip.saturating_sub(self.config.first_run_seed.saturating_sub(1));
            (start..=tip).collect()
        } else {
            ((internal_height + 1)..=tip).collect()
        };
        for h in reorg_heights {
            if !to_process.contains(&h) {
                to_process.push(h);
            }
        }
        to_process.sort_unstable();
        to_process.dedup();
        to_process.truncate(self.config.max_blocks_per_tick as usize);

        let mut processed_any = false;
        for (i, height) in to_process.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.min_inter_block_sleep).await;
            }
            match self.process_block(*height, now).await {
                Ok(()) => {
                    processed_any = true;
                    let mut stats = self.stats.write().await;
                    if *height == stats.internal_height + 1 || stats.internal_height == 0 {
                        stats.internal_height = (*height).max(stats.internal_height);
                    }
                    stats.blocks_processed += 1;
                }
                Err(e) => {
                    tracing::warn!(height, error = %e, "block processing failed; internal height not advanced");
                    let mut stats = self.stats.write().await;
                    stats.blocks_failed += 1;
                }
            }
        }

        if processed_any {
            crate::layout::rebuild_recent_blocks(&self.config.blocks_dir, now).await?;
        }
        self.stats.write().await.last_tick_at = Some(now);
        Ok(())
    }

    /// FETCH -> PARSE -> PERSIST_RAW -> SAVE_IMAGES -> SCAN ->
    /// BUILD_CONTRACTS -> RECONCILE -> WRITE_SUMMARY -> DONE, for a
    /// single height.
    async fn process_block(&self, height: u64, now: u64) -> Result<()> {
        let start = std::time::Instant::now();

        // FETCH
        let raw_hex = self.chain_client.raw_block_hex(height).await?;
        let raw_bytes = hex::decode(&raw_hex).map_err(|_| {
            block_parser::ParseError::Truncated { field: "raw_block_hex", offset: 0 }
        })?;

        // PARSE
        let (header, transactions) = block_parser::parse_block(&raw_bytes)?;

        let mut artifact = BlockArtifact {
            height,
            header: header.clone(),
            transactions: transactions.clone(),
            inscriptions: Vec::new(),
            smart_contracts: Vec::new(),
            meta: ProcessingMeta::default(),
        };
        let dir_name = artifact.dir_name();
        let block_dir = block_dir_path(&self.config.blocks_dir, &dir_name);

        // PERSIST_RAW
        tokio::fs::create_dir_all(&block_dir).await?;
        tokio::fs::write(block_dir.join("block.hex"), &raw_hex).await?;

        // extraction feeds SAVE_IMAGES and the summary
        artifact.inscriptions = inscription_extractor::extract_block_inscriptions(&transactions);

        let images_dir = images_dir_path(&block_dir);
        tokio::fs::create_dir_all(&images_dir).await?;
        for inscription in &artifact.inscriptions {
            tokio::fs::write(images_dir.join(&inscription.file_name), &inscription.payload).await?;
        }

        tokio::fs::write(block_dir.join("block.json"), serde_json::to_vec_pretty(&artifact)?).await?;

        // SCAN
        let scan_response = self.run_scan(height).await;

        // BUILD_CONTRACTS + RECONCILE
        let reconcile_result = {
            let _guard = self.reconcile_mutex.lock().await;
            reconciliation::reconcile_block(
                self.ingestion_store.as_ref(),
                self.ipfs.as_ref(),
                self.sweep_store.as_ref(),
                self.chain_client.as_ref(),
                &self.reconcile_config,
                &mut artifact,
                &block_dir,
                &scan_response.inscriptions,
                now,
            )
            .await
        };

        if let Err(e) = &reconcile_result {
            tracing::warn!(height, error = %e, "reconciliation error; block summary still written with partial results");
        }

        artifact.meta = ProcessingMeta { processing_time_ms: start.elapsed().as_millis() as u64, success: true, error: None };

        // WRITE_SUMMARY
        let summary = self.build_summary(&artifact, &scan_response, now);
        tokio::fs::write(block_dir.join("inscriptions.json"), serde_json::to_vec_pretty(&summary)?).await?;

        Ok(())
    }

    async fn run_scan(&self, height: u64) -> ScanBlockResponse {
        match self.scanner.scan_block(height, ScanOptions::default()).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(height, error = %e, "scanner unavailable; continuing with empty scan results");
                not_scanned_response(&[])
            }
        }
    }

    fn build_summary(&self, artifact: &BlockArtifact, scan: &ScanBlockResponse, now: u64) -> InscriptionsJson {
        let inscriptions: Vec<InscriptionSummary> = artifact
            .inscriptions
            .iter()
            .enumerate()
            .map(|(idx, i)| InscriptionSummary {
                tx_id: i.txid_hex(),
                input_index: idx,
                content_type: i.content_type.clone(),
                content: if i.content_type.starts_with("text/") { String::from_utf8_lossy(&i.payload).to_string() } else { String::new() },
                size_bytes: i.size_bytes,
                file_name: i.file_name.clone(),
                file_path: i.file_path.clone(),
            })
            .collect();

        let image_formats = ["png", "jpeg", "gif", "webp", "avif"];
        let images: Vec<ImageSummary> = artifact
            .inscriptions
            .iter()
            .filter(|i| image_formats.contains(&i.format.as_str()))
            .map(|i| {
                let scan_result = scan.inscriptions.iter().find(|s| s.file_name == i.file_name).and_then(|s| s.scan_result.clone());
                ImageSummary {
                    tx_id: i.txid_hex(),
                    format: i.format.clone(),
                    size_bytes: i.size_bytes,
                    file_name: i.file_name.clone(),
                    file_path: i.file_path.clone(),
                    scan_result,
                }
            })
            .collect();

        let smart_contracts = artifact
            .smart_contracts
            .iter()
            .map(|c| ContractSummary {
                contract_id: c.contract_id.clone(),
                block_height: c.block_height,
                image_path: c.image_path.clone(),
                confidence: c.confidence,
                metadata: c.metadata.clone(),
            })
            .collect();

        let stego_count = images.iter().filter(|i| i.scan_result.as_ref().is_some_and(|s| s.is_stego)).count() as u32;
        let steganography_scan = (stego_count > 0).then(|| StegoScanSummary {
            total_images: images.len() as u32,
            stego_detected: scan.stego_detected,
            stego_count,
            scan_timestamp: now,
        });

        InscriptionsJson {
            block_height: artifact.height,
            block_hash: artifact.header.hash_hex(),
            timestamp: now,
            total_transactions: artifact.transactions.len() as u32,
            inscriptions,
            images,
            smart_contracts,
            processing_time_ms: artifact.meta.processing_time_ms,
            success: artifact.meta.success,
            steganography_scan,
        }
    }
}

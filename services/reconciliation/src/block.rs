//! Per-block reconciliation orchestration: runs scan-driven then
//! oracle reconciliation in sequence, relocates images, confirms
//! ingestion records, and updates task proofs.

use std::path::Path;

use chain_client::ChainClient;
use scanner_bridge::ScannedInscription;
use starlight_types::{BitcoinNetwork, BlockArtifact, SmartContractRecord};
use sweep::SweepStore;

use crate::candidate::CandidateIndex;
use crate::error::Result;
use crate::oracle::reconcile_oracle_block;
use crate::reorg;
use crate::scan_driven::reconcile_scan_driven;
use crate::tasks::update_task_proofs_and_sweep;
use crate::traits::{IngestionFilter, IngestionStore, IpfsClient};

/// Up to this many recent ingestion records feed the oracle
/// candidate index.
const RECENT_INGESTION_LIMIT: usize = 500;

#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    pub network: BitcoinNetwork,
    pub uploads_dir: std::path::PathBuf,
    pub donation_address: String,
    pub sweep_fee_rate: u64,
}

#[allow(clippy::too_many_arguments)]
pub async fn reconcile_block(
    ingestion_store: &dyn IngestionStore,
    ipfs: &dyn IpfsClient,
    sweep_store: &dyn SweepStore,
    chain_client: &dyn ChainClient,
    config: &ReconcileConfig,
    block: &mut BlockArtifact,
    block_dir: &Path,
    scanned: &[ScannedInscription],
    now: u64,
) -> Result<()> {
    let scan_matches = reconcile_scan_driven(ingestion_store, config.network, &block.inscriptions, &block.transactions, scanned).await;

    for m in &scan_matches {
        confirm_match(ingestion_store, ipfs, config, block, block_dir, &m.contract_id, &m.record, &m.metadata, now).await?;
    }

    let recent = ingestion_store.list_recent(IngestionFilter::default(), RECENT_INGESTION_LIMIT).await.map_err(|e| {
        crate::error::ReconcileError::IngestionStore(e.to_string())
    })?;
    let mut index = CandidateIndex::build(&recent);
    let oracle_matches = reconcile_oracle_block(&mut index, &block.transactions);

    for m in &oracle_matches {
        let Some(record) = recent.iter().find(|r| r.id == m.ingestion_id) else { continue };
        confirm_match(ingestion_store, ipfs, config, block, block_dir, &m.ingestion_id, record, &m.metadata, now).await?;

        let contract_id = record.meta("contract_id").unwrap_or(&m.ingestion_id).to_string();
        if let Some(tx) = block.transactions.iter().find(|t| t.txid_hex() == m.tx_id) {
            update_task_proofs_and_sweep(
                sweep_store,
                chain_client,
                config.network,
                &config.donation_address,
                config.sweep_fee_rate,
                &contract_id,
                tx,
                block.height,
                now,
            )
            .await?;
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn confirm_match(
    ingestion_store: &dyn IngestionStore,
    ipfs: &dyn IpfsClient,
    config: &ReconcileConfig,
    block: &mut BlockArtifact,
    block_dir: &Path,
    contract_id: &str,
    record: &starlight_types::IngestionRecord,
    match_metadata: &std::collections::BTreeMap<String, String>,
    now: u64,
) -> Result<()> {
    let images_dir = block_dir.join("images");
    let relocated = crate::relocate::relocate_ingestion_image(
        ipfs,
        &config.uploads_dir,
        &images_dir,
        &record.id,
        &record.filename,
        record.meta("stego_image_cid"),
        record.meta("ipfs_image_cid"),
        &record.image_base64,
    )
    .await;

    let image_path = match relocated {
        Ok(path) => format!("images/{}", path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default()),
        Err(e) => {
            tracing::warn!(ingestion_id = %record.id, error = %e, "image relocation failed; ingestion left unconfirmed this round");
            return Ok(());
        }
    };

    let mut metadata = record.metadata.clone();
    metadata.extend(match_metadata.clone());
    reorg::apply_confirmation(&mut metadata, match_metadata.get("tx_id").map(String::as_str).unwrap_or(""), block.height);

    let upserted = SmartContractRecord {
        contract_id: contract_id.to_string(),
        block_height: block.height,
        image_path,
        confidence: 1.0,
        metadata: metadata.clone(),
    };
    match block.smart_contracts.iter_mut().find(|c| c.contract_id == contract_id) {
        Some(existing) => *existing = upserted,
        None => block.smart_contracts.push(upserted),
    }

    ingestion_store
        .update_metadata(&record.id, metadata)
        .await
        .map_err(|e| crate::error::ReconcileError::IngestionStore(e.to_string()))?;
    ingestion_store
        .update_status_with_note(&record.id, starlight_types::IngestionStatus::Confirmed, "reconciled")
        .await
        .map_err(|e| crate::error::ReconcileError::IngestionStore(e.to_string()))?;

    let _ = now;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use chain_client::MockChainClient;
    use starlight_types::{BlockHeader, IngestionRecord, IngestionStatus, ProcessingMeta, Transaction};
    use std::collections::BTreeMap;
    use sweep::{MockSweepStore, TaskFilter};

    use crate::traits::{MockIngestionStore, MockIpfsClient};

    fn tx_with_txid_hex(txid_hex: &str) -> Transaction {
        let mut txid = [0u8; 32];
        let mut bytes = hex::decode(txid_hex).unwrap();
        bytes.reverse();
        txid[..bytes.len()].copy_from_slice(&bytes);
        Transaction { version: 2, inputs: vec![], outputs: vec![], locktime: 0, has_witness: false, witnesses: vec![], txid }
    }

    fn empty_artifact(height: u64, tx: Transaction) -> BlockArtifact {
        BlockArtifact {
            height,
            header: BlockHeader { version: 1, prev_hash: [0; 32], merkle_root: [0; 32], timestamp: 0, bits: 0, nonce: 0, hash: [0; 32] },
            transactions: vec![tx],
            inscriptions: vec![],
            smart_contracts: vec![],
            meta: ProcessingMeta::default(),
        }
    }

    /// End-to-end scenario 4: an ingestion record whose
    /// `funding_txid` matches a transaction in the block becomes
    /// confirmed and the block gains a `smart_contracts[]` entry
    /// keyed by the ingestion id with `match_type="funding_txid"`.
    #[tokio::test]
    async fn funding_txid_reconciliation_confirms_ingestion_and_upserts_contract() {
        let txid_hex = "ab".repeat(32);
        let tx = tx_with_txid_hex(&txid_hex);
        let mut block = empty_artifact(100, tx);

        let uploads_dir = tempfile::tempdir().unwrap();
        let block_dir = tempfile::tempdir().unwrap();

        let mut metadata = BTreeMap::new();
        metadata.insert("funding_txid".to_string(), txid_hex.clone());
        let record = IngestionRecord {
            id: "ingestion-1".to_string(),
            filename: "pixel.png".to_string(),
            image_base64: BASE64.encode(b"fake image bytes"),
            status: IngestionStatus::Pending,
            metadata,
        };

        let mut ingestion_store = MockIngestionStore::new();
        ingestion_store.expect_list_recent().returning(move |_, _| Ok(vec![record.clone()]));
        ingestion_store.expect_update_metadata().withf(|id, _| id == "ingestion-1").returning(|_, _| Ok(()));
        ingestion_store
            .expect_update_status_with_note()
            .withf(|id, status, _| id == "ingestion-1" && *status == IngestionStatus::Confirmed)
            .returning(|_, _, _| Ok(()));

        let ipfs = MockIpfsClient::new();

        let mut sweep_store = MockSweepStore::new();
        sweep_store.expect_list_tasks().returning(|_: TaskFilter| Ok(vec![]));

        let chain_client = MockChainClient::new();

        let config = ReconcileConfig {
            network: BitcoinNetwork::Testnet4,
            uploads_dir: uploads_dir.path().to_path_buf(),
            donation_address: String::new(),
            sweep_fee_rate: 1,
        };

        reconcile_block(&ingestion_store, &ipfs, &sweep_store, &chain_client, &config, &mut block, block_dir.path(), &[], 1_700_000_000)
            .await
            .unwrap();

        assert_eq!(block.smart_contracts.len(), 1);
        let contract = &block.smart_contracts[0];
        assert_eq!(contract.contract_id, "ingestion-1");
        assert_eq!(contract.metadata.get("match_type").map(String::as_str), Some("funding_txid"));
        assert_eq!(contract.metadata.get("tx_id").map(String::as_str), Some(txid_hex.to_ascii_lowercase().as_str()));
    }
}

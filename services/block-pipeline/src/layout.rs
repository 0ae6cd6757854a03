//! On-disk contract for the blocks directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use starlight_types::ScanResult;

pub fn block_dir_path(blocks_dir: &Path, dir_name: &str) -> PathBuf {
    blocks_dir.join(dir_name)
}

pub fn reorgs_dir_path(blocks_dir: &Path) -> PathBuf {
    blocks_dir.join("reorgs")
}

pub fn images_dir_path(block_dir: &Path) -> PathBuf {
    block_dir.join("images")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InscriptionSummary {
    pub tx_id: String,
    pub input_index: usize,
    pub content_type: String,
    pub content: String,
    pub size_bytes: usize,
    pub file_name: String,
    pub file_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSummary {
    pub tx_id: String,
    pub format: String,
    pub size_bytes: usize,
    pub file_name: String,
    pub file_path: String,
    pub scan_result: Option<ScanResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractSummary {
    pub contract_id: String,
    pub block_height: u64,
    pub image_path: String,
    pub confidence: f64,
    pub metadata: std::collections::BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StegoScanSummary {
    pub total_images: u32,
    pub stego_detected: u32,
    pub stego_count: u32,
    pub scan_timestamp: u64,
}

/// `inscriptions.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InscriptionsJson {
    pub block_height: u64,
    pub block_hash: String,
    pub timestamp: u64,
    pub total_transactions: u32,
    pub inscriptions: Vec<InscriptionSummary>,
    pub images: Vec<ImageSummary>,
    pub smart_contracts: Vec<ContractSummary>,
    pub processing_time_ms: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steganography_scan: Option<StegoScanSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentBlockSummary {
    pub height: u64,
    pub hash: String,
    pub dir_name: String,
    pub total_transactions: u32,
    pub total_inscriptions: usize,
    pub smart_contracts_count: usize,
    pub processing_time_ms: u64,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentBlocksFile {
    pub blocks: Vec<RecentBlockSummary>,
    pub total: usize,
    pub last_updated: u64,
}

/// Rebuilds `recent-blocks.json` from every `<height>_<hash8>`
/// directory directly under `blocks_dir` (excluding `reorgs/`),
/// keeping the 10 most recent by height.
pub async fn rebuild_recent_blocks(blocks_dir: &Path, now: u64) -> std::io::Result<()> {
    let mut summaries = Vec::new();
    let mut entries = tokio::fs::read_dir(blocks_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if name == "reorgs" || name == "recent-blocks.json" {
            continue;
        }
        let inscriptions_path = entry.path().join("inscriptions.json");
        let Ok(raw) = tokio::fs::read(&inscriptions_path).await else { continue };
        let Ok(parsed) = serde_json::from_slice::<InscriptionsJson>(&raw) else { continue };
        summaries.push(RecentBlockSummary {
            height: parsed.block_height,
            hash: parsed.block_hash,
            dir_name: name,
            total_transactions: parsed.total_transactions,
            total_inscriptions: parsed.inscriptions.len(),
            smart_contracts_count: parsed.smart_contracts.len(),
            processing_time_ms: parsed.processing_time_ms,
            success: parsed.success,
        });
    }

    summaries.sort_by(|a, b| b.height.cmp(&a.height));
    summaries.truncate(10);

    let file = RecentBlocksFile { total: summaries.len(), blocks: summaries, last_updated: now };
    let encoded = serde_json::to_vec_pretty(&file)?;
    tokio::fs::write(blocks_dir.join("recent-blocks.json"), encoded).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn write_block(blocks_dir: &Path, height: u64, hash: &str) {
        let dir_name = format!("{height}_{}", &hash[..8]);
        let dir = blocks_dir.join(&dir_name);
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let json = InscriptionsJson {
            block_height: height,
            block_hash: hash.to_string(),
            timestamp: 0,
            total_transactions: 1,
            inscriptions: Vec::new(),
            images: Vec::new(),
            smart_contracts: Vec::new(),
            processing_time_ms: 5,
            success: true,
            steganography_scan: None,
        };
        tokio::fs::write(dir.join("inscriptions.json"), serde_json::to_vec(&json).unwrap()).await.unwrap();
    }

    #[tokio::test]
    async fn keeps_top_ten_sorted_by_height_descending() {
        let tmp = tempfile::tempdir().unwrap();
        for h in 0..12u64 {
            write_block(tmp.path(), h, &format!("{h:064x}")).await;
        }
        // A `reorgs/` directory with no `inscriptions.json` must be skipped, not error.
        tokio::fs::create_dir_all(tmp.path().join("reorgs")).await.unwrap();

        rebuild_recent_blocks(tmp.path(), 1000).await.unwrap();

        let raw = tokio::fs::read(tmp.path().join("recent-blocks.json")).await.unwrap();
        let parsed: RecentBlocksFile = serde_json::from_slice(&raw).unwrap();
        assert_eq!(parsed.total, 10);
        assert_eq!(parsed.blocks.len(), 10);
        assert_eq!(parsed.blocks[0].height, 11);
        assert_eq!(parsed.blocks[9].height, 2);
        assert!(parsed.blocks.windows(2).all(|w| w[0].height > w[1].height));
        assert_eq!(parsed.last_updated, 1000);
    }
}

//! Tip-region reorg detection and quarantine.

use std::path::Path;

use chain_client::ChainClient;

use crate::error::Result;
use crate::layout::{block_dir_path, reorgs_dir_path, InscriptionsJson};

/// For each height in `[tip-depth+1, tip]`: if a stored directory's
/// recorded hash differs from canonical, quarantine it into
/// `reorgs/`; either way, returns the heights that now have no
/// up-to-date stored directory and must be (re)processed.
pub async fn detect_and_quarantine(chain_client: &dyn ChainClient, blocks_dir: &Path, tip: u64, depth: u64) -> Result<Vec<u64>> {
    let mut needs_processing = Vec::new();
    let start = tip.saturating_sub(depth.saturating_sub(1));

    for height in start..=tip {
        let canonical_hash = chain_client.block_hash(height).await?;

        let stored = find_stored_dir(blocks_dir, height).await;
        match stored {
            Some((_, stored_hash)) if stored_hash == canonical_hash => {}
            Some((dir_name, _)) => {
                quarantine(blocks_dir, &dir_name).await?;
                needs_processing.push(height);
            }
            None => {
                needs_processing.push(height);
            }
        }
    }

    Ok(needs_processing)
}

async fn find_stored_dir(blocks_dir: &Path, height: u64) -> Option<(String, String)> {
    let prefix = format!("{height}_");
    let mut entries = tokio::fs::read_dir(blocks_dir).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.starts_with(&prefix) {
            continue;
        }
        let inscriptions_path = entry.path().join("inscriptions.json");
        if let Ok(raw) = tokio::fs::read(&inscriptions_path).await {
            if let Ok(parsed) = serde_json::from_slice::<InscriptionsJson>(&raw) {
                return Some((name, parsed.block_hash));
            }
        }
    }
    None
}

async fn quarantine(blocks_dir: &Path, dir_name: &str) -> Result<()> {
    let src = block_dir_path(blocks_dir, dir_name);
    let dest_root = reorgs_dir_path(blocks_dir);
    tokio::fs::create_dir_all(&dest_root).await?;
    let dest = dest_root.join(dir_name);

    if tokio::fs::rename(&src, &dest).await.is_err() {
        copy_dir_recursive(&src, &dest).await?;
        tokio::fs::remove_dir_all(&src).await?;
    }

    tracing::warn!(dir = %dir_name, "reorg: quarantined stale block directory");
    Ok(())
}

fn copy_dir_recursive<'a>(src: &'a Path, dest: &'a Path) -> std::pin::Pin<Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + 'a>> {
    Box::pin(async move {
        tokio::fs::create_dir_all(dest).await?;
        let mut entries = tokio::fs::read_dir(src).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            let from = entry.path();
            let to = dest.join(entry.file_name());
            if file_type.is_dir() {
                copy_dir_recursive(&from, &to).await?;
            } else {
                tokio::fs::copy(&from, &to).await?;
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_client::MockChainClient;

    async fn write_stored_block(blocks_dir: &Path, height: u64, hash_prefix8: &str, block_hash: &str) {
        let dir_name = format!("{height}_{hash_prefix8}");
        let block_dir = block_dir_path(blocks_dir, &dir_name);
        tokio::fs::create_dir_all(&block_dir).await.unwrap();
        let summary = InscriptionsJson {
            block_height: height,
            block_hash: block_hash.to_string(),
            timestamp: 0,
            total_transactions: 0,
            inscriptions: Vec::new(),
            images: Vec::new(),
            smart_contracts: Vec::new(),
            processing_time_ms: 0,
            success: true,
            steganography_scan: None,
        };
        tokio::fs::write(block_dir.join("inscriptions.json"), serde_json::to_vec(&summary).unwrap()).await.unwrap();
    }

    /// A stored directory `<h>_<A>` whose recorded hash
    /// is `A` is quarantined under `reorgs/` when the canonical hash at
    /// `h` is a different `B`, and `h` is reported for reprocessing.
    #[tokio::test]
    async fn stale_directory_is_quarantined_when_canonical_hash_diverges() {
        let dir = tempfile::tempdir().unwrap();
        let blocks_dir = dir.path();
        let hash_a = "a".repeat(64);
        let hash_b = "b".repeat(64);
        write_stored_block(blocks_dir, 100, "aaaaaaaa", &hash_a).await;

        let mut mock = MockChainClient::new();
        mock.expect_block_hash().returning(move |_| Ok(hash_b.clone()));

        let needs_processing = detect_and_quarantine(&mock, blocks_dir, 100, 1).await.unwrap();

        assert_eq!(needs_processing, vec![100]);
        assert!(blocks_dir.join("reorgs").join("100_aaaaaaaa").join("inscriptions.json").exists());
        assert!(!block_dir_path(blocks_dir, "100_aaaaaaaa").exists());
    }

    #[tokio::test]
    async fn matching_canonical_hash_is_left_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let blocks_dir = dir.path();
        let hash_a = "a".repeat(64);
        write_stored_block(blocks_dir, 100, "aaaaaaaa", &hash_a).await;

        let mut mock = MockChainClient::new();
        mock.expect_block_hash().returning(move |_| Ok(hash_a.clone()));

        let needs_processing = detect_and_quarantine(&mock, blocks_dir, 100, 1).await.unwrap();

        assert!(needs_processing.is_empty());
        assert!(block_dir_path(blocks_dir, "100_aaaaaaaa").join("inscriptions.json").exists());
    }
}

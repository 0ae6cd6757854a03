//! Upload relocation: moving or copying a matched ingestion's image
//! into the block's `images/` directory.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::error::{ReconcileError, Result};
use crate::traits::IpfsClient;

async fn first_file_with_prefix(dir: &Path, prefix: &str) -> Option<PathBuf> {
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        if entry.file_name().to_string_lossy().starts_with(prefix) {
            return Some(entry.path());
        }
    }
    None
}

/// Removes any lingering `<id>_*` files in `uploads_dir`.
async fn cleanup_upload_artifacts(uploads_dir: &Path, ingestion_id: &str) {
    let prefix = format!("{ingestion_id}_");
    if let Ok(mut entries) = tokio::fs::read_dir(uploads_dir).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            if entry.file_name().to_string_lossy().starts_with(&prefix) {
                let _ = tokio::fs::remove_file(entry.path()).await;
            }
        }
    }
}

/// The file name a relocated image should take: `<cid>.<ext>` when a
/// CID resolved the match (the original filename's extension is kept),
/// else the original filename.
fn dest_file_name(cid: Option<&str>, filename: &str) -> String {
    match cid {
        Some(cid) => match Path::new(filename).extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{cid}.{ext}"),
            None => cid.to_string(),
        },
        None => filename.to_string(),
    }
}

/// Relocates the ingestion's image into `<block_dir>/images/`,
/// trying each source in priority order. Returns the destination path.
pub async fn relocate_ingestion_image(
    ipfs: &dyn IpfsClient,
    uploads_dir: &Path,
    block_images_dir: &Path,
    ingestion_id: &str,
    filename: &str,
    stego_cid: Option<&str>,
    ipfs_cid: Option<&str>,
    image_base64: &str,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(block_images_dir).await?;
    let dest = block_images_dir.join(dest_file_name(stego_cid.or(ipfs_cid), filename));

    if tokio::fs::metadata(&dest).await.is_ok() {
        cleanup_upload_artifacts(uploads_dir, ingestion_id).await;
        return Ok(dest);
    }

    if let Some(cid) = stego_cid {
        if let Some(local) = first_file_with_prefix(uploads_dir, cid).await {
            tokio::fs::copy(&local, &dest).await?;
            let _ = ipfs.unpin(&local.to_string_lossy()).await;
            let _ = tokio::fs::remove_file(&local).await;
            cleanup_upload_artifacts(uploads_dir, ingestion_id).await;
            return Ok(dest);
        }
    }

    if let Some(cid) = ipfs_cid {
        if let Ok(bytes) = ipfs.cat(cid).await {
            tokio::fs::write(&dest, &bytes).await?;
            cleanup_upload_artifacts(uploads_dir, ingestion_id).await;
            return Ok(dest);
        }
    }

    if let Some(found) = first_file_with_prefix(uploads_dir, filename)
        .await
        .or(first_file_with_prefix(uploads_dir, &format!("{ingestion_id}_{filename}")).await)
        .or(first_file_with_prefix(uploads_dir, &format!("{ingestion_id}_")).await)
    {
        tokio::fs::copy(&found, &dest).await?;
        cleanup_upload_artifacts(uploads_dir, ingestion_id).await;
        return Ok(dest);
    }

    let decoded = BASE64
        .decode(image_base64)
        .map_err(|e| ReconcileError::Relocation(format!("base64 decode failed: {e}")))?;
    tokio::fs::write(&dest, &decoded).await?;
    cleanup_upload_artifacts(uploads_dir, ingestion_id).await;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockIpfsClient;

    #[test]
    fn dest_file_name_prefers_cid_over_filename() {
        assert_eq!(dest_file_name(Some("bafybeigdyr"), "pixel.png"), "bafybeigdyr.png");
        assert_eq!(dest_file_name(None, "pixel.png"), "pixel.png");
    }

    #[tokio::test]
    async fn ipfs_cat_fallback_uses_ipfs_image_cid_and_names_by_it() {
        let uploads_dir = tempfile::tempdir().unwrap();
        let block_dir = tempfile::tempdir().unwrap();
        let images_dir = block_dir.path().join("images");

        let mut ipfs = MockIpfsClient::new();
        ipfs.expect_cat().withf(|cid| cid == "ipfscid123").returning(|_| Ok(b"ipfs bytes".to_vec()));

        let dest = relocate_ingestion_image(
            &ipfs,
            uploads_dir.path(),
            &images_dir,
            "ingestion-1",
            "pixel.png",
            None,
            Some("ipfscid123"),
            "",
        )
        .await
        .unwrap();

        assert_eq!(dest.file_name().unwrap().to_str().unwrap(), "ipfscid123.png");
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"ipfs bytes");
    }

    #[tokio::test]
    async fn no_cid_falls_back_to_base64_named_by_filename() {
        let uploads_dir = tempfile::tempdir().unwrap();
        let block_dir = tempfile::tempdir().unwrap();
        let images_dir = block_dir.path().join("images");

        let ipfs = MockIpfsClient::new();
        let encoded = BASE64.encode(b"raw bytes");

        let dest = relocate_ingestion_image(&ipfs, uploads_dir.path(), &images_dir, "ingestion-2", "pixel.png", None, None, &encoded)
            .await
            .unwrap();

        assert_eq!(dest.file_name().unwrap().to_str().unwrap(), "pixel.png");
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"raw bytes");
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Lifecycle of an ingested upload, as tracked by the (external)
/// ingestion store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionStatus {
    Pending,
    Confirmed,
    Failed,
}

/// An externally-owned upload record. The engine reads and
/// writes this shape but does not own its storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionRecord {
    pub id: String,
    pub filename: String,
    /// Base64-encoded image bytes, as submitted.
    pub image_base64: String,
    pub status: IngestionStatus,
    /// May include: `visible_pixel_hash`, `payout_script_hash(es)`,
    /// `payout_script_hash160(s)`, `funding_txid(s)`,
    /// `commitment_lock_address`, `stego_image_cid`, `ipfs_image_cid`,
    /// `contract_id`, `confirmed_txid`, `confirmed_height`,
    /// `reorg_from_txid`, `reorg_from_height`.
    pub metadata: BTreeMap<String, String>,
}

impl IngestionRecord {
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Comma/semicolon-separated lists of candidate hashes or txids
    /// living under a single metadata key (`payout_script_hashes`,
    /// `funding_txids`, …) are stored as one string; split on both
    /// separators so either convention round-trips.
    pub fn meta_list(&self, key: &str) -> Vec<String> {
        self.meta(key)
            .map(|v| {
                v.split(|c| c == ',' || c == ';')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A reconciled on-chain artifact bound to a contract. Upsert key is
/// `contract_id`; the reconciliation engine is the sole mutator after
/// ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartContractRecord {
    pub contract_id: String,
    pub block_height: u64,
    /// Path to the image relative to the block directory, e.g.
    /// `images/<file>.png`.
    pub image_path: String,
    pub confidence: f64,
    /// Free-form match metadata: `tx_id`, `match_type`, payout
    /// script/address/hashes, `ingestion_id`, `image_file`,
    /// `visible_pixel_hash`, etc.
    pub metadata: BTreeMap<String, String>,
}

impl SmartContractRecord {
    pub fn match_type(&self) -> Option<&str> {
        self.metadata.get("match_type").map(String::as_str)
    }
}

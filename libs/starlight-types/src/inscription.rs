use serde::{Deserialize, Serialize};

/// Where an inscription's bytes were recovered from. Drives file naming
/// and which extraction path produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InscriptionOrigin {
    /// Ordinal envelope found in an input's witness stack.
    Witness { input: usize, item: usize, envelope: usize },
    /// Legacy envelope found in an input's scriptSig.
    ScriptSig { input: usize },
    /// Push data inside an `OP_RETURN` output.
    OpReturn { output: usize, push: usize },
    /// Raw image signature found in a witness item with no envelope.
    LegacyImage { item: usize },
}

/// A single extracted inscription payload, already sanitized and
/// deduplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedInscription {
    pub txid: [u8; 32],
    pub origin: InscriptionOrigin,
    pub content_type: String,
    pub payload: Vec<u8>,
    /// Detected format tag: "png" | "jpeg" | "gif" | "webp" | "avif" |
    /// "svg" | "html" | "txt" | "brc20" | …
    pub format: String,
    pub size_bytes: usize,
    pub file_name: String,
    /// Path relative to the block directory, e.g. `images/<file_name>`.
    pub file_path: String,
}

impl ExtractedInscription {
    pub fn txid_hex(&self) -> String {
        crate::reversed_hex(&self.txid)
    }

    /// Dedup key: (txid, content-type, SHA-256(payload)).
    pub fn dedup_key(&self) -> (String, String, [u8; 32]) {
        (self.txid_hex(), self.content_type.clone(), crate::sha256(&self.payload))
    }
}

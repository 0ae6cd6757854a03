//! Candidate-hash indexes for oracle reconciliation.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bitcoin_utils::{hash::hash160, script::build_hash_lock_script};
use starlight_types::IngestionRecord;

/// Every way a confirmed transaction's witness/script/txid data might
/// point back at an ingestion record. Built once per block from the
/// most recent ingestion records.
pub struct CandidateIndex {
    /// Strong signals: filename hash prefix, `visible_pixel_hash`,
    /// the hash-lock script hash, `pixel_hash`.
    primary: HashMap<String, String>,
    /// Weaker signals consulted only if no primary candidate matches.
    fallback: HashMap<String, String>,
    /// `funding_txid`/`funding_txids` → ingestion id.
    txid: HashMap<String, String>,
}

fn is_hex_hash(s: &str) -> bool {
    (s.len() == 40 || s.len() == 64) && s.chars().all(|c| c.is_ascii_hexdigit())
}

impl CandidateIndex {
    pub fn build(records: &[IngestionRecord]) -> Self {
        let mut primary = HashMap::new();
        let mut fallback = HashMap::new();
        let mut txid = HashMap::new();

        for record in records {
            if let Some(prefix) = record.filename.split('_').next() {
                if is_hex_hash(prefix) {
                    primary.entry(prefix.to_ascii_lowercase()).or_insert_with(|| record.id.clone());
                }
            }

            if let Some(visible) = record.meta("visible_pixel_hash") {
                primary.entry(visible.to_ascii_lowercase()).or_insert_with(|| record.id.clone());
            }

            let pixel_hash_hex = record.meta("pixel_hash").or_else(|| record.meta("visible_pixel_hash"));
            if let Some(ph) = pixel_hash_hex {
                if let Ok(bytes) = hex::decode(ph) {
                    if bytes.len() == 32 {
                        let mut preimage = [0u8; 32];
                        preimage.copy_from_slice(&bytes);
                        let script = build_hash_lock_script(&preimage);
                        let script_hash = bitcoin_utils::address::wscript_hash(&script);
                        primary.entry(hex::encode(script_hash)).or_insert_with(|| record.id.clone());
                    }
                }
            }
            if let Some(pixel) = record.meta("pixel_hash") {
                primary.entry(pixel.to_ascii_lowercase()).or_insert_with(|| record.id.clone());
            }

            fallback.entry(record.id.clone()).or_insert_with(|| record.id.clone());
            for h in record.meta_list("payout_script_hashes") {
                fallback.entry(h.to_ascii_lowercase()).or_insert_with(|| record.id.clone());
            }
            if let Some(h) = record.meta("payout_script_hash") {
                fallback.entry(h.to_ascii_lowercase()).or_insert_with(|| record.id.clone());
            }
            for h in record.meta_list("payout_script_hash160s") {
                fallback.entry(h.to_ascii_lowercase()).or_insert_with(|| record.id.clone());
            }
            if let Some(h) = record.meta("payout_script_hash160") {
                fallback.entry(h.to_ascii_lowercase()).or_insert_with(|| record.id.clone());
            }
            if let Ok(image_bytes) = BASE64.decode(&record.image_base64) {
                let hash = starlight_types::sha256(&image_bytes);
                fallback.entry(hex::encode(hash)).or_insert_with(|| record.id.clone());
            }

            if let Some(t) = record.meta("funding_txid") {
                txid.entry(t.to_ascii_lowercase()).or_insert_with(|| record.id.clone());
            }
            for t in record.meta_list("funding_txids") {
                txid.entry(t.to_ascii_lowercase()).or_insert_with(|| record.id.clone());
            }
        }

        Self { primary, fallback, txid }
    }

    pub fn match_txid(&self, txid_hex: &str) -> Option<String> {
        self.txid.get(&txid_hex.to_ascii_lowercase()).cloned()
    }

    /// Candidate hashes for a witness/script item: the item itself
    /// (if it's already a 20/32-byte hash), its SHA-256, and its
    /// HASH-160, plus the same three for the hex-decoded form when
    /// `item` is printable 40/64-hex.
    pub fn item_candidates(item: &[u8]) -> Vec<String> {
        let mut out = Vec::new();
        push_item_hashes(item, &mut out);
        if let Ok(text) = std::str::from_utf8(item) {
            if is_hex_hash(text) {
                if let Ok(decoded) = hex::decode(text) {
                    push_item_hashes(&decoded, &mut out);
                }
            }
        }
        out
    }

    /// Primary first, then fallback; returns the matched id and
    /// removes all its candidate hashes from both indexes so it
    /// cannot match again within the same block.
    pub fn match_any(&mut self, candidates: &[String]) -> Option<String> {
        for c in candidates {
            if let Some(id) = self.primary.get(c).cloned() {
                self.remove_id(&id);
                return Some(id);
            }
        }
        for c in candidates {
            if let Some(id) = self.fallback.get(c).cloned() {
                self.remove_id(&id);
                return Some(id);
            }
        }
        None
    }

    fn remove_id(&mut self, id: &str) {
        self.primary.retain(|_, v| v != id);
        self.fallback.retain(|_, v| v != id);
        self.txid.retain(|_, v| v != id);
    }

    pub fn remove_txid_match(&mut self, id: &str) {
        self.remove_id(id);
    }
}

fn push_item_hashes(item: &[u8], out: &mut Vec<String>) {
    if item.len() == 20 || item.len() == 32 {
        out.push(hex::encode(item));
    }
    out.push(hex::encode(starlight_types::sha256(item)));
    out.push(hex::encode(hash160(item)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use starlight_types::IngestionStatus;

    fn record(id: &str, metadata: &[(&str, &str)]) -> IngestionRecord {
        let mut map = BTreeMap::new();
        for (k, v) in metadata {
            map.insert(k.to_string(), v.to_string());
        }
        IngestionRecord { id: id.to_string(), filename: "x.png".into(), image_base64: String::new(), status: IngestionStatus::Pending, metadata: map }
    }

    #[test]
    fn funding_txid_is_indexed() {
        let records = vec![record("1", &[("funding_txid", "ABCDEF")])];
        let index = CandidateIndex::build(&records);
        assert_eq!(index.match_txid("abcdef"), Some("1".to_string()));
    }

    #[test]
    fn matched_record_cannot_match_twice_in_same_block() {
        let records = vec![record("1", &[("visible_pixel_hash", "aa")])];
        let mut index = CandidateIndex::build(&records);
        assert_eq!(index.match_any(&["aa".to_string()]), Some("1".to_string()));
        assert_eq!(index.match_any(&["aa".to_string()]), None);
    }
}

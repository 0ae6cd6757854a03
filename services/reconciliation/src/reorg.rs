//! Reorg semantics for reconciliation: when a new confirmed
//! txid/height differs from one already recorded, the previous values
//! are preserved under `reorg_from_*` before being overwritten.

use std::collections::BTreeMap;

pub fn apply_confirmation(metadata: &mut BTreeMap<String, String>, new_txid: &str, new_height: u64) {
    let previous_txid = metadata.get("confirmed_txid").cloned();
    let previous_height = metadata.get("confirmed_height").cloned();

    if let Some(previous_txid) = previous_txid.filter(|t| t != new_txid) {
        metadata.insert("reorg_from_txid".to_string(), previous_txid);
        if let Some(previous_height) = previous_height {
            metadata.insert("reorg_from_height".to_string(), previous_height);
        }
    }

    metadata.insert("confirmed_txid".to_string(), new_txid.to_string());
    metadata.insert("confirmed_height".to_string(), new_height.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_reorg_from_fields_on_txid_change() {
        let mut metadata = BTreeMap::new();
        apply_confirmation(&mut metadata, "aaaa", 100);
        apply_confirmation(&mut metadata, "bbbb", 101);
        assert_eq!(metadata.get("reorg_from_txid").map(String::as_str), Some("aaaa"));
        assert_eq!(metadata.get("reorg_from_height").map(String::as_str), Some("100"));
        assert_eq!(metadata.get("confirmed_txid").map(String::as_str), Some("bbbb"));
    }

    #[test]
    fn no_reorg_fields_on_first_confirmation() {
        let mut metadata = BTreeMap::new();
        apply_confirmation(&mut metadata, "aaaa", 100);
        assert!(!metadata.contains_key("reorg_from_txid"));
    }
}

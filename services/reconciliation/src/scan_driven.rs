//! Scan-driven reconciliation: binding a steganography-flagged
//! inscription to an ingestion record via its embedded payout claim
//!.

use std::collections::BTreeMap;

use scanner_bridge::ScannedInscription;
use serde_json::Value;
use starlight_types::{BitcoinNetwork, ExtractedInscription, IngestionRecord, Transaction};

use crate::traits::IngestionStore;

/// A resolved scan-driven match, ready to be upserted as a
/// `SmartContractRecord` and have its image relocated.
#[derive(Debug, Clone)]
pub struct ScanMatch {
    /// The visible-pixel hash: the smart-contract record's key.
    pub contract_id: String,
    pub record: IngestionRecord,
    pub metadata: BTreeMap<String, String>,
}

struct EmbeddedClaim {
    message: String,
    payout_address: Option<String>,
    payout_script: Option<Vec<u8>>,
    payout_script_hash: Option<String>,
}

fn parse_embedded_claim(raw: &str) -> EmbeddedClaim {
    if !raw.trim_start().starts_with('{') {
        return EmbeddedClaim { message: raw.to_string(), payout_address: None, payout_script: None, payout_script_hash: None };
    }
    let Ok(value) = serde_json::from_str::<Value>(raw) else {
        return EmbeddedClaim { message: raw.to_string(), payout_address: None, payout_script: None, payout_script_hash: None };
    };
    let message = value
        .get("message")
        .or_else(|| value.get("embedded_message"))
        .and_then(Value::as_str)
        .unwrap_or(raw)
        .to_string();
    let payout_address = value.get("payout_address").and_then(Value::as_str).map(str::to_string);
    let payout_script = value
        .get("payout_script")
        .and_then(Value::as_str)
        .and_then(|s| hex::decode(s).ok());
    let payout_script_hash = value.get("payout_script_hash").and_then(Value::as_str).map(str::to_string);
    EmbeddedClaim { message, payout_address, payout_script, payout_script_hash }
}

/// scriptPubKey matches the claimed payout by priority: exact script
/// bytes, then `PayToAddrScript(payout_address)`, then a SHA-256 or
/// HASH-160 digest equal to `payout_script_hash`.
fn output_matches_claim(script_pubkey: &[u8], claim: &EmbeddedClaim, network: BitcoinNetwork) -> bool {
    if let Some(expected) = &claim.payout_script {
        if expected == script_pubkey {
            return true;
        }
    }
    if let Some(address) = &claim.payout_address {
        if let Ok(spk) = bitcoin_utils::address::script_pubkey_for_address(address, network) {
            if spk.as_bytes() == script_pubkey {
                return true;
            }
        }
    }
    if let Some(expected_hash) = &claim.payout_script_hash {
        let sha = hex::encode(starlight_types::sha256(script_pubkey));
        let h160 = hex::encode(bitcoin_utils::hash::hash160(script_pubkey));
        if expected_hash.eq_ignore_ascii_case(&sha) || expected_hash.eq_ignore_ascii_case(&h160) {
            return true;
        }
    }
    false
}

fn find_inscription<'a>(
    inscriptions: &'a [ExtractedInscription],
    file_name: &str,
    tx_id: &str,
) -> Option<&'a ExtractedInscription> {
    inscriptions
        .iter()
        .find(|i| i.file_name == file_name)
        .or_else(|| inscriptions.iter().find(|i| i.txid_hex() == tx_id))
}

fn find_transaction<'a>(transactions: &'a [Transaction], txid_hex: &str) -> Option<&'a Transaction> {
    transactions.iter().find(|t| t.txid_hex() == txid_hex)
}

/// For each stego-flagged scan result, resolve its embedded
/// payout claim against the block's own transactions and look up the
/// matching ingestion record by visible-pixel hash.
pub async fn reconcile_scan_driven(
    ingestion_store: &dyn IngestionStore,
    network: BitcoinNetwork,
    inscriptions: &[ExtractedInscription],
    transactions: &[Transaction],
    scanned: &[ScannedInscription],
) -> Vec<ScanMatch> {
    let mut matches = Vec::new();

    for scan in scanned {
        let Some(result) = &scan.scan_result else { continue };
        if !result.is_stego {
            continue;
        }
        let Some(inscription) = find_inscription(inscriptions, &scan.file_name, &scan.tx_id) else { continue };
        let Some(tx) = find_transaction(transactions, &scan.tx_id) else { continue };

        let claim = parse_embedded_claim(&result.extracted_message);
        if claim.message.is_empty() {
            continue;
        }

        let mut digest_input = inscription.payload.clone();
        digest_input.extend_from_slice(claim.message.as_bytes());
        let visible_hash = starlight_types::first_8_bytes_hex(&starlight_types::sha256(&digest_input));

        let Ok(record) = ingestion_store.get(&visible_hash).await else { continue };

        let matched_output = tx.outputs.iter().find(|o| output_matches_claim(&o.script_pubkey, &claim, network));
        let Some(output) = matched_output else { continue };

        let mut metadata = BTreeMap::new();
        metadata.insert("match_type".to_string(), "scan_driven".to_string());
        metadata.insert("tx_id".to_string(), scan.tx_id.clone());
        metadata.insert("ingestion_id".to_string(), record.id.clone());
        metadata.insert("matched_script_pubkey".to_string(), hex::encode(&output.script_pubkey));
        metadata.insert("visible_pixel_hash".to_string(), visible_hash.clone());

        matches.push(ScanMatch { contract_id: visible_hash, record, metadata });
    }

    matches
}

//! Oracle reconciliation: matching confirmed transactions against
//! recent ingestion records by funding txid, witness hash, or output
//! script/address.

use std::collections::BTreeMap;

use starlight_types::Transaction;

use crate::candidate::CandidateIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    FundingTxid,
    WitnessHash,
    OutputScript,
}

impl MatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchType::FundingTxid => "funding_txid",
            MatchType::WitnessHash => "witness_hash",
            MatchType::OutputScript => "output_script",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OracleMatch {
    pub ingestion_id: String,
    pub match_type: MatchType,
    pub tx_id: String,
    pub metadata: BTreeMap<String, String>,
}

fn output_script_candidates(script_pubkey: &[u8]) -> Vec<String> {
    let mut out = vec![
        hex::encode(starlight_types::sha256(script_pubkey)),
        hex::encode(bitcoin_utils::hash::hash160(script_pubkey)),
    ];
    let script = bitcoin::ScriptBuf::from(script_pubkey.to_vec());
    if let Some(hash) = bitcoin_utils::address::extract_standard_script_hash(&script) {
        match hash {
            bitcoin_utils::address::StandardScriptHash::P2sh(h)
            | bitcoin_utils::address::StandardScriptHash::P2wpkh(h)
            | bitcoin_utils::address::StandardScriptHash::P2pkh(h) => out.push(hex::encode(h)),
            bitcoin_utils::address::StandardScriptHash::P2wsh(h) => out.push(hex::encode(h)),
        }
    }
    out
}

/// Tries funding_txid, then witness hash, then output script/
/// address, in priority order, per transaction. A matched record's
/// candidates are removed from `index` so it cannot match twice in
/// the same block.
pub fn reconcile_oracle_block(index: &mut CandidateIndex, transactions: &[Transaction]) -> Vec<OracleMatch> {
    let mut matches = Vec::new();

    for tx in transactions {
        let tx_id = tx.txid_hex();

        if let Some(ingestion_id) = index.match_txid(&tx_id) {
            index.remove_txid_match(&ingestion_id);
            let mut metadata = BTreeMap::new();
            metadata.insert("match_type".to_string(), MatchType::FundingTxid.as_str().to_string());
            metadata.insert("tx_id".to_string(), tx_id.clone());
            metadata.insert("ingestion_id".to_string(), ingestion_id.clone());
            matches.push(OracleMatch { ingestion_id, match_type: MatchType::FundingTxid, tx_id: tx_id.clone(), metadata });
            continue;
        }

        let mut witness_hit = None;
        'witness: for (input_idx, witness) in tx.witnesses.iter().enumerate() {
            for item in witness {
                let candidates = CandidateIndex::item_candidates(item);
                if let Some(id) = index.match_any(&candidates) {
                    witness_hit = Some((id, input_idx));
                    break 'witness;
                }
            }
        }
        if let Some((ingestion_id, input_idx)) = witness_hit {
            let mut metadata = BTreeMap::new();
            metadata.insert("match_type".to_string(), MatchType::WitnessHash.as_str().to_string());
            metadata.insert("tx_id".to_string(), tx_id.clone());
            metadata.insert("ingestion_id".to_string(), ingestion_id.clone());
            metadata.insert("input_index".to_string(), input_idx.to_string());
            matches.push(OracleMatch { ingestion_id, match_type: MatchType::WitnessHash, tx_id: tx_id.clone(), metadata });
            continue;
        }

        let mut output_hit = None;
        for (output_idx, output) in tx.outputs.iter().enumerate() {
            let candidates = output_script_candidates(&output.script_pubkey);
            if let Some(id) = index.match_any(&candidates) {
                output_hit = Some((id, output_idx));
                break;
            }
        }
        if let Some((ingestion_id, output_idx)) = output_hit {
            let mut metadata = BTreeMap::new();
            metadata.insert("match_type".to_string(), MatchType::OutputScript.as_str().to_string());
            metadata.insert("tx_id".to_string(), tx_id.clone());
            metadata.insert("ingestion_id".to_string(), ingestion_id.clone());
            metadata.insert("output_index".to_string(), output_idx.to_string());
            matches.push(OracleMatch { ingestion_id, match_type: MatchType::OutputScript, tx_id, metadata });
        }
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use starlight_types::{IngestionRecord, IngestionStatus};
    use std::collections::BTreeMap as Map;

    fn tx_with_txid(txid_hex: &str) -> Transaction {
        let mut txid = [0u8; 32];
        let mut bytes = hex::decode(txid_hex).unwrap();
        bytes.reverse();
        txid[..bytes.len().min(32)].copy_from_slice(&bytes[..bytes.len().min(32)]);
        Transaction { version: 2, inputs: vec![], outputs: vec![], locktime: 0, has_witness: false, witnesses: vec![], txid }
    }

    #[test]
    fn matches_by_funding_txid_first() {
        let txid_hex = "ab".repeat(32);
        let mut meta = Map::new();
        meta.insert("funding_txid".to_string(), txid_hex.clone());
        let record = IngestionRecord { id: "r1".into(), filename: "f.png".into(), image_base64: String::new(), status: IngestionStatus::Pending, metadata: meta };
        let mut index = CandidateIndex::build(&[record]);
        let tx = tx_with_txid(&txid_hex);
        let matches = reconcile_oracle_block(&mut index, &[tx]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].match_type, MatchType::FundingTxid);
    }
}

use serde::{Deserialize, Serialize};

use crate::inscription::ExtractedInscription;
use crate::{contract::SmartContractRecord, reversed_hex, sha256d};

/// An 80-byte Bitcoin block header, parsed and hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: i32,
    /// Previous block hash, internal (little-endian) byte order.
    pub prev_hash: [u8; 32],
    /// Merkle root, internal byte order.
    pub merkle_root: [u8; 32],
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
    /// Double SHA-256 of the 80-byte header, internal byte order.
    /// Recomputed by the parser — never trusted from the wire.
    pub hash: [u8; 32],
}

impl BlockHeader {
    /// Display (big-endian) hex of this header's hash.
    pub fn hash_hex(&self) -> String {
        reversed_hex(&self.hash)
    }

    pub fn prev_hash_hex(&self) -> String {
        reversed_hex(&self.prev_hash)
    }

    pub fn merkle_root_hex(&self) -> String {
        reversed_hex(&self.merkle_root)
    }

    /// Recompute the header hash from its 80-byte serialization. The
    /// parser calls this rather than trusting any hash supplied by a
    /// caller.
    pub fn compute_hash(serialized_80_bytes: &[u8]) -> [u8; 32] {
        sha256d(serialized_80_bytes)
    }
}

/// A single transaction input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// Previous txid, internal byte order.
    pub prev_txid: [u8; 32],
    pub prev_index: u32,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
}

impl TxInput {
    pub fn prev_txid_hex(&self) -> String {
        reversed_hex(&self.prev_txid)
    }
}

/// A single transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}

/// A parsed transaction with canonical, locally-recomputed txid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub locktime: u32,
    pub has_witness: bool,
    /// One witness stack per input; empty stacks for non-witness inputs.
    /// Indexed in parallel with `inputs`.
    pub witnesses: Vec<Vec<Vec<u8>>>,
    /// Double SHA-256 over the non-witness serialization, internal byte
    /// order. Invariant: always recomputed by the parser.
    pub txid: [u8; 32],
}

impl Transaction {
    pub fn txid_hex(&self) -> String {
        reversed_hex(&self.txid)
    }

    /// Witness stack for the given input, or an empty slice if the
    /// input carries no witness data.
    pub fn witness_for_input(&self, input_index: usize) -> &[Vec<u8>] {
        self.witnesses
            .get(input_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Bookkeeping attached to a processed block, independent of its
/// content, used for observability and the `inscriptions.json`
/// `processing_time_ms`/`success` fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingMeta {
    pub processing_time_ms: u64,
    pub success: bool,
    pub error: Option<String>,
}

/// The full per-block artifact persisted under `<blocks_root>/<height>_<hash8>/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockArtifact {
    pub height: u64,
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
    pub inscriptions: Vec<ExtractedInscription>,
    pub smart_contracts: Vec<SmartContractRecord>,
    pub meta: ProcessingMeta,
}

impl BlockArtifact {
    /// Directory name for this block: `<height>_<hash_prefix8>`.
    pub fn dir_name(&self) -> String {
        format!("{}_{}", self.height, &self.header.hash_hex()[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_hash_is_displayed_big_endian() {
        let mut hash = [0u8; 32];
        hash[0] = 0xAB;
        hash[31] = 0x01;
        let header = BlockHeader {
            version: 1,
            prev_hash: [0; 32],
            merkle_root: [0; 32],
            timestamp: 0,
            bits: 0,
            nonce: 0,
            hash,
        };
        // internal byte order has 0xAB first; display reverses it to last.
        assert!(header.hash_hex().starts_with("01"));
        assert!(header.hash_hex().ends_with("ab"));
    }

    #[test]
    fn block_dir_name_uses_height_and_hash_prefix() {
        let mut hash = [0u8; 32];
        hash[31] = 0xde;
        hash[30] = 0xad;
        hash[29] = 0xbe;
        hash[28] = 0xef;
        let artifact = BlockArtifact {
            height: 840_000,
            header: BlockHeader {
                version: 1,
                prev_hash: [0; 32],
                merkle_root: [0; 32],
                timestamp: 0,
                bits: 0,
                nonce: 0,
                hash,
            },
            transactions: vec![],
            inscriptions: vec![],
            smart_contracts: vec![],
            meta: ProcessingMeta::default(),
        };
        assert_eq!(artifact.dir_name(), "840000_deadbeef");
    }
}

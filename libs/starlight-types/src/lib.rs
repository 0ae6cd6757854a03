//! Shared data model for the starlight chain engine.
//!
//! These are plain values with no dynamic dispatch across crate
//! boundaries — every downstream crate (chain-client, block-parser,
//! inscription-extractor, block-pipeline, reconciliation, commitment,
//! sweep) builds on top of the types defined here instead of redefining
//! its own shape for the same concept.

pub mod block;
pub mod contract;
pub mod ingestion;
pub mod inscription;
pub mod network;
pub mod scan;
pub mod task;
pub mod utxo;

pub use block::{BlockArtifact, BlockHeader, ProcessingMeta, Transaction, TxInput, TxOutput};
pub use contract::SmartContractRecord;
pub use ingestion::IngestionRecord;
pub use inscription::ExtractedInscription;
pub use network::{BitcoinNetwork, NetworkParams};
pub use scan::{ScanOptions, ScanResult};
pub use task::{SweepStatus, Task, TaskProof};
pub use utxo::AddressUtxo;

/// Double SHA-256, used throughout the engine for txids, header hashes,
/// and content-addressing.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    use sha256_impl::sha256;
    sha256(&sha256(data))
}

/// Single SHA-256.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    sha256_impl::sha256(data)
}

/// Big-endian (reversed) hex display of a 32-byte hash, matching how
/// Bitcoin Core and block explorers print txids and block hashes.
pub fn reversed_hex(bytes: &[u8; 32]) -> String {
    let mut rev = *bytes;
    rev.reverse();
    hex::encode(rev)
}

/// First 8 bytes of a hash, hex-encoded. Used for the visible-pixel hash.
pub fn first_8_bytes_hex(bytes: &[u8; 32]) -> String {
    hex::encode(&bytes[..8])
}

/// Thin wrapper around `sha2` so callers only need this crate for plain
/// SHA-256; HASH-160 and other bitcoin-specific digests live in
/// `bitcoin-utils`, which depends on this crate, not the other way
/// around.
mod sha256_impl {
    use sha2::{Digest, Sha256};

    pub fn sha256(data: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hasher.finalize().into()
    }
}

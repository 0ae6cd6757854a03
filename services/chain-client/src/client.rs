use async_trait::async_trait;
use starlight_types::{AddressUtxo, Transaction, TxOutput};

use crate::error::Result;

/// Mempool inclusion status for a txid: a direct companion of
/// `/tx/{txid}/raw` that lets the reconciliation engine distinguish
/// "not found" from "seen but unconfirmed" when funding-txid matching
/// fails against the block-scoped index.
#[derive(Debug, Clone, Default)]
pub struct TxStatus {
    pub confirmed: bool,
    pub block_height: Option<u64>,
    pub block_hash: Option<String>,
}

/// `slow`/`medium`/`fast` sat/vB estimates.
#[derive(Debug, Clone, Copy)]
pub struct FeeEstimates {
    pub slow: u64,
    pub medium: u64,
    pub fast: u64,
}

/// The boundary the block pipeline, reconciliation engine, PSBT
/// builder, and sweep engine all call through. A single
/// implementation (`EsploraChainClient`) backs production use; tests
/// mock this trait directly (via the `mock` feature) instead of
/// standing up an HTTP server.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current chain tip height, with retry-with-backoff semantics.
    async fn current_height(&self) -> Result<u64>;

    async fn block_hash(&self, height: u64) -> Result<String>;

    async fn height_from_hash(&self, hash: &str) -> Result<u64>;

    /// txids of every transaction in the block, in block order.
    async fn block_transactions(&self, hash: &str) -> Result<Vec<String>>;

    /// Hex-encoded raw block bytes.
    async fn raw_block_hex(&self, height: u64) -> Result<String>;

    /// Hex-encoded raw transaction bytes.
    async fn raw_tx_hex(&self, txid: &str) -> Result<String>;

    /// Fetches and parses a transaction, returning the requested
    /// output. Fails if `vout` is out of range.
    async fn tx_output(&self, txid: &str, vout: u32) -> Result<(Transaction, TxOutput)>;

    async fn tx_status(&self, txid: &str) -> Result<TxStatus>;

    async fn list_confirmed_utxos(&self, address: &str) -> Result<Vec<AddressUtxo>>;

    async fn fee_estimates(&self) -> Result<FeeEstimates>;

    /// Broadcasts a hex-encoded raw transaction; returns its txid.
    async fn broadcast(&self, raw_tx_hex: &str) -> Result<String>;
}

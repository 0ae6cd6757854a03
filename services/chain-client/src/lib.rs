//! Chain client: fetch tip height, block hashes, raw block
//! bytes, tx/UTXO lookups, and broadcast raw transactions, with
//! shared rate limiting and retry-with-backoff.

pub mod client;
pub mod error;
pub mod esplora;
pub mod rate_limit;
pub mod retry;

pub use client::{ChainClient, FeeEstimates, TxStatus};
#[cfg(feature = "mock")]
pub use client::MockChainClient;
pub use error::{ChainClientError, Result};
pub use esplora::EsploraChainClient;
pub use rate_limit::RateLimiter;

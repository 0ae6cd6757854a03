use thiserror::Error;

/// Errors surfaced by the chain client.
///
/// `Transient` and `Permanent` are distinguished so callers (the block
/// pipeline, the reconciliation engine) can decide whether to retry on
/// the next tick or log-and-move-on.
#[derive(Debug, Error)]
pub enum ChainClientError {
    #[error("rate limited: retry after {0:?}")]
    RateLimited(std::time::Duration),

    #[error("transient error from {endpoint}: {message}")]
    Transient { endpoint: String, message: String },

    #[error("permanent error ({status}) from {endpoint}: {message}")]
    Permanent {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("decode error from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("output index {vout} out of range for tx {txid} ({count} outputs)")]
    OutputIndexOutOfRange {
        txid: String,
        vout: u32,
        count: usize,
    },

    #[error("all endpoints exhausted for {0}")]
    AllEndpointsExhausted(String),
}

pub type Result<T> = std::result::Result<T, ChainClientError>;

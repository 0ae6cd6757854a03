use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("ingestion store error: {0}")]
    IngestionStore(String),

    #[error("image relocation failed: {0}")]
    Relocation(String),

    #[error(transparent)]
    ChainClient(#[from] chain_client::ChainClientError),

    #[error(transparent)]
    Sweep(#[from] sweep::SweepError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;

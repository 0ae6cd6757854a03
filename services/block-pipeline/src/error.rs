use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    ChainClient(#[from] chain_client::ChainClientError),

    #[error("parse error: {0}")]
    Parse(#[from] block_parser::ParseError),

    #[error("persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Reconcile(#[from] reconciliation::ReconcileError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

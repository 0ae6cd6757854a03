use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommitmentError {
    #[error("insufficient funds after fee")]
    InsufficientFunds,

    #[error("no confirmed UTXOs available for payer(s)")]
    NoUtxos,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("psbt encode/decode error: {0}")]
    Psbt(String),

    #[error(transparent)]
    ChainClient(#[from] chain_client::ChainClientError),

    #[error(transparent)]
    BitcoinUtils(#[from] bitcoin_utils::BitcoinUtilsError),
}

pub type Result<T> = std::result::Result<T, CommitmentError>;

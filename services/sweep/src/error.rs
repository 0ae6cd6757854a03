use thiserror::Error;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("redeem script is not hash-lock-only")]
    InvalidRedeemScript,

    #[error("output below dust after fee")]
    DustAfterFee,

    #[error("commitment vout {vout} out of range for tx with {output_count} outputs")]
    VoutOutOfRange { vout: u32, output_count: usize },

    #[error(transparent)]
    ChainClient(#[from] chain_client::ChainClientError),

    #[error(transparent)]
    BitcoinUtils(#[from] bitcoin_utils::BitcoinUtilsError),
}

pub type Result<T> = std::result::Result<T, SweepError>;

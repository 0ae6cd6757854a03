//! Raw Bitcoin P2P block decoding: decodes
//! the wire block format including SegWit, recomputes canonical
//! txids locally, and exposes inputs/outputs/per-input witness
//! stacks to the inscription extractor and reconciliation engine.

pub mod block;
pub mod cursor;
pub mod error;
pub mod header;
pub mod tx;

pub use block::parse_block;
pub use error::{ParseError, Result};
pub use header::parse_header;
pub use tx::{parse_transaction, serialize_legacy};

/// Parses a single raw (non-block) transaction, as returned by the
/// chain client's `/tx/{txid}/raw` endpoint. Used by
/// `ChainClient::tx_output`.
pub fn parse_single_transaction(raw: &[u8]) -> Result<starlight_types::Transaction> {
    let mut cursor = cursor::Cursor::new(raw);
    let tx = tx::parse_transaction(&mut cursor)?;
    if cursor.remaining() != 0 {
        return Err(ParseError::TrailingBytes(cursor.remaining()));
    }
    Ok(tx)
}

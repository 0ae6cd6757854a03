//! Extracts Ordinals envelopes, raw image signatures, and OP_RETURN
//! payloads from a parsed transaction, sanitizes them, and assigns
//! deterministic file names.

pub mod envelope;
pub mod extract;
pub mod format;
pub mod image_sig;
pub mod sanitize;

pub use extract::{extract_block_inscriptions, extract_tx_inscriptions};

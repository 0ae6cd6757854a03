//! Scanner bridge: the thin capability the block pipeline
//! consumes to scan a block's inscriptions for steganographic
//! payloads. The scanner itself (the ML model) is out of scope
//!; this crate only specifies the interface the core consumes.

use async_trait::async_trait;
use starlight_types::{ScanOptions, ScanResult};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scanner unavailable: {0}")]
    Unavailable(String),

    #[error("scanner returned malformed response: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;

/// One inscription's scan outcome as reported by the scanner for a
/// whole-block scan request.
#[derive(Debug, Clone)]
pub struct ScannedInscription {
    pub tx_id: String,
    pub file_name: String,
    pub size_bytes: u64,
    pub content_type: String,
    pub scan_result: Option<ScanResult>,
}

#[derive(Debug, Clone, Default)]
pub struct ScanBlockResponse {
    pub inscriptions: Vec<ScannedInscription>,
    pub total_inscriptions: u32,
    pub stego_detected: u32,
}

/// The block pipeline's only dependency on the scanner.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait ScannerClient: Send + Sync {
    async fn scan_block(&self, height: u64, options: ScanOptions) -> Result<ScanBlockResponse>;
}

#[cfg(feature = "mock")]
pub use MockScannerClient as Mock;

/// If the scanner is unavailable or errors, the block pipeline MUST
/// continue with per-inscription "not_scanned" placeholders rather
/// than fail the block.
pub fn not_scanned_response(file_names: &[(String, String, u64, String)]) -> ScanBlockResponse {
    ScanBlockResponse {
        inscriptions: file_names
            .iter()
            .map(|(tx_id, file_name, size_bytes, content_type)| ScannedInscription {
                tx_id: tx_id.clone(),
                file_name: file_name.clone(),
                size_bytes: *size_bytes,
                content_type: content_type.clone(),
                scan_result: Some(ScanResult::not_scanned()),
            })
            .collect(),
        total_inscriptions: file_names.len() as u32,
        stego_detected: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_scanned_response_marks_every_inscription() {
        let response = not_scanned_response(&[("tx1".into(), "a.png".into(), 10, "image/png".into())]);
        assert_eq!(response.total_inscriptions, 1);
        assert_eq!(response.stego_detected, 0);
        assert_eq!(response.inscriptions[0].scan_result.as_ref().unwrap().extraction_error, "not_scanned");
    }
}

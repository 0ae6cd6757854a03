//! `ScannerClient` adapter: POSTs to a configurable
//! scanner HTTP endpoint. The scanner model itself is out of scope
//! — this only speaks the scanner's wire shape.

use async_trait::async_trait;
use scanner_bridge::{ScanBlockResponse, ScanError, ScannedInscription, ScannerClient};
use serde::Deserialize;
use starlight_types::{ScanOptions, ScanResult};

type Result<T> = std::result::Result<T, ScanError>;

pub struct ScannerBridgeClient {
    base: Option<String>,
    http: reqwest::Client,
}

impl ScannerBridgeClient {
    pub fn new(base: Option<String>) -> Self {
        Self { base, http: reqwest::Client::new() }
    }
}

#[derive(Debug, Deserialize)]
struct WireScanResult {
    is_stego: bool,
    confidence: f64,
    stego_type: String,
    extracted_message: String,
    extraction_error: String,
}

impl From<WireScanResult> for ScanResult {
    fn from(w: WireScanResult) -> Self {
        ScanResult { is_stego: w.is_stego, confidence: w.confidence, stego_type: w.stego_type, extracted_message: w.extracted_message, extraction_error: w.extraction_error }
    }
}

#[derive(Debug, Deserialize)]
struct WireInscription {
    tx_id: String,
    file_name: String,
    size_bytes: u64,
    content_type: String,
    scan_result: Option<WireScanResult>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    inscriptions: Vec<WireInscription>,
    total_inscriptions: u32,
    stego_detected: u32,
}

#[async_trait]
impl ScannerClient for ScannerBridgeClient {
    async fn scan_block(&self, height: u64, options: ScanOptions) -> Result<ScanBlockResponse> {
        let base = self.base.as_ref().ok_or_else(|| ScanError::Unavailable("SCANNER_API_BASE not configured".into()))?;
        let url = format!("{base}/scan/{height}");
        let resp = self
            .http
            .post(&url)
            .json(&options)
            .timeout(std::time::Duration::from_secs(300))
            .send()
            .await
            .map_err(|e| ScanError::Unavailable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ScanError::Unavailable(format!("scanner status {}", resp.status())));
        }
        let wire: WireResponse = resp.json().await.map_err(|e| ScanError::Malformed(e.to_string()))?;

        Ok(ScanBlockResponse {
            inscriptions: wire
                .inscriptions
                .into_iter()
                .map(|i| ScannedInscription {
                    tx_id: i.tx_id,
                    file_name: i.file_name,
                    size_bytes: i.size_bytes,
                    content_type: i.content_type,
                    scan_result: i.scan_result.map(ScanResult::from),
                })
                .collect(),
            total_inscriptions: wire.total_inscriptions,
            stego_detected: wire.stego_detected,
        })
    }
}

use serde::{Deserialize, Serialize};

/// Options passed to the scanner bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOptions {
    pub extract_message: bool,
    pub confidence_threshold: f64,
    pub include_metadata: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extract_message: true,
            confidence_threshold: 0.5,
            include_metadata: true,
        }
    }
}

/// Closed sum type for a single inscription's steganography scan
/// result, carried end to end as a real struct rather than a
/// weakly-typed map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub is_stego: bool,
    pub confidence: f64,
    pub stego_type: String,
    pub extracted_message: String,
    pub extraction_error: String,
}

impl ScanResult {
    pub fn not_scanned() -> Self {
        Self {
            is_stego: false,
            confidence: 0.0,
            stego_type: String::new(),
            extracted_message: String::new(),
            extraction_error: "not_scanned".to_string(),
        }
    }
}

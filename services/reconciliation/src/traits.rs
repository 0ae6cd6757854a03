//! External capabilities the reconciliation engine depends on but does
//! not own: the ingestion store and the IPFS client. Neither
//! persists anything itself; both are handed to the engine at
//! construction time.

use std::collections::BTreeMap;

use async_trait::async_trait;
use starlight_types::{IngestionRecord, IngestionStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, CapabilityError>;

#[derive(Debug, Clone, Default)]
pub struct IngestionFilter {
    pub status: Option<IngestionStatus>,
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait IngestionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<IngestionRecord>;
    async fn list_recent(&self, filter: IngestionFilter, limit: usize) -> Result<Vec<IngestionRecord>>;
    async fn update_metadata(&self, id: &str, metadata: BTreeMap<String, String>) -> Result<()>;
    async fn update_status_with_note(&self, id: &str, status: IngestionStatus, note: &str) -> Result<()>;
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait IpfsClient: Send + Sync {
    async fn cat(&self, cid: &str) -> Result<Vec<u8>>;
    async fn unpin(&self, path: &str) -> Result<()>;
}

//! `IpfsClient` adapter: an HTTP gateway client when
//! `IPFS_API_BASE` is configured, otherwise `Unavailable` for every
//! call — which `relocate_ingestion_image` already treats as
//! "no IPFS copy, fall back to the upload dir or embedded base64".

use async_trait::async_trait;
use reconciliation::{CapabilityError, IpfsClient};

type Result<T> = std::result::Result<T, CapabilityError>;

pub struct HttpIpfsClient {
    base: Option<String>,
    http: reqwest::Client,
}

impl HttpIpfsClient {
    pub fn new(base: Option<String>) -> Self {
        Self { base, http: reqwest::Client::new() }
    }
}

#[async_trait]
impl IpfsClient for HttpIpfsClient {
    async fn cat(&self, cid: &str) -> Result<Vec<u8>> {
        let Some(base) = &self.base else { return Err(CapabilityError::Unavailable("IPFS_API_BASE not configured".into())) };
        let url = format!("{base}/ipfs/{cid}");
        let resp = self.http.get(&url).send().await.map_err(|e| CapabilityError::Unavailable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(CapabilityError::Unavailable(format!("ipfs gateway status {}", resp.status())));
        }
        resp.bytes().await.map(|b| b.to_vec()).map_err(|e| CapabilityError::Unavailable(e.to_string()))
    }

    async fn unpin(&self, path: &str) -> Result<()> {
        let Some(base) = &self.base else { return Err(CapabilityError::Unavailable("IPFS_API_BASE not configured".into())) };
        let url = format!("{base}/api/v0/pin/rm");
        self.http
            .post(&url)
            .query(&[("arg", path)])
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| CapabilityError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

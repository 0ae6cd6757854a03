//! HTTP implementation of [`ChainClient`] against an esplora-family
//! API (blockstream.info / mempool.space).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use starlight_types::{AddressUtxo, Transaction, TxOutput};

use crate::client::{ChainClient, FeeEstimates, TxStatus};
use crate::error::{ChainClientError, Result};
use crate::rate_limit::RateLimiter;
use crate::retry::{with_retry, DEFAULT_MAX_ATTEMPTS};

const LIGHT_CALL_TIMEOUT: Duration = Duration::from_secs(30);
const RAW_BLOCK_TIMEOUT: Duration = Duration::from_secs(60);

pub struct EsploraChainClient {
    /// Configured fallback endpoints, tried in order.
    bases: Vec<String>,
    http: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
}

impl EsploraChainClient {
    pub fn new(bases: Vec<String>, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            bases,
            http: reqwest::Client::new(),
            rate_limiter,
        }
    }

    /// Single esplora base URL, no fallbacks — used when
    /// `MEMPOOL_API_BASE` overrides the network default.
    pub fn single(base: impl Into<String>, rate_limiter: Arc<RateLimiter>) -> Self {
        Self::new(vec![base.into()], rate_limiter)
    }

    async fn acquire(&self) {
        loop {
            match self.rate_limiter.try_acquire() {
                Ok(()) => return,
                Err(wait) => tokio::time::sleep(wait).await,
            }
        }
    }

    async fn get_text(&self, path: &str, timeout: Duration) -> Result<String> {
        let mut last_err = None;
        for base in &self.bases {
            self.acquire().await;
            let url = format!("{base}{path}");
            match self.http.get(&url).timeout(timeout).send().await {
                Ok(resp) if resp.status().is_success() => {
                    return resp
                        .text()
                        .await
                        .map_err(|e| ChainClientError::Decode { endpoint: url, message: e.to_string() });
                }
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let message = resp.text().await.unwrap_or_default();
                    last_err = Some(if status == 429 || status >= 500 {
                        ChainClientError::Transient { endpoint: url, message }
                    } else {
                        ChainClientError::Permanent { endpoint: url, status, message }
                    });
                }
                Err(e) => {
                    last_err = Some(ChainClientError::Transient { endpoint: url, message: e.to_string() });
                }
            }
        }
        Err(last_err.unwrap_or(ChainClientError::AllEndpointsExhausted(path.to_string())))
    }

    async fn get_bytes(&self, path: &str, timeout: Duration) -> Result<Vec<u8>> {
        let mut last_err = None;
        for base in &self.bases {
            self.acquire().await;
            let url = format!("{base}{path}");
            match self.http.get(&url).timeout(timeout).send().await {
                Ok(resp) if resp.status().is_success() => {
                    return resp
                        .bytes()
                        .await
                        .map(|b| b.to_vec())
                        .map_err(|e| ChainClientError::Decode { endpoint: url, message: e.to_string() });
                }
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let message = resp.text().await.unwrap_or_default();
                    last_err = Some(if status == 429 || status >= 500 {
                        ChainClientError::Transient { endpoint: url, message }
                    } else {
                        ChainClientError::Permanent { endpoint: url, status, message }
                    });
                }
                Err(e) => {
                    last_err = Some(ChainClientError::Transient { endpoint: url, message: e.to_string() });
                }
            }
        }
        Err(last_err.unwrap_or(ChainClientError::AllEndpointsExhausted(path.to_string())))
    }

    async fn post_text(&self, path: &str, body: String, timeout: Duration) -> Result<String> {
        let mut last_err = None;
        for base in &self.bases {
            self.acquire().await;
            let url = format!("{base}{path}");
            match self.http.post(&url).body(body.clone()).timeout(timeout).send().await {
                Ok(resp) if resp.status().is_success() => {
                    return resp
                        .text()
                        .await
                        .map_err(|e| ChainClientError::Decode { endpoint: url, message: e.to_string() });
                }
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let message = resp.text().await.unwrap_or_default();
                    last_err = Some(if status == 429 || status >= 500 {
                        ChainClientError::Transient { endpoint: url, message }
                    } else {
                        ChainClientError::Permanent { endpoint: url, status, message }
                    });
                }
                Err(e) => {
                    last_err = Some(ChainClientError::Transient { endpoint: url, message: e.to_string() });
                }
            }
        }
        Err(last_err.unwrap_or(ChainClientError::AllEndpointsExhausted(path.to_string())))
    }
}

#[async_trait]
impl ChainClient for EsploraChainClient {
    #[tracing::instrument(skip(self))]
    async fn current_height(&self) -> Result<u64> {
        with_retry(DEFAULT_MAX_ATTEMPTS, Duration::from_secs(1), || async {
            let text = self.get_text("/blocks/tip/height", LIGHT_CALL_TIMEOUT).await?;
            text.trim()
                .parse::<u64>()
                .map_err(|e| ChainClientError::Decode { endpoint: "/blocks/tip/height".into(), message: e.to_string() })
        })
        .await
    }

    async fn block_hash(&self, height: u64) -> Result<String> {
        let text = self.get_text(&format!("/block-height/{height}"), LIGHT_CALL_TIMEOUT).await?;
        Ok(text.trim().to_string())
    }

    async fn height_from_hash(&self, hash: &str) -> Result<u64> {
        let text = self.get_text(&format!("/block/{hash}/height"), LIGHT_CALL_TIMEOUT).await?;
        text.trim()
            .parse::<u64>()
            .map_err(|e| ChainClientError::Decode { endpoint: hash.to_string(), message: e.to_string() })
    }

    async fn block_transactions(&self, hash: &str) -> Result<Vec<String>> {
        let text = self.get_text(&format!("/block/{hash}/txs"), LIGHT_CALL_TIMEOUT).await?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| ChainClientError::Decode { endpoint: hash.to_string(), message: e.to_string() })?;
        let txids = value
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|tx| tx.get("txid").and_then(|t| t.as_str()).map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        Ok(txids)
    }

    async fn raw_block_hex(&self, height: u64) -> Result<String> {
        let hash = self.block_hash(height).await?;
        let bytes = self.get_bytes(&format!("/block/{hash}/raw"), RAW_BLOCK_TIMEOUT).await?;
        Ok(hex::encode(bytes))
    }

    async fn raw_tx_hex(&self, txid: &str) -> Result<String> {
        let bytes = self.get_bytes(&format!("/tx/{txid}/raw"), LIGHT_CALL_TIMEOUT).await?;
        Ok(hex::encode(bytes))
    }

    async fn tx_output(&self, txid: &str, vout: u32) -> Result<(Transaction, TxOutput)> {
        let raw_hex = self.raw_tx_hex(txid).await?;
        let raw = hex::decode(&raw_hex).map_err(|e| ChainClientError::Decode {
            endpoint: txid.to_string(),
            message: e.to_string(),
        })?;
        let tx = block_parser::parse_single_transaction(&raw).map_err(|e| ChainClientError::Decode {
            endpoint: txid.to_string(),
            message: e.to_string(),
        })?;
        let output = tx
            .outputs
            .get(vout as usize)
            .cloned()
            .ok_or_else(|| ChainClientError::OutputIndexOutOfRange {
                txid: txid.to_string(),
                vout,
                count: tx.outputs.len(),
            })?;
        Ok((tx, output))
    }

    async fn tx_status(&self, txid: &str) -> Result<TxStatus> {
        let text = self.get_text(&format!("/tx/{txid}/status"), LIGHT_CALL_TIMEOUT).await?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| ChainClientError::Decode { endpoint: txid.to_string(), message: e.to_string() })?;
        Ok(TxStatus {
            confirmed: value.get("confirmed").and_then(|v| v.as_bool()).unwrap_or(false),
            block_height: value.get("block_height").and_then(|v| v.as_u64()),
            block_hash: value.get("block_hash").and_then(|v| v.as_str()).map(str::to_string),
        })
    }

    async fn list_confirmed_utxos(&self, address: &str) -> Result<Vec<AddressUtxo>> {
        let text = self.get_text(&format!("/address/{address}/utxo"), LIGHT_CALL_TIMEOUT).await?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| ChainClientError::Decode { endpoint: address.to_string(), message: e.to_string() })?;
        let utxos = value
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|u| {
                        let confirmed = u.get("status").and_then(|s| s.get("confirmed")).and_then(|c| c.as_bool()).unwrap_or(false);
                        if !confirmed {
                            return None;
                        }
                        Some(AddressUtxo {
                            txid: u.get("txid")?.as_str()?.to_string(),
                            vout: u.get("vout")?.as_u64()? as u32,
                            value_sats: u.get("value")?.as_u64()?,
                            confirmed,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(utxos)
    }

    async fn fee_estimates(&self) -> Result<FeeEstimates> {
        let text = self.get_text("/fee-estimates", LIGHT_CALL_TIMEOUT).await?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| ChainClientError::Decode { endpoint: "/fee-estimates".into(), message: e.to_string() })?;
        let get = |target: &str| value.get(target).and_then(|v| v.as_f64()).unwrap_or(1.0) as u64;
        Ok(FeeEstimates {
            fast: get("2").max(1),
            medium: get("6").max(1),
            slow: get("144").max(1),
        })
    }

    async fn broadcast(&self, raw_tx_hex: &str) -> Result<String> {
        let text = self.post_text("/tx", raw_tx_hex.to_string(), LIGHT_CALL_TIMEOUT).await?;
        Ok(text.trim().trim_matches('"').to_string())
    }
}

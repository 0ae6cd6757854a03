//! Process-wide configuration, loaded once at startup from the
//! environment. No stable-memory persistence or upgrade event:
//! this is a plain process, not a canister.

use std::path::PathBuf;

use starlight_types::{BitcoinNetwork, NetworkParams};

#[derive(Debug, Clone)]
pub struct Config {
    pub network: NetworkParams,
    pub blocks_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub state_dir: PathBuf,
    pub donation_address: String,
    pub sweep_fee_rate: u64,
    pub mempool_api_base: Option<String>,
    pub ipfs_api_base: Option<String>,
    pub scanner_api_base: Option<String>,
}

impl Config {
    /// `BITCOIN_NETWORK` defaults to `testnet4`; every other
    /// variable falls back to its named default via a
    /// validate-then-default construction.
    pub fn from_env() -> Self {
        let network_tag = std::env::var("BITCOIN_NETWORK").unwrap_or_default();
        let network = BitcoinNetwork::from_env_tag(&network_tag);
        let blocks_dir = PathBuf::from(std::env::var("BLOCKS_DIR").unwrap_or_else(|_| "blocks".to_string()));
        let state_dir = blocks_dir.parent().map(|p| p.join("state")).unwrap_or_else(|| PathBuf::from("state"));

        Self {
            network: NetworkParams::for_network(network),
            uploads_dir: PathBuf::from(std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "/data/uploads".to_string())),
            blocks_dir,
            state_dir,
            donation_address: std::env::var("STARLIGHT_DONATION_ADDRESS").unwrap_or_default(),
            sweep_fee_rate: std::env::var("STARLIGHT_SWEEP_FEE_RATE").ok().and_then(|v| v.parse().ok()).unwrap_or(1),
            mempool_api_base: std::env::var("MEMPOOL_API_BASE").ok(),
            ipfs_api_base: std::env::var("IPFS_API_BASE").ok(),
            scanner_api_base: std::env::var("SCANNER_API_BASE").ok(),
        }
    }

    /// Esplora base URLs to try in order: an explicit `MEMPOOL_API_BASE` override first,
    /// then the network's default.
    pub fn chain_client_bases(&self) -> Vec<String> {
        let mut bases = Vec::new();
        if let Some(base) = &self.mempool_api_base {
            bases.push(base.clone());
        }
        bases.push(self.network.api_base.to_string());
        bases
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_client_bases_prefers_explicit_override() {
        let mut config = Config::from_env();
        config.mempool_api_base = Some("https://example.invalid/api".to_string());
        let bases = config.chain_client_bases();
        assert_eq!(bases[0], "https://example.invalid/api");
        assert_eq!(bases.len(), 2);
    }
}

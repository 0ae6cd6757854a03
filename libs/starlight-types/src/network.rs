use serde::{Deserialize, Serialize};

/// Bitcoin network tag, resolved at startup from `BITCOIN_NETWORK`
/// (default `testnet4`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BitcoinNetwork {
    Mainnet,
    Testnet,
    Testnet4,
    Signet,
}

impl BitcoinNetwork {
    pub fn from_env_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "mainnet" => BitcoinNetwork::Mainnet,
            "testnet" => BitcoinNetwork::Testnet,
            "signet" => BitcoinNetwork::Signet,
            // testnet4 is the default source network for this engine;
            // any unrecognized tag also falls back to it rather than
            // failing startup.
            _ => BitcoinNetwork::Testnet4,
        }
    }

    /// Maps to `bitcoin::Network` for address/script encoding.
    pub fn as_bitcoin_network(self) -> bitcoin::Network {
        match self {
            BitcoinNetwork::Mainnet => bitcoin::Network::Bitcoin,
            BitcoinNetwork::Testnet => bitcoin::Network::Testnet,
            // mempool.space's testnet4 and signet both use the same
            // address-encoding rules as `Testnet` in rust-bitcoin 0.31
            // (there is no distinct Testnet4 network constant upstream).
            BitcoinNetwork::Testnet4 => bitcoin::Network::Testnet,
            BitcoinNetwork::Signet => bitcoin::Network::Signet,
        }
    }
}

/// Per-network chain-client parameters.
#[derive(Debug, Clone)]
pub struct NetworkParams {
    pub network: BitcoinNetwork,
    pub api_base: &'static str,
}

impl NetworkParams {
    pub fn for_network(network: BitcoinNetwork) -> Self {
        let api_base = match network {
            BitcoinNetwork::Mainnet => "https://blockstream.info/api",
            BitcoinNetwork::Testnet => "https://blockstream.info/testnet/api",
            BitcoinNetwork::Testnet4 => "https://mempool.space/testnet4/api",
            BitcoinNetwork::Signet => "https://mempool.space/signet/api",
        };
        Self { network, api_base }
    }
}

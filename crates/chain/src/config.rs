//! Chain client configuration

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Chain client mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainMode {
    /// In-memory ledger for development - nothing leaves the process
    Mock,
    /// Live full-node JSON-RPC
    #[default]
    Live,
}

/// Well-known networks with public full nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    Devnet,
    Localnet,
}

impl Network {
    /// Public full-node URL for this network
    pub fn fullnode_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://fullnode.mainnet.sui.io:443",
            Network::Testnet => "https://fullnode.testnet.sui.io:443",
            Network::Devnet => "https://fullnode.devnet.sui.io:443",
            Network::Localnet => "http://127.0.0.1:9000",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Devnet => "devnet",
            Network::Localnet => "localnet",
        };
        f.write_str(name)
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "devnet" => Ok(Network::Devnet),
            "localnet" => Ok(Network::Localnet),
            other => Err(format!("unknown network: {}", other)),
        }
    }
}

/// Chain client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    /// Mock or Live
    pub mode: ChainMode,
    /// Full-node JSON-RPC endpoint (only used in Live mode)
    pub rpc_url: String,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::for_network(Network::Mainnet)
    }
}

impl ChainConfig {
    /// Create a mock configuration for development
    pub fn mock() -> Self {
        Self {
            mode: ChainMode::Mock,
            ..Default::default()
        }
    }

    /// Live configuration against a network's public full node
    pub fn for_network(network: Network) -> Self {
        Self {
            mode: ChainMode::Live,
            rpc_url: network.fullnode_url().to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }

    /// Live configuration against a custom endpoint
    pub fn custom(rpc_url: impl Into<String>) -> Self {
        Self {
            mode: ChainMode::Live,
            rpc_url: rpc_url.into(),
            request_timeout: Duration::from_secs(60),
        }
    }

    pub fn is_mock(&self) -> bool {
        self.mode == ChainMode::Mock
    }
}

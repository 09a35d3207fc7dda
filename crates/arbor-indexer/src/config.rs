use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use arbor_chain::{ChainConfig, PublisherConfig};
use arbor_crypto::MAX_TREE_HEIGHT;
use arbor_store::StorageConfig;
use arbor_tree::TreeConfig;

use crate::error::{IndexerError, IndexerResult};

/// `[server]` configuration section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 4000)),
        }
    }
}

/// Complete configuration file. Every section and field is optional.
///
/// ```toml
/// [tree]
/// height = 32
/// padding = "subtree"
///
/// [chain]
/// rpc_url = "http://127.0.0.1:5050/rpc"
/// contract = "0x04f2..."
///
/// [publisher]
/// relay_url = "http://127.0.0.1:8090/invoke"
/// # or sign locally instead:
/// # account_address = "0x05a1..."
/// # private_key = "0x0..."
///
/// [storage]
/// data_dir = "./data"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    pub tree: TreeConfig,
    pub chain: ChainConfig,
    pub publisher: PublisherConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

impl IndexerConfig {
    pub fn from_toml_str(raw: &str) -> IndexerResult<Self> {
        toml::from_str(raw).map_err(|e| IndexerError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> IndexerResult<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| IndexerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    pub fn to_toml_string(&self) -> IndexerResult<String> {
        toml::to_string_pretty(self).map_err(|e| IndexerError::Config(e.to_string()))
    }

    pub fn validate(&self) -> IndexerResult<()> {
        if self.tree.height == 0 || self.tree.height > MAX_TREE_HEIGHT {
            return Err(IndexerError::Config(format!(
                "tree.height must be within 1..={MAX_TREE_HEIGHT}, got {}",
                self.tree.height
            )));
        }
        if self.chain.chunk_size == 0 {
            return Err(IndexerError::Config("chain.chunk_size must be positive".into()));
        }
        if self.chain.event_names.is_empty() {
            return Err(IndexerError::Config("chain.event_names must not be empty".into()));
        }
        let publisher = &self.publisher;
        if publisher.account_address.is_some() != publisher.private_key.is_some() {
            return Err(IndexerError::Config(
                "publisher.account_address and publisher.private_key must be set together".into(),
            ));
        }
        if publisher.relay_url.is_some() && publisher.account().is_some() {
            return Err(IndexerError::Config(
                "publisher.relay_url and publisher account credentials are mutually exclusive"
                    .into(),
            ));
        }
        if self.publisher.is_enabled() && self.publisher_contract().is_none() {
            return Err(IndexerError::Config(
                "publisher is enabled but neither publisher.contract nor chain.contract is set"
                    .into(),
            ));
        }
        Ok(())
    }

    /// Registry contract the publisher submits to.
    pub fn publisher_contract(&self) -> Option<&str> {
        self.publisher.contract_or(&self.chain.contract)
    }
}

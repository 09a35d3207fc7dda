use std::time::Duration;

use serde::{Deserialize, Serialize};

use arbor_types::BlockNumber;

use crate::account::DEFAULT_CHAIN_ID;

/// Events whose first key marks a new commitment.
pub const DEFAULT_EVENT_NAMES: [&str; 4] = [
    "CommitmentCreated",
    "PrivateCommitmentCreated",
    "BridgeCommitmentCreated",
    "PrivateDeposit",
];

/// `[chain]` configuration section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub rpc_url: String,
    /// Address of the contract emitting commitment events.
    pub contract: String,
    /// First block to scan when the ledger is empty.
    pub start_block: BlockNumber,
    pub poll_interval_ms: u64,
    pub retry_delay_ms: u64,
    /// Page size for `starknet_getEvents`.
    pub chunk_size: u64,
    pub event_names: Vec<String>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:5050/rpc".to_string(),
            contract: String::new(),
            start_block: 0,
            poll_interval_ms: 6_000,
            retry_delay_ms: 6_000,
            chunk_size: 50,
            event_names: DEFAULT_EVENT_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ChainConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// `[publisher]` configuration section.
///
/// Roots are published either through a signing relay (`relay_url`) or
/// from an account whose key is held here (`account_address` plus
/// `private_key`). With neither set, publishing is disabled.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    pub relay_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Contract holding the accepted-roots registry; falls back to
    /// `chain.contract`.
    pub contract: Option<String>,
    pub account_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    /// Short-string chain id signed into account invokes.
    pub chain_id: Option<String>,
}

/// Account credentials taken from a [`PublisherConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountCredentials<'a> {
    pub account_address: &'a str,
    pub private_key: &'a str,
}

impl PublisherConfig {
    pub fn is_enabled(&self) -> bool {
        self.relay_url.is_some() || self.account().is_some()
    }

    /// Both halves of the account credentials, if both are set.
    pub fn account(&self) -> Option<AccountCredentials<'_>> {
        match (&self.account_address, &self.private_key) {
            (Some(account_address), Some(private_key)) => Some(AccountCredentials {
                account_address,
                private_key,
            }),
            _ => None,
        }
    }

    pub fn chain_id(&self) -> &str {
        self.chain_id.as_deref().unwrap_or(DEFAULT_CHAIN_ID)
    }

    /// Registry contract, preferring the publisher's own setting.
    pub fn contract_or<'a>(&'a self, fallback: &'a str) -> Option<&'a str> {
        self.contract
            .as_deref()
            .or(Some(fallback))
            .filter(|c| !c.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_legacy_polling() {
        let config = ChainConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(6));
        assert_eq!(config.chunk_size, 50);
        assert_eq!(config.event_names.len(), 4);
    }

    #[test]
    fn partial_section_keeps_defaults() {
        let config: ChainConfig = serde_json::from_str(r#"{"start_block": 900}"#).unwrap();
        assert_eq!(config.start_block, 900);
        assert_eq!(config.retry_delay_ms, 6_000);
    }

    #[test]
    fn publisher_contract_fallback() {
        let mut publisher = PublisherConfig::default();
        assert!(!publisher.is_enabled());
        assert_eq!(publisher.contract_or(""), None);
        assert_eq!(publisher.contract_or("0xabc"), Some("0xabc"));
        publisher.contract = Some("0xdef".into());
        assert_eq!(publisher.contract_or("0xabc"), Some("0xdef"));
    }

    #[test]
    fn account_needs_both_credentials() {
        let mut publisher = PublisherConfig {
            account_address: Some("0x4a".into()),
            ..PublisherConfig::default()
        };
        assert_eq!(publisher.account(), None);
        assert!(!publisher.is_enabled());

        publisher.private_key = Some("0x2b".into());
        let creds = publisher.account().unwrap();
        assert_eq!(creds.account_address, "0x4a");
        assert_eq!(creds.private_key, "0x2b");
        assert!(publisher.is_enabled());
        assert_eq!(publisher.chain_id(), "SN_SEPOLIA");
    }
}

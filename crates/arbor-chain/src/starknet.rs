//! Starknet JSON-RPC event source.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha3::{Digest, Keccak256};
use tracing::{debug, warn};

use arbor_types::BlockNumber;

use crate::config::ChainConfig;
use crate::error::{ChainError, ChainResult};
use crate::event::{CommitmentEvent, EmittedEvent};
use crate::source::EventSource;

/// Starknet selector of an event or entrypoint name: keccak-256 of the
/// ASCII name, masked to 250 bits, as a `0x` felt without leading zeros.
pub fn selector(name: &str) -> String {
    let mut digest: [u8; 32] = Keccak256::digest(name.as_bytes()).into();
    digest[0] &= 0x03;
    felt_hex(&digest)
}

fn felt_hex(bytes: &[u8]) -> String {
    let encoded = hex::encode(bytes);
    let trimmed = encoded.trim_start_matches('0');
    if trimmed.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{trimmed}")
    }
}

#[derive(Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct EventsPage {
    events: Vec<EmittedEvent>,
    #[serde(default)]
    continuation_token: Option<String>,
}

/// Polls a Starknet node for commitment events of one contract.
pub struct StarknetEventSource {
    client: reqwest::Client,
    rpc_url: String,
    contract: String,
    keys: Vec<String>,
    chunk_size: u64,
    next_id: AtomicU64,
}

impl StarknetEventSource {
    pub fn new(config: &ChainConfig) -> ChainResult<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: reqwest::Client, config: &ChainConfig) -> Self {
        Self {
            client,
            rpc_url: config.rpc_url.clone(),
            contract: config.contract.clone(),
            keys: config.event_names.iter().map(|name| selector(name)).collect(),
            chunk_size: config.chunk_size.max(1),
            next_id: AtomicU64::new(1),
        }
    }

    /// Event selectors used as the first-key filter.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    async fn call<P: Serialize + Send + Sync, R: DeserializeOwned + Send>(
        &self,
        method: &str,
        params: P,
    ) -> ChainResult<R> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self.client.post(&self.rpc_url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChainError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let envelope: RpcResponse<R> = response.json().await?;
        if let Some(err) = envelope.error {
            return Err(ChainError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        envelope.result.ok_or_else(|| ChainError::Rpc {
            code: 0,
            message: format!("{method}: response carried neither result nor error"),
        })
    }
}

#[async_trait]
impl EventSource for StarknetEventSource {
    async fn latest_block(&self) -> ChainResult<BlockNumber> {
        self.call("starknet_blockNumber", json!([])).await
    }

    async fn fetch(&self, from: BlockNumber, to: BlockNumber) -> ChainResult<Vec<CommitmentEvent>> {
        let mut decoded = Vec::new();
        let mut continuation: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut filter = json!({
                "from_block": { "block_number": from },
                "to_block": { "block_number": to },
                "address": self.contract,
                "keys": [self.keys],
                "chunk_size": self.chunk_size,
            });
            if let Some(token) = &continuation {
                filter["continuation_token"] = json!(token);
            }

            let page: EventsPage = self
                .call("starknet_getEvents", json!({ "filter": filter }))
                .await?;
            pages += 1;

            for event in &page.events {
                match event.decode()? {
                    Some(commitment) => decoded.push(commitment),
                    None => warn!(
                        tx = event.transaction_hash.as_deref().unwrap_or("?"),
                        "skipping event without block number"
                    ),
                }
            }

            match page.continuation_token {
                Some(token) if !token.is_empty() => continuation = Some(token),
                _ => break,
            }
        }

        decoded.sort_by_key(|event| event.block);
        debug!(from, to, pages, events = decoded.len(), "fetched commitment events");
        Ok(decoded)
    }
}

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::info;

use arbor_types::FieldElement;

use crate::error::{ChainError, ChainResult};

/// Entrypoint of the accepted-roots registry.
pub const SUBMIT_ENTRYPOINT: &str = "submit_merkle_root";

/// Proof that the chain accepted a root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub tx_hash: Option<String>,
}

/// Outbound side of the chain: publish one root.
#[async_trait]
pub trait RootSubmitter: Send + Sync {
    /// Submit `root` and wait for acceptance. Any error leaves the root
    /// unsubmitted.
    async fn submit(&self, root: &FieldElement) -> ChainResult<SubmitReceipt>;
}

/// An invoke of `submit_merkle_root(low, high)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubmitCall {
    pub contract: String,
    pub entrypoint: String,
    pub calldata: [String; 2],
}

impl SubmitCall {
    pub fn for_root(contract: &str, root: &FieldElement) -> Self {
        Self {
            contract: contract.to_string(),
            entrypoint: SUBMIT_ENTRYPOINT.to_string(),
            calldata: root.to_u256_halves().calldata(),
        }
    }

    /// The same call as a `starkli invoke` command line.
    pub fn starkli_command(&self) -> String {
        format!(
            "starkli invoke {} {} {} {}",
            self.contract, self.entrypoint, self.calldata[0], self.calldata[1]
        )
    }
}

#[derive(Deserialize)]
struct RelayResponse {
    transaction_hash: Option<String>,
}

/// Submits roots through an HTTP signing relay that owns the account key.
///
/// The relay receives `{contract, entrypoint, calldata}` and answers with
/// `{transaction_hash}` once the transaction is accepted.
pub struct RelaySubmitter {
    client: reqwest::Client,
    relay_url: String,
    contract: String,
}

impl RelaySubmitter {
    pub fn new(relay_url: &str, contract: &str, auth_token: Option<&str>) -> ChainResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ChainError::InvalidHeader(e.to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            relay_url: relay_url.trim_end_matches('/').to_string(),
            contract: contract.to_string(),
        })
    }

    pub fn contract(&self) -> &str {
        &self.contract
    }
}

#[async_trait]
impl RootSubmitter for RelaySubmitter {
    async fn submit(&self, root: &FieldElement) -> ChainResult<SubmitReceipt> {
        let call = SubmitCall::for_root(&self.contract, root);
        let response = self.client.post(&self.relay_url).json(&call).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChainError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: RelayResponse = response.json().await?;
        info!(%root, tx = body.transaction_hash.as_deref().unwrap_or("?"), "root submitted");
        Ok(SubmitReceipt {
            tx_hash: body.transaction_hash,
        })
    }
}

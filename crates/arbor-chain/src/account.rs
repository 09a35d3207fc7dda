//! Root submission signed in-process with the publisher account's key.

use async_trait::async_trait;
use ::starknet::accounts::{Account, ExecutionEncoding, SingleOwnerAccount};
use ::starknet::core::types::{Call, Felt};
use ::starknet::core::utils::{cairo_short_string_to_felt, get_selector_from_name};
use ::starknet::providers::jsonrpc::{HttpTransport, JsonRpcClient};
use ::starknet::providers::Url;
use ::starknet::signers::{LocalWallet, SigningKey};
use tracing::info;

use arbor_types::FieldElement;

use crate::error::{ChainError, ChainResult};
use crate::submitter::{RootSubmitter, SubmitReceipt, SUBMIT_ENTRYPOINT};

/// Chain id used when the publisher section does not name one.
pub const DEFAULT_CHAIN_ID: &str = "SN_SEPOLIA";

/// Credentials and endpoint for [`AccountSubmitter`].
#[derive(Clone, Debug)]
pub struct AccountSettings<'a> {
    pub rpc_url: &'a str,
    pub contract: &'a str,
    pub account_address: &'a str,
    pub private_key: &'a str,
    /// Short-string chain id, e.g. `SN_MAIN`.
    pub chain_id: &'a str,
}

/// Submits roots as invoke transactions from a single-owner account.
///
/// The transaction is signed locally and sent through the node at
/// `rpc_url`. The receipt carries the transaction hash once the node has
/// accepted the invoke.
pub struct AccountSubmitter {
    account: SingleOwnerAccount<JsonRpcClient<HttpTransport>, LocalWallet>,
    contract: Felt,
    selector: Felt,
}

impl AccountSubmitter {
    pub fn new(settings: &AccountSettings<'_>) -> ChainResult<Self> {
        let url = Url::parse(settings.rpc_url)
            .map_err(|e| ChainError::Config(format!("invalid rpc url: {e}")))?;
        let provider = JsonRpcClient::new(HttpTransport::new(url));

        let key = parse_felt("private key", settings.private_key)?;
        let signer = LocalWallet::from(SigningKey::from_secret_scalar(key));
        let address = parse_felt("account address", settings.account_address)?;
        let chain_id = cairo_short_string_to_felt(settings.chain_id)
            .map_err(|e| ChainError::Config(format!("invalid chain id: {e}")))?;

        let account =
            SingleOwnerAccount::new(provider, signer, address, chain_id, ExecutionEncoding::New);
        let selector = get_selector_from_name(SUBMIT_ENTRYPOINT)
            .map_err(|e| ChainError::Config(e.to_string()))?;

        Ok(Self {
            account,
            contract: parse_felt("contract", settings.contract)?,
            selector,
        })
    }

    pub fn account_address(&self) -> Felt {
        self.account.address()
    }

    fn call_for(&self, root: &FieldElement) -> Call {
        let halves = root.to_u256_halves();
        Call {
            to: self.contract,
            selector: self.selector,
            calldata: vec![Felt::from(halves.low), Felt::from(halves.high)],
        }
    }
}

fn parse_felt(what: &str, raw: &str) -> ChainResult<Felt> {
    Felt::from_hex(raw.trim()).map_err(|e| ChainError::Config(format!("invalid {what}: {e}")))
}

#[async_trait]
impl RootSubmitter for AccountSubmitter {
    async fn submit(&self, root: &FieldElement) -> ChainResult<SubmitReceipt> {
        let call = self.call_for(root);
        let result = self
            .account
            .execute_v3(vec![call])
            .send()
            .await
            .map_err(|e| ChainError::Account(e.to_string()))?;

        let tx_hash = format!("{:#x}", result.transaction_hash);
        info!(%root, tx = %tx_hash, "root submitted from account");
        Ok(SubmitReceipt {
            tx_hash: Some(tx_hash),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;

    const KEY: &str = "0x2bbf4f9fd0bbb2e60b0316c1fe0b76cf7a4d0198bd493ced9b8df2a3a24d68a";
    const ADDRESS: &str = "0x4a0f7b1d3e5c9a8e2b6d0f4c8a2e6b0d4f8c2a6e0b4d8f2c6a0e4b8d2f6c0a4";

    fn settings(rpc_url: &str) -> AccountSettings<'_> {
        AccountSettings {
            rpc_url,
            contract: "0x0123",
            account_address: ADDRESS,
            private_key: KEY,
            chain_id: DEFAULT_CHAIN_ID,
        }
    }

    #[test]
    fn call_targets_registry_with_root_halves() {
        let submitter = AccountSubmitter::new(&settings("http://127.0.0.1:5050/rpc")).unwrap();
        let root: FieldElement = "340282366920938463463374607431768211458".parse().unwrap();
        let call = submitter.call_for(&root);

        assert_eq!(call.to, Felt::from_hex("0x123").unwrap());
        assert_eq!(
            call.selector,
            Felt::from_hex(&crate::starknet::selector(SUBMIT_ENTRYPOINT)).unwrap()
        );
        assert_eq!(call.calldata, vec![Felt::from(2u128), Felt::from(1u128)]);
        assert_eq!(submitter.account_address(), Felt::from_hex(ADDRESS).unwrap());
    }

    #[test]
    fn malformed_credentials_are_config_errors() {
        let mut bad_key = settings("http://127.0.0.1:5050/rpc");
        bad_key.private_key = "not-a-key";
        assert!(matches!(AccountSubmitter::new(&bad_key), Err(ChainError::Config(_))));

        let mut bad_url = settings("http://127.0.0.1:5050/rpc");
        bad_url.rpc_url = "::";
        assert!(matches!(AccountSubmitter::new(&bad_url), Err(ChainError::Config(_))));

        let err = AccountSubmitter::new(&bad_key).err().unwrap();
        assert!(!err.is_transient());
    }

    /// Node that answers every call with an internal error.
    async fn spawn_failing_node(seen: Arc<Mutex<Vec<String>>>) -> String {
        let app = Router::new().route(
            "/rpc",
            post(move |Json(req): Json<Value>| {
                let seen = Arc::clone(&seen);
                async move {
                    let method = req["method"].as_str().unwrap_or_default().to_string();
                    seen.lock().unwrap().push(method);
                    Json(json!({
                        "jsonrpc": "2.0",
                        "id": req["id"],
                        "error": { "code": -32603, "message": "node unavailable" },
                    }))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}/rpc")
    }

    #[tokio::test]
    async fn node_failure_leaves_root_unsubmitted() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let url = spawn_failing_node(Arc::clone(&seen)).await;
        let submitter = AccountSubmitter::new(&settings(&url)).unwrap();

        let err = submitter.submit(&FieldElement::from_u64(5)).await.unwrap_err();
        assert!(matches!(err, ChainError::Account(_)));
        assert!(err.is_transient());
        assert!(!seen.lock().unwrap().is_empty());
    }
}

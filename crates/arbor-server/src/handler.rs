use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use arbor_chain::SubmitCall;
use arbor_crypto::MerklePath;
use arbor_indexer::{SubmitOutcome, SubmitResult};
use arbor_types::{BlockNumber, FieldElement, LeafIndex, U256Halves};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub root: Option<FieldElement>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub leaves: u64,
    #[serde(rename = "latestRoot")]
    pub latest_root: Option<FieldElement>,
    pub generation: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PendingRoot {
    pub root: FieldElement,
    pub block: BlockNumber,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PendingResponse {
    pub pending: Vec<PendingRoot>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmitRootRequest {
    #[serde(default)]
    pub root: Option<FieldElement>,
}

#[derive(Debug, Serialize)]
pub struct SubmitAllResponse {
    pub submitted: usize,
    pub results: Vec<SubmitResult>,
}

pub async fn root_handler(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        root: state.proofs.populated_root(),
    })
}

pub async fn path_by_index_handler(
    State(state): State<AppState>,
    Path(index): Path<String>,
) -> ServerResult<Json<MerklePath>> {
    let leaf_index: LeafIndex = index
        .parse()
        .map_err(|_| ServerError::BadRequest(format!("invalid index {index:?}")))?;
    Ok(Json(state.proofs.path_for_index(leaf_index)?))
}

pub async fn path_by_commitment_handler(
    State(state): State<AppState>,
    Path(commitment): Path<String>,
) -> ServerResult<Json<MerklePath>> {
    let commitment: FieldElement = commitment
        .parse()
        .map_err(|e| ServerError::BadRequest(format!("invalid commitment: {e}")))?;
    Ok(Json(state.proofs.path_for_commitment(&commitment)?))
}

pub async fn health_handler(State(state): State<AppState>) -> ServerResult<Json<HealthResponse>> {
    let snapshot = state.proofs.snapshot();
    let reason = state.ingest.status().halted();
    Ok(Json(HealthResponse {
        status: if reason.is_some() { "halted" } else { "ok" }.to_string(),
        leaves: snapshot.tree.len(),
        latest_root: state.roots.latest()?.map(|record| record.root),
        generation: snapshot.generation,
        reason,
    }))
}

pub async fn pending_roots_handler(
    State(state): State<AppState>,
) -> ServerResult<Json<PendingResponse>> {
    let pending = state
        .roots
        .list_unsubmitted()?
        .into_iter()
        .map(|record| PendingRoot {
            root: record.root,
            block: record.observed_at_block,
        })
        .collect();
    Ok(Json(PendingResponse { pending }))
}

/// Body is optional; an empty body submits the newest pending root.
pub async fn submit_root_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> ServerResult<Json<Value>> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        SubmitRootRequest::default()
    } else {
        serde_json::from_slice::<SubmitRootRequest>(&body)
            .map_err(|e| ServerError::BadRequest(format!("invalid request body: {e}")))?
    };

    let response = match state.ingest.submit_root(request.root).await? {
        SubmitOutcome::Submitted { root, tx_hash } => json!({
            "success": true,
            "root": root,
            "transaction_hash": tx_hash,
        }),
        SubmitOutcome::Calldata { root, calldata } => {
            calldata_response(root, calldata, state.contract.as_deref())
        }
    };
    Ok(Json(response))
}

fn calldata_response(root: FieldElement, calldata: U256Halves, contract: Option<&str>) -> Value {
    let mut response = json!({
        "message": "No root submitter configured. Submit this calldata manually.",
        "root": root,
        "calldata": calldata,
    });
    if let Some(contract) = contract {
        response["command"] = json!(SubmitCall::for_root(contract, &root).starkli_command());
    }
    response
}

pub async fn submit_all_roots_handler(
    State(state): State<AppState>,
) -> ServerResult<Json<SubmitAllResponse>> {
    let results = state.ingest.submit_all().await?;
    Ok(Json(SubmitAllResponse {
        submitted: results.iter().filter(|r| r.success).count(),
        results,
    }))
}

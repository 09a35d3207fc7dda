use std::sync::Arc;

use arbor_indexer::{LoopHandle, ProofService};
use arbor_store::RootReader;

/// Shared handler state. Read-only handles plus the loop's command channel.
#[derive(Clone)]
pub struct AppState {
    pub proofs: ProofService,
    pub roots: Arc<dyn RootReader>,
    pub ingest: LoopHandle,
    /// Root contract named in manual submission commands.
    pub contract: Option<String>,
}

impl AppState {
    pub fn new(proofs: ProofService, roots: Arc<dyn RootReader>, ingest: LoopHandle) -> Self {
        Self {
            proofs,
            roots,
            ingest,
            contract: None,
        }
    }

    pub fn with_contract(mut self, contract: impl Into<String>) -> Self {
        self.contract = Some(contract.into());
        self
    }
}

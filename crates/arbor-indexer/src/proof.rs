use std::sync::Arc;

use arbor_crypto::MerklePath;
use arbor_store::LedgerReader;
use arbor_types::{FieldElement, LeafIndex};

use crate::error::{IndexerError, IndexerResult};
use crate::snapshot::{SnapshotCell, TreeSnapshot};

/// Read-only query surface over the current snapshot.
///
/// Every answer is computed against one snapshot loaded at the start of the
/// call, so a root and its path always belong to the same tree.
#[derive(Clone)]
pub struct ProofService {
    snapshots: Arc<SnapshotCell>,
    ledger: Arc<dyn LedgerReader>,
}

impl ProofService {
    pub fn new(snapshots: Arc<SnapshotCell>, ledger: Arc<dyn LedgerReader>) -> Self {
        Self { snapshots, ledger }
    }

    pub fn snapshot(&self) -> Arc<TreeSnapshot> {
        self.snapshots.load()
    }

    /// Root of the current tree; the empty-tree constant when no leaf exists.
    pub fn current_root(&self) -> FieldElement {
        self.snapshots.load().tree.root()
    }

    /// Root of the current tree, or `None` while it has no leaves.
    pub fn populated_root(&self) -> Option<FieldElement> {
        let snapshot = self.snapshots.load();
        (!snapshot.tree.is_empty()).then(|| snapshot.tree.root())
    }

    pub fn path_for_index(&self, leaf_index: LeafIndex) -> IndexerResult<MerklePath> {
        let snapshot = self.snapshots.load();
        if leaf_index >= snapshot.tree.len() {
            return Err(IndexerError::NotFound(format!(
                "leaf index {leaf_index} out of range (tree has {} leaves)",
                snapshot.tree.len()
            )));
        }
        Ok(snapshot.tree.path(leaf_index)?)
    }

    pub fn path_for_commitment(&self, commitment: &FieldElement) -> IndexerResult<MerklePath> {
        let snapshot = self.snapshots.load();
        let leaf_index = self
            .ledger
            .find_by_commitment(commitment)?
            .ok_or_else(|| IndexerError::NotFound(format!("commitment {commitment} not found")))?;

        // The ledger may run ahead of the snapshot for the length of a rebuild.
        if snapshot.tree.leaf(leaf_index) != Some(*commitment) {
            return Err(IndexerError::NotFound(format!(
                "commitment {commitment} is not in the current tree yet"
            )));
        }
        Ok(snapshot.tree.path(leaf_index)?)
    }
}

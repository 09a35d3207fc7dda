//! Volatile backends for tests and ephemeral runs.

use std::sync::RwLock;

use chrono::Utc;

use arbor_types::{
    BlockNumber, CommitmentLeaf, FieldElement, InsertOutcome, LeafIndex, RecordOutcome,
    RootRecord,
};

use crate::error::StoreResult;
use crate::state::{InsertDecision, LedgerIndex, RootIndex, RootLogEntry};
use crate::traits::{LedgerReader, LedgerWriter, RootReader, RootWriter};

/// Commitment ledger held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    index: RwLock<LedgerIndex>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerWriter for InMemoryLedger {
    fn insert(&self, leaf: &CommitmentLeaf) -> StoreResult<InsertOutcome> {
        let mut index = self.index.write().expect("lock poisoned");
        match index.decide(leaf)? {
            InsertDecision::Duplicate => Ok(InsertOutcome::SKIPPED),
            InsertDecision::Append => {
                index.apply(leaf.clone());
                Ok(InsertOutcome::INSERTED)
            }
        }
    }
}

impl LedgerReader for InMemoryLedger {
    fn list_ordered(&self) -> StoreResult<Vec<CommitmentLeaf>> {
        self.list_from(0)
    }

    fn list_from(&self, from: LeafIndex) -> StoreResult<Vec<CommitmentLeaf>> {
        Ok(self.index.read().expect("lock poisoned").list_from(from))
    }

    fn get(&self, leaf_index: LeafIndex) -> StoreResult<Option<CommitmentLeaf>> {
        Ok(self.index.read().expect("lock poisoned").get(leaf_index))
    }

    fn find_by_commitment(&self, commitment: &FieldElement) -> StoreResult<Option<LeafIndex>> {
        Ok(self.index.read().expect("lock poisoned").find(commitment))
    }

    fn count(&self) -> StoreResult<u64> {
        Ok(self.index.read().expect("lock poisoned").len())
    }

    fn last_block(&self) -> StoreResult<Option<BlockNumber>> {
        Ok(self.index.read().expect("lock poisoned").last_block())
    }
}

/// Root store held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryRootStore {
    index: RwLock<RootIndex>,
}

impl InMemoryRootStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RootWriter for InMemoryRootStore {
    fn record_if_new(&self, root: &FieldElement, block: BlockNumber) -> StoreResult<RecordOutcome> {
        let mut index = self.index.write().expect("lock poisoned");
        if index.contains(root) {
            return Ok(RecordOutcome { recorded: false });
        }
        index.apply(RootLogEntry::Recorded {
            root: *root,
            block,
            recorded_at: Utc::now(),
        })?;
        Ok(RecordOutcome { recorded: true })
    }

    fn mark_submitted(&self, root: &FieldElement, tx_hash: Option<&str>) -> StoreResult<()> {
        let mut index = self.index.write().expect("lock poisoned");
        if index.needs_submission_mark(root)? {
            index.apply(RootLogEntry::Submitted {
                root: *root,
                tx_hash: tx_hash.map(str::to_owned),
                submitted_at: Utc::now(),
            })?;
        }
        Ok(())
    }
}

impl RootReader for InMemoryRootStore {
    fn get(&self, root: &FieldElement) -> StoreResult<Option<RootRecord>> {
        Ok(self.index.read().expect("lock poisoned").get(root))
    }

    fn latest(&self) -> StoreResult<Option<RootRecord>> {
        Ok(self.index.read().expect("lock poisoned").latest())
    }

    fn list_unsubmitted(&self) -> StoreResult<Vec<RootRecord>> {
        Ok(self.index.read().expect("lock poisoned").unsubmitted())
    }

    fn count(&self) -> StoreResult<u64> {
        Ok(self.index.read().expect("lock poisoned").len())
    }
}

//! File-backed backends: an in-memory index rebuilt from a write-ahead log.

use std::path::Path;
use std::sync::RwLock;

use chrono::Utc;
use tracing::{debug, info};

use arbor_types::{
    BlockNumber, CommitmentLeaf, FieldElement, InsertOutcome, LeafIndex, RecordOutcome,
    RootRecord,
};

use crate::error::StoreResult;
use crate::state::{InsertDecision, LedgerIndex, RootIndex, RootLogEntry};
use crate::traits::{LedgerReader, LedgerWriter, RootReader, RootWriter};
use crate::wal::{WalConfig, WriteAheadLog};

/// Commitment ledger persisted as a log of inserted leaves.
///
/// Only appended leaves reach the log; duplicates and conflicts are decided
/// against the index first and never written.
pub struct FileLedger {
    index: RwLock<LedgerIndex>,
    wal: WriteAheadLog<CommitmentLeaf>,
}

impl FileLedger {
    pub fn open(path: &Path, config: WalConfig) -> StoreResult<Self> {
        let (wal, leaves) = WriteAheadLog::open(path, config)?;
        let mut index = LedgerIndex::default();
        for leaf in leaves {
            // A log written by this type never holds conflicts; replay through
            // `decide` anyway so a hand-edited file cannot corrupt the index.
            if index.decide(&leaf)? == InsertDecision::Append {
                index.apply(leaf);
            }
        }
        info!(path = %path.display(), leaves = index.len(), "commitment ledger opened");
        Ok(Self {
            index: RwLock::new(index),
            wal,
        })
    }
}

impl LedgerWriter for FileLedger {
    fn insert(&self, leaf: &CommitmentLeaf) -> StoreResult<InsertOutcome> {
        let mut index = self.index.write().expect("lock poisoned");
        match index.decide(leaf)? {
            InsertDecision::Duplicate => Ok(InsertOutcome::SKIPPED),
            InsertDecision::Append => {
                self.wal.append(leaf)?;
                index.apply(leaf.clone());
                debug!(leaf_index = leaf.leaf_index, "commitment persisted");
                Ok(InsertOutcome::INSERTED)
            }
        }
    }
}

impl LedgerReader for FileLedger {
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

/// Root store persisted as a log of record/submit events.
pub struct FileRootStore {
    index: RwLock<RootIndex>,
    wal: WriteAheadLog<RootLogEntry>,
}

impl FileRootStore {
    pub fn open(path: &Path, config: WalConfig) -> StoreResult<Self> {
        let (wal, entries) = WriteAheadLog::open(path, config)?;
        let mut index = RootIndex::default();
        for entry in entries {
            index.apply(entry)?;
        }
        info!(path = %path.display(), roots = index.len(), "root store opened");
        Ok(Self {
            index: RwLock::new(index),
            wal,
        })
    }

    fn commit(&self, index: &mut RootIndex, entry: RootLogEntry) -> StoreResult<()> {
        self.wal.append(&entry)?;
        index.apply(entry)
    }
}

impl RootWriter for FileRootStore {
    fn record_if_new(&self, root: &FieldElement, block: BlockNumber) -> StoreResult<RecordOutcome> {
        let mut index = self.index.write().expect("lock poisoned");
        if index.contains(root) {
            return Ok(RecordOutcome { recorded: false });
        }
        self.commit(
            &mut index,
            RootLogEntry::Recorded {
                root: *root,
                block,
                recorded_at: Utc::now(),
            },
        )?;
        Ok(RecordOutcome { recorded: true })
    }

    fn mark_submitted(&self, root: &FieldElement, tx_hash: Option<&str>) -> StoreResult<()> {
        let mut index = self.index.write().expect("lock poisoned");
        if !index.needs_submission_mark(root)? {
            return Ok(());
        }
        self.commit(
            &mut index,
            RootLogEntry::Submitted {
                root: *root,
                tx_hash: tx_hash.map(str::to_owned),
                submitted_at: Utc::now(),
            },
        )
    }
}

impl RootReader for FileRootStore {
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

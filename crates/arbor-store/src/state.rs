//! In-memory indexes shared by every backend.
//!
//! Backends decide a mutation against these indexes, persist it if needed,
//! then apply it, all under one write lock.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use arbor_types::{BlockNumber, CommitmentLeaf, FieldElement, LeafIndex, RootRecord};

use crate::error::{StoreError, StoreResult};

/// What an insert should do.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum InsertDecision {
    Append,
    Duplicate,
}

#[derive(Debug, Default)]
pub struct LedgerIndex {
    by_index: BTreeMap<LeafIndex, CommitmentLeaf>,
    by_commitment: HashMap<FieldElement, LeafIndex>,
}

impl LedgerIndex {
    pub(crate) fn decide(&self, leaf: &CommitmentLeaf) -> StoreResult<InsertDecision> {
        if let Some(existing) = self.by_index.get(&leaf.leaf_index) {
            if existing.commitment == leaf.commitment {
                return Ok(InsertDecision::Duplicate);
            }
            return Err(StoreError::Conflict {
                leaf_index: leaf.leaf_index,
                existing: existing.commitment,
                incoming: leaf.commitment,
            });
        }

        if let Some(other) = self.by_commitment.get(&leaf.commitment) {
            warn!(
                leaf_index = leaf.leaf_index,
                stored_at = *other,
                commitment = %leaf.commitment,
                "commitment already stored under another index; skipping"
            );
            return Ok(InsertDecision::Duplicate);
        }

        Ok(InsertDecision::Append)
    }

    pub(crate) fn apply(&mut self, leaf: CommitmentLeaf) {
        self.by_commitment.insert(leaf.commitment, leaf.leaf_index);
        self.by_index.insert(leaf.leaf_index, leaf);
    }

    pub(crate) fn list_from(&self, from: LeafIndex) -> Vec<CommitmentLeaf> {
        self.by_index.range(from..).map(|(_, leaf)| leaf.clone()).collect()
    }

    pub(crate) fn get(&self, leaf_index: LeafIndex) -> Option<CommitmentLeaf> {
        self.by_index.get(&leaf_index).cloned()
    }

    pub(crate) fn find(&self, commitment: &FieldElement) -> Option<LeafIndex> {
        self.by_commitment.get(commitment).copied()
    }

    pub(crate) fn len(&self) -> u64 {
        self.by_index.len() as u64
    }

    pub(crate) fn last_block(&self) -> Option<BlockNumber> {
        self.by_index.values().next_back().map(|leaf| leaf.block)
    }
}

/// Persisted form of a root store mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RootLogEntry {
    Recorded {
        root: FieldElement,
        block: BlockNumber,
        recorded_at: DateTime<Utc>,
    },
    Submitted {
        root: FieldElement,
        tx_hash: Option<String>,
        submitted_at: DateTime<Utc>,
    },
}

#[derive(Debug, Default)]
pub struct RootIndex {
    records: Vec<RootRecord>,
    by_root: HashMap<FieldElement, usize>,
}

impl RootIndex {
    pub(crate) fn contains(&self, root: &FieldElement) -> bool {
        self.by_root.contains_key(root)
    }

    /// `Ok(true)` if the root is recorded and still unsubmitted.
    pub(crate) fn needs_submission_mark(&self, root: &FieldElement) -> StoreResult<bool> {
        let position = self
            .by_root
            .get(root)
            .ok_or(StoreError::UnknownRoot(*root))?;
        Ok(!self.records[*position].submitted)
    }

    pub(crate) fn apply(&mut self, entry: RootLogEntry) -> StoreResult<()> {
        match entry {
            RootLogEntry::Recorded {
                root,
                block,
                recorded_at,
            } => {
                if self.contains(&root) {
                    return Ok(());
                }
                let mut record = RootRecord::new(root, block);
                record.recorded_at = recorded_at;
                self.by_root.insert(root, self.records.len());
                self.records.push(record);
            }
            RootLogEntry::Submitted {
                root,
                tx_hash,
                submitted_at,
            } => {
                let position = *self
                    .by_root
                    .get(&root)
                    .ok_or(StoreError::UnknownRoot(root))?;
                let record = &mut self.records[position];
                if !record.submitted {
                    record.submitted = true;
                    record.tx_hash = tx_hash;
                    record.submitted_at = Some(submitted_at);
                }
            }
        }
        Ok(())
    }

    pub(crate) fn get(&self, root: &FieldElement) -> Option<RootRecord> {
        self.by_root.get(root).map(|i| self.records[*i].clone())
    }

    pub(crate) fn latest(&self) -> Option<RootRecord> {
        self.records.last().cloned()
    }

    pub(crate) fn unsubmitted(&self) -> Vec<RootRecord> {
        self.records.iter().filter(|r| !r.submitted).cloned().collect()
    }

    pub(crate) fn len(&self) -> u64 {
        self.records.len() as u64
    }
}

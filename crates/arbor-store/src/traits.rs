use arbor_types::{
    BlockNumber, CommitmentLeaf, FieldElement, InsertOutcome, LeafIndex, RecordOutcome,
    RootRecord,
};

use crate::error::StoreResult;

/// Write boundary of the commitment ledger.
///
/// Only the ingestion cycle holds a writer.
pub trait LedgerWriter: Send + Sync {
    /// Append a commitment.
    ///
    /// Returns `inserted == false` when the exact `(leaf_index, commitment)`
    /// pair is already present, or when the commitment is already stored
    /// under another index. Fails with `StoreError::Conflict` when the index
    /// is bound to a different commitment.
    fn insert(&self, leaf: &CommitmentLeaf) -> StoreResult<InsertOutcome>;
}

/// Read boundary of the commitment ledger.
pub trait LedgerReader: Send + Sync {
    /// All leaves in ascending `leaf_index` order. May contain gaps if the
    /// upstream delivered indices out of order; callers must not assume
    /// density.
    fn list_ordered(&self) -> StoreResult<Vec<CommitmentLeaf>>;

    /// Leaves with `leaf_index >= from`, ascending.
    fn list_from(&self, from: LeafIndex) -> StoreResult<Vec<CommitmentLeaf>>;

    fn get(&self, leaf_index: LeafIndex) -> StoreResult<Option<CommitmentLeaf>>;

    fn find_by_commitment(&self, commitment: &FieldElement) -> StoreResult<Option<LeafIndex>>;

    /// Number of stored leaves.
    fn count(&self) -> StoreResult<u64>;

    /// Block of the leaf with the highest index; the polling resume point.
    fn last_block(&self) -> StoreResult<Option<BlockNumber>>;
}

/// Write boundary of the root store.
pub trait RootWriter: Send + Sync {
    /// Record a root unless a record with the same value exists. The first
    /// computation wins; its block is never overwritten.
    fn record_if_new(&self, root: &FieldElement, block: BlockNumber) -> StoreResult<RecordOutcome>;

    /// Flip `submitted` to true. A no-op for an already-submitted root;
    /// `StoreError::UnknownRoot` for a root never recorded.
    fn mark_submitted(&self, root: &FieldElement, tx_hash: Option<&str>) -> StoreResult<()>;
}

/// Read boundary of the root store.
pub trait RootReader: Send + Sync {
    fn get(&self, root: &FieldElement) -> StoreResult<Option<RootRecord>>;

    /// Most recently recorded root.
    fn latest(&self) -> StoreResult<Option<RootRecord>>;

    /// Unsubmitted roots, oldest first.
    fn list_unsubmitted(&self) -> StoreResult<Vec<RootRecord>>;

    fn count(&self) -> StoreResult<u64>;
}

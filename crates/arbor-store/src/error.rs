use arbor_types::{FieldElement, LeafIndex};

/// Errors from ledger and root store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A `leaf_index` is already bound to a different commitment. This is a
    /// data-integrity signal, not a duplicate.
    #[error("leaf {leaf_index} already holds {existing}, refusing {incoming}")]
    Conflict {
        leaf_index: LeafIndex,
        existing: FieldElement,
        incoming: FieldElement,
    },

    /// Attempted to mark a root that was never recorded.
    #[error("root {0} has not been recorded")]
    UnknownRoot(FieldElement),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Io(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

use arbor_crypto::CryptoError;
use arbor_types::LeafIndex;

/// Errors produced by tree construction and queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The leaf sequence skips or repeats an index. Signals an upstream
    /// indexing bug; the tree is never built over a gap.
    #[error("inconsistent leaf sequence: expected leaf_index {expected}, found {found}")]
    InconsistentLeaf { expected: LeafIndex, found: LeafIndex },

    #[error("tree capacity {capacity} exceeded by {requested} leaves")]
    CapacityExceeded { capacity: u128, requested: u128 },

    #[error("leaf index {index} beyond populated range of {len} leaves")]
    LeafOutOfRange { index: LeafIndex, len: u64 },

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Result alias for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;

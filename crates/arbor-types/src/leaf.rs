use serde::{Deserialize, Serialize};

use crate::field::FieldElement;

/// Position of a commitment in the canonical, gapless leaf enumeration.
pub type LeafIndex = u64;

/// Settlement-chain block height.
pub type BlockNumber = u64;

/// A commitment ingested from the chain.
///
/// Created once by the ingestion cycle, never mutated, never deleted. The
/// `leaf_index` is the contract-assigned position and is authoritative.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentLeaf {
    pub leaf_index: LeafIndex,
    pub commitment: FieldElement,
    /// Block in which the emitting event was observed.
    pub block: BlockNumber,
}

impl CommitmentLeaf {
    pub fn new(leaf_index: LeafIndex, commitment: FieldElement, block: BlockNumber) -> Self {
        Self {
            leaf_index,
            commitment,
            block,
        }
    }
}

/// Result of a ledger insert. `inserted == false` means an exact duplicate
/// (or an already-known commitment) was skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOutcome {
    pub inserted: bool,
}

impl InsertOutcome {
    pub const INSERTED: Self = Self { inserted: true };
    pub const SKIPPED: Self = Self { inserted: false };
}

use std::sync::{Arc, RwLock};

use arbor_tree::MerkleTree;
use arbor_types::BlockNumber;

/// One immutable tree state, as served to readers.
#[derive(Debug)]
pub struct TreeSnapshot {
    /// Increases by one on every swap.
    pub generation: u64,
    pub tree: MerkleTree,
    /// Chain head of the cycle that produced this tree.
    pub observed_block: Option<BlockNumber>,
}

/// Single-writer, multi-reader holder of the current [`TreeSnapshot`].
///
/// Readers clone the `Arc` and never observe a partially built tree; the
/// ingestion cycle replaces the pointer wholesale.
#[derive(Debug)]
pub struct SnapshotCell {
    current: RwLock<Arc<TreeSnapshot>>,
}

impl SnapshotCell {
    /// Start at generation 0 with `tree`.
    pub fn new(tree: MerkleTree, observed_block: Option<BlockNumber>) -> Self {
        Self {
            current: RwLock::new(Arc::new(TreeSnapshot {
                generation: 0,
                tree,
                observed_block,
            })),
        }
    }

    pub fn load(&self) -> Arc<TreeSnapshot> {
        Arc::clone(&self.current.read().expect("lock poisoned"))
    }

    /// Publish `tree` as the next generation and return it.
    pub fn swap(&self, tree: MerkleTree, observed_block: Option<BlockNumber>) -> Arc<TreeSnapshot> {
        let mut current = self.current.write().expect("lock poisoned");
        let next = Arc::new(TreeSnapshot {
            generation: current.generation + 1,
            tree,
            observed_block,
        });
        *current = Arc::clone(&next);
        next
    }

    pub fn generation(&self) -> u64 {
        self.current.read().expect("lock poisoned").generation
    }
}

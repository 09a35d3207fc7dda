use std::sync::Arc;

use arbor_crypto::{EmptyHashes, PairHasher, PoseidonHasher};
use arbor_types::CommitmentLeaf;

use crate::config::TreeConfig;
use crate::error::TreeResult;
use crate::tree::MerkleTree;

/// Computes trees from ordered leaf sequences under a fixed configuration.
///
/// Owns no persistent state beyond the hasher and the empty-subtree table,
/// both derived from the configuration.
pub struct TreeBuilder<H: PairHasher = PoseidonHasher> {
    config: TreeConfig,
    empty: Arc<EmptyHashes>,
    hasher: H,
}

impl TreeBuilder<PoseidonHasher> {
    /// Builder using the circuit's Poseidon hash.
    pub fn poseidon(config: TreeConfig) -> TreeResult<Self> {
        Self::new(config, PoseidonHasher::new()?)
    }
}

impl<H: PairHasher> TreeBuilder<H> {
    pub fn new(config: TreeConfig, mut hasher: H) -> TreeResult<Self> {
        let empty = EmptyHashes::compute(config.height, config.padding, &mut hasher)?;
        Ok(Self {
            config,
            empty: Arc::new(empty),
            hasher,
        })
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn empty_hashes(&self) -> &EmptyHashes {
        &self.empty
    }

    pub fn hasher_mut(&mut self) -> &mut H {
        &mut self.hasher
    }

    pub fn empty_tree(&self) -> MerkleTree {
        MerkleTree::empty(Arc::clone(&self.empty))
    }

    /// Build a tree from the complete ordered leaf sequence.
    pub fn build(&mut self, leaves: &[CommitmentLeaf]) -> TreeResult<MerkleTree> {
        self.empty_tree().appended(leaves, &mut self.hasher)
    }

    /// Append leaves to an existing tree, returning the new tree.
    pub fn extend(
        &mut self,
        tree: &MerkleTree,
        leaves: &[CommitmentLeaf],
    ) -> TreeResult<MerkleTree> {
        tree.appended(leaves, &mut self.hasher)
    }
}

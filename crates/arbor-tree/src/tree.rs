use std::ops::Index;
use std::sync::Arc;

use tracing::trace;

use arbor_crypto::{EmptyHashes, MerklePath, PairHasher};
use arbor_types::{CommitmentLeaf, FieldElement, LeafIndex};

use crate::error::{TreeError, TreeResult};

/// Nodes per shared chunk of a level.
const CHUNK: usize = 1024;

/// Node array of one level, stored as fixed-size chunks behind `Arc`.
///
/// Every chunk but the last is full. Cloning a level copies chunk pointers
/// only; a write clones the one chunk it lands in if another tree still
/// shares it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Level {
    chunks: Vec<Arc<Vec<FieldElement>>>,
    len: usize,
}

impl Level {
    fn len(&self) -> usize {
        self.len
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn get(&self, index: usize) -> Option<&FieldElement> {
        if index >= self.len {
            return None;
        }
        self.chunks[index / CHUNK].get(index % CHUNK)
    }

    fn push(&mut self, value: FieldElement) {
        if self.len % CHUNK == 0 {
            self.chunks.push(Arc::new(Vec::with_capacity(CHUNK)));
        }
        if let Some(last) = self.chunks.last_mut() {
            Arc::make_mut(last).push(value);
            self.len += 1;
        }
    }

    fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let keep = len.div_ceil(CHUNK);
        self.chunks.truncate(keep);
        if let Some(last) = self.chunks.last_mut() {
            let tail = len - (keep - 1) * CHUNK;
            if last.len() > tail {
                Arc::make_mut(last).truncate(tail);
            }
        }
        self.len = len;
    }

    fn iter(&self) -> impl Iterator<Item = &FieldElement> {
        self.chunks.iter().flat_map(|chunk| chunk.iter())
    }
}

impl Index<usize> for Level {
    type Output = FieldElement;

    fn index(&self, index: usize) -> &FieldElement {
        match self.get(index) {
            Some(value) => value,
            None => panic!("level index {index} out of range for length {}", self.len),
        }
    }
}

/// Immutable fixed-height Merkle tree over a gapless leaf prefix.
///
/// `levels[0]` holds the leaves, `levels[H]` holds the root once at least one
/// leaf exists. Level `l` stores exactly `ceil(n / 2^l)` nodes; every other
/// position reads as `empty[l]`. Trees derived from one another share all
/// chunks that the append did not touch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleTree {
    empty: Arc<EmptyHashes>,
    levels: Vec<Level>,
}

impl MerkleTree {
    /// A tree with no leaves; its root is `empty[H]`.
    pub fn empty(empty: Arc<EmptyHashes>) -> Self {
        let levels = vec![Level::default(); empty.height() + 1];
        Self { empty, levels }
    }

    pub fn height(&self) -> usize {
        self.empty.height()
    }

    /// Number of populated leaves.
    pub fn len(&self) -> u64 {
        self.levels[0].len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    pub fn root(&self) -> FieldElement {
        self.levels[self.height()]
            .get(0)
            .copied()
            .unwrap_or(*self.empty.empty_root())
    }

    pub fn empty_hashes(&self) -> &EmptyHashes {
        &self.empty
    }

    pub fn leaf(&self, index: LeafIndex) -> Option<FieldElement> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.levels[0].get(i))
            .copied()
    }

    pub fn leaves(&self) -> impl Iterator<Item = &FieldElement> {
        self.levels[0].iter()
    }

    /// Node value at `(level, index)`, falling back to the empty constant.
    pub fn node(&self, level: usize, index: u64) -> FieldElement {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.levels[level].get(i))
            .copied()
            .unwrap_or(*self.empty.at(level))
    }

    /// Sibling path for a populated leaf.
    pub fn path(&self, leaf_index: LeafIndex) -> TreeResult<MerklePath> {
        let commitment = self.leaf(leaf_index).ok_or(TreeError::LeafOutOfRange {
            index: leaf_index,
            len: self.len(),
        })?;

        let siblings = (0..self.height())
            .map(|level| self.node(level, (leaf_index >> level) ^ 1))
            .collect();

        Ok(MerklePath {
            leaf_index,
            commitment,
            siblings,
            root: self.root(),
        })
    }

    /// Return a new tree with `leaves` appended.
    ///
    /// `leaves[i]` must carry `leaf_index == self.len() + i`. Only nodes whose
    /// subtree contains a new leaf are rehashed.
    pub(crate) fn appended<H: PairHasher + ?Sized>(
        &self,
        leaves: &[CommitmentLeaf],
        hasher: &mut H,
    ) -> TreeResult<Self> {
        if leaves.is_empty() {
            return Ok(self.clone());
        }

        let old_len = self.len();
        for (offset, leaf) in leaves.iter().enumerate() {
            let expected = old_len + offset as u64;
            if leaf.leaf_index != expected {
                return Err(TreeError::InconsistentLeaf {
                    expected,
                    found: leaf.leaf_index,
                });
            }
        }

        let capacity = 1u128 << self.height();
        let requested = u128::from(old_len) + leaves.len() as u128;
        if requested > capacity {
            return Err(TreeError::CapacityExceeded {
                capacity,
                requested,
            });
        }

        let mut levels = self.levels.clone();
        for leaf in leaves {
            levels[0].push(leaf.commitment);
        }

        // First position at the current level whose value changed.
        let mut dirty = self.levels[0].len();
        for level in 0..self.height() {
            let (lower, upper) = levels.split_at_mut(level + 1);
            let children = &lower[level];
            let parents = &mut upper[0];

            let start = dirty / 2;
            let parent_len = children.len().div_ceil(2);
            parents.truncate(start);
            for k in start..parent_len {
                let left = &children[2 * k];
                let right = children.get(2 * k + 1).unwrap_or(self.empty.at(level));
                parents.push(hasher.hash_pair(left, right)?);
            }
            dirty = start;
        }

        trace!(
            from = old_len,
            to = requested as u64,
            "tree extended"
        );

        Ok(Self {
            empty: Arc::clone(&self.empty),
            levels,
        })
    }
}

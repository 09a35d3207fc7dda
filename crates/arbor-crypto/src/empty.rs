use serde::{Deserialize, Serialize};

use arbor_types::FieldElement;

use crate::error::{CryptoError, CryptoResult};
use crate::hasher::PairHasher;

/// Tree height of the reference deployment.
pub const DEFAULT_TREE_HEIGHT: usize = 32;

/// Largest supported height; leaf indices are `u64` and capacity is `2^H`.
pub const MAX_TREE_HEIGHT: usize = 63;

/// How unpopulated nodes are filled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Padding {
    /// `empty[0] = 0`, `empty[l + 1] = H2(empty[l], empty[l])`.
    #[default]
    Subtree,
    /// Every absent node is the literal zero at every level. Matches
    /// deployments whose paths were produced with zero-filled siblings.
    Zero,
}

/// Per-level value of a subtree containing no populated leaves.
///
/// Index `l` holds the value of an empty node at level `l` (level 0 being the
/// leaves); index `H` is the root of an empty tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmptyHashes {
    padding: Padding,
    levels: Vec<FieldElement>,
}

impl EmptyHashes {
    /// Precompute the table for a tree of the given height.
    pub fn compute<H: PairHasher + ?Sized>(
        height: usize,
        padding: Padding,
        hasher: &mut H,
    ) -> CryptoResult<Self> {
        if height == 0 || height > MAX_TREE_HEIGHT {
            return Err(CryptoError::InvalidHeight {
                height,
                max: MAX_TREE_HEIGHT,
            });
        }

        let mut levels = Vec::with_capacity(height + 1);
        levels.push(FieldElement::zero());
        for level in 0..height {
            let next = match padding {
                Padding::Subtree => hasher.hash_pair(&levels[level], &levels[level])?,
                Padding::Zero => FieldElement::zero(),
            };
            levels.push(next);
        }

        Ok(Self { padding, levels })
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    pub fn height(&self) -> usize {
        self.levels.len() - 1
    }

    /// Value of an empty node at `level`. Panics if `level > height`.
    pub fn at(&self, level: usize) -> &FieldElement {
        &self.levels[level]
    }

    /// Root of a tree with no leaves.
    pub fn empty_root(&self) -> &FieldElement {
        &self.levels[self.levels.len() - 1]
    }

    pub fn as_slice(&self) -> &[FieldElement] {
        &self.levels
    }
}

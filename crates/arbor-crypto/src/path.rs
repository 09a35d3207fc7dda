use serde::{Deserialize, Serialize};

use arbor_types::{FieldElement, LeafIndex};

use crate::error::{CryptoError, CryptoResult};
use crate::hasher::PairHasher;

/// Side of a sibling relative to the node on the path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Side of the sibling at `level` for the given leaf.
    ///
    /// Bit `level` of the index clear: the path node is the left input and the
    /// sibling sits on the right. Bit set: the sibling is the left input.
    pub fn of_sibling(leaf_index: LeafIndex, level: usize) -> Self {
        if (leaf_index >> level) & 1 == 0 {
            Side::Right
        } else {
            Side::Left
        }
    }
}

/// Inclusion path for one leaf, as served to the prover.
///
/// `siblings[l]` is the sibling at level `l`, leaf level first. The JSON form
/// is `{ leaf_index, commitment, siblings: [..], root }` with decimal strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerklePath {
    pub leaf_index: LeafIndex,
    pub commitment: FieldElement,
    pub siblings: Vec<FieldElement>,
    pub root: FieldElement,
}

impl MerklePath {
    pub fn height(&self) -> usize {
        self.siblings.len()
    }

    /// Re-derive the root from the commitment and siblings.
    pub fn compute_root<H: PairHasher + ?Sized>(
        &self,
        hasher: &mut H,
    ) -> CryptoResult<FieldElement> {
        fold_path(self.leaf_index, &self.commitment, &self.siblings, hasher)
    }

    /// Check the path against its own `root`, requiring exactly `height` siblings.
    pub fn verify<H: PairHasher + ?Sized>(
        &self,
        height: usize,
        hasher: &mut H,
    ) -> CryptoResult<bool> {
        if self.siblings.len() != height {
            return Err(CryptoError::PathLength {
                expected: height,
                actual: self.siblings.len(),
            });
        }
        Ok(self.compute_root(hasher)? == self.root)
    }
}

/// Fold a leaf up through its siblings with the circuit's left/right rule.
pub fn fold_path<H: PairHasher + ?Sized>(
    leaf_index: LeafIndex,
    leaf: &FieldElement,
    siblings: &[FieldElement],
    hasher: &mut H,
) -> CryptoResult<FieldElement> {
    let mut current = *leaf;
    for (level, sibling) in siblings.iter().enumerate() {
        current = match Side::of_sibling(leaf_index, level) {
            Side::Right => hasher.hash_pair(&current, sibling)?,
            Side::Left => hasher.hash_pair(sibling, &current)?,
        };
    }
    Ok(current)
}

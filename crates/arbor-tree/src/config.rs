use serde::{Deserialize, Serialize};

use arbor_crypto::{Padding, DEFAULT_TREE_HEIGHT};

/// Fixed shape of the tree. Must match the proving circuit exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Number of levels between the leaves and the root.
    pub height: usize,
    /// Fill value policy for unpopulated nodes.
    pub padding: Padding,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            height: DEFAULT_TREE_HEIGHT,
            padding: Padding::Subtree,
        }
    }
}

impl TreeConfig {
    pub fn with_height(height: usize) -> Self {
        Self {
            height,
            ..Self::default()
        }
    }

    /// Maximum number of leaves, `2^height`.
    pub fn capacity(&self) -> u128 {
        1u128 << self.height
    }
}

//! Fixed-height binary Merkle tree engine.
//!
//! The tree is a pure function of the ordered leaf sequence and a
//! [`TreeConfig`]. Internally it is an arena of per-level node arrays that
//! only hold the populated prefix of each level; every node outside the
//! prefix reads as the precomputed empty-subtree constant for its level.
//!
//! A [`MerkleTree`] value is immutable. Appending leaves with
//! [`TreeBuilder::extend`] produces a new tree and rehashes only the nodes
//! whose subtree gained a leaf, so the cost grows with the number of new
//! leaves times the height rather than with `2^H`. Level arrays are kept in
//! shared chunks, so the new tree copies only the chunks it writes to.

pub mod builder;
pub mod config;
pub mod error;
pub mod tree;

pub use builder::TreeBuilder;
pub use config::TreeConfig;
pub use error::{TreeError, TreeResult};
pub use tree::MerkleTree;

//! Foundation types for the arbor commitment indexer.
//!
//! Every other arbor crate depends on `arbor-types`. The types here are plain
//! data: they carry no storage or hashing behavior of their own.
//!
//! # Key Types
//!
//! - [`FieldElement`]: BN254 scalar, the unit of every leaf, node, and root
//! - [`U256Halves`]: low/high 128-bit split used as on-chain calldata
//! - [`CommitmentLeaf`]: one ingested commitment and its position in the tree
//! - [`RootRecord`]: a computed root and its publication state

pub mod error;
pub mod field;
pub mod leaf;
pub mod root;

pub use error::TypeError;
pub use field::{FieldElement, U256Halves};
pub use leaf::{BlockNumber, CommitmentLeaf, InsertOutcome, LeafIndex};
pub use root::{RecordOutcome, RootRecord};

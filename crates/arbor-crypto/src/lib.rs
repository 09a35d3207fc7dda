//! Hashing primitives for the arbor commitment indexer.
//!
//! Provides the two-input hash `H2` used at every tree level (circom-compatible
//! Poseidon over BN254), the per-level table of empty-subtree constants, and
//! the inclusion path type together with root re-derivation.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.
//! The left/right rule in [`MerklePath::compute_root`] is the one the proving
//! circuit applies; changing it silently breaks every proof.

pub mod empty;
pub mod error;
pub mod hasher;
pub mod path;

pub use empty::{EmptyHashes, Padding, DEFAULT_TREE_HEIGHT, MAX_TREE_HEIGHT};
pub use error::{CryptoError, CryptoResult};
pub use hasher::{PairHasher, PoseidonHasher};
pub use path::{fold_path, MerklePath, Side};

//! Durable state for the arbor commitment indexer.
//!
//! Two logical tables, each with its own reader/writer trait boundary:
//!
//! - the **commitment ledger**: append-only, unique by `leaf_index` and by
//!   `commitment`, ordered by `leaf_index`
//! - the **root store**: every distinct root ever computed, in order, with a
//!   one-way `submitted` flag
//!
//! # Storage Backends
//!
//! - [`InMemoryLedger`] / [`InMemoryRootStore`] -- for tests and ephemeral runs
//! - [`FileLedger`] / [`FileRootStore`] -- backed by a CRC-framed
//!   [`WriteAheadLog`]; state is rebuilt by replaying the log on open
//!
//! # Design Rules
//!
//! 1. Every mutation is written to the log before it becomes visible.
//! 2. Exact duplicates are skipped, never errors; a `leaf_index` bound to a
//!    different commitment is a [`StoreError::Conflict`].
//! 3. Nothing is ever deleted.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod durable;
pub mod error;
pub mod memory;
mod state;
pub mod storage;
pub mod traits;
pub mod wal;

pub use durable::{FileLedger, FileRootStore};
pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryLedger, InMemoryRootStore};
pub use storage::{Storage, StorageConfig};
pub use traits::{LedgerReader, LedgerWriter, RootReader, RootWriter};
pub use wal::{SyncMode, WalConfig, WriteAheadLog};

//! The arbor indexer core.
//!
//! A single [`IngestLoop`] owns the only [`Indexer`], and with it every write
//! to the ledger, the root store and the current [`TreeSnapshot`]. Readers
//! use a [`ProofService`], which only ever sees whole snapshots.
//!
//! ```text
//! EventSource -> Indexer::ingest -> ledger insert
//!                                -> TreeBuilder::extend
//!                                -> record_if_new(root)
//!                                -> SnapshotCell::swap
//!             -> Publisher::publish_pending (FIFO)
//! ```

pub mod config;
pub mod error;
pub mod indexer;
pub mod ingest_loop;
pub mod proof;
pub mod publisher;
pub mod snapshot;

pub use config::{IndexerConfig, ServerConfig};
pub use error::{ErrorClass, IndexerError, IndexerResult};
pub use indexer::{replay, CycleReport, Indexer, IngestReport};
pub use ingest_loop::{IngestLoop, LoopHandle, LoopStatus, LoopTiming};
pub use proof::ProofService;
pub use publisher::{PublishReport, Publisher, SubmitOutcome, SubmitResult};
pub use snapshot::{SnapshotCell, TreeSnapshot};

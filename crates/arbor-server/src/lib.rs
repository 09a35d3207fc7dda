//! HTTP query API for the arbor indexer.
//!
//! Read endpoints answer from the last completed tree snapshot and never
//! wait on ingestion I/O. The two submission endpoints are forwarded to the
//! ingestion loop.

pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use arbor_indexer::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use router::build_router;
pub use server::ArborServer;
pub use state::AppState;

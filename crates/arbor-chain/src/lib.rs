//! Settlement-chain adapters for the arbor indexer.
//!
//! The core only sees two narrow seams:
//!
//! - [`EventSource`]: decoded `(leaf_index, commitment, block)` events in
//!   block order
//! - [`RootSubmitter`]: publish one root as `submit_merkle_root(low, high)`
//!
//! [`StarknetEventSource`] and [`RelaySubmitter`] talk HTTP;
//! [`AccountSubmitter`] signs invokes with a local key;
//! [`MemoryEventSource`] and [`MemorySubmitter`] are in-process doubles.

pub mod account;
pub mod config;
pub mod error;
pub mod event;
pub mod memory;
pub mod source;
pub mod starknet;
pub mod submitter;

pub use account::{AccountSettings, AccountSubmitter, DEFAULT_CHAIN_ID};
pub use config::{AccountCredentials, ChainConfig, PublisherConfig, DEFAULT_EVENT_NAMES};
pub use error::{ChainError, ChainResult};
pub use event::{CommitmentEvent, EmittedEvent};
pub use memory::{MemoryEventSource, MemorySubmitter};
pub use source::EventSource;
pub use self::starknet::{selector, StarknetEventSource};
pub use submitter::{RelaySubmitter, RootSubmitter, SubmitCall, SubmitReceipt, SUBMIT_ENTRYPOINT};

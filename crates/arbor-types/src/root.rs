use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::field::FieldElement;
use crate::leaf::BlockNumber;

/// A distinct tree root and its publication state.
///
/// Recorded the first time a root value is computed; later computations of
/// the same value do not create a new record. The only mutation is the
/// one-way flip of `submitted` once the chain has accepted the root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootRecord {
    pub root: FieldElement,
    /// Chain head at the ingestion cycle that first produced this root.
    pub observed_at_block: BlockNumber,
    pub submitted: bool,
    pub recorded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl RootRecord {
    pub fn new(root: FieldElement, observed_at_block: BlockNumber) -> Self {
        Self {
            root,
            observed_at_block,
            submitted: false,
            recorded_at: Utc::now(),
            tx_hash: None,
            submitted_at: None,
        }
    }
}

/// Result of `record_if_new`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub recorded: bool,
}

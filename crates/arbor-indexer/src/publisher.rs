use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use arbor_chain::RootSubmitter;
use arbor_store::{RootReader, RootWriter};
use arbor_types::{FieldElement, U256Halves};

use crate::error::{ErrorClass, IndexerError, IndexerResult};

/// Result of a manual single-root submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted {
        root: FieldElement,
        tx_hash: Option<String>,
    },
    /// No submitter configured: calldata for out-of-band submission.
    Calldata {
        root: FieldElement,
        calldata: U256Halves,
    },
}

/// Per-root entry of a submit-all run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubmitResult {
    pub root: FieldElement,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What a FIFO publishing pass achieved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub submitted: Vec<FieldElement>,
    /// First root that failed; everything newer was left for the next pass.
    pub blocked_at: Option<FieldElement>,
}

/// Moves unsubmitted roots to the chain, oldest first.
///
/// Always checks `submitted` before sending so an accepted root is never
/// sent twice.
pub struct Publisher {
    roots: Arc<dyn RootReader>,
    root_writer: Arc<dyn RootWriter>,
    submitter: Option<Arc<dyn RootSubmitter>>,
}

impl Publisher {
    pub fn new(
        roots: Arc<dyn RootReader>,
        root_writer: Arc<dyn RootWriter>,
        submitter: Option<Arc<dyn RootSubmitter>>,
    ) -> Self {
        Self {
            roots,
            root_writer,
            submitter,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.submitter.is_some()
    }

    /// Submit pending roots in recording order, stopping at the first
    /// failure. A no-op without a submitter.
    ///
    /// Integrity failures of the root store are returned instead of being
    /// retried on the next pass.
    pub async fn publish_pending(&self) -> IndexerResult<PublishReport> {
        let mut report = PublishReport::default();
        let Some(submitter) = &self.submitter else {
            return Ok(report);
        };

        for record in self.roots.list_unsubmitted()? {
            match self.submit_with(submitter.as_ref(), &record.root).await {
                Ok(_) => report.submitted.push(record.root),
                Err(e) if e.class() == ErrorClass::Integrity => return Err(e),
                Err(e) => {
                    warn!(
                        root = %record.root,
                        error = %e,
                        "root submission failed; will retry next cycle"
                    );
                    report.blocked_at = Some(record.root);
                    break;
                }
            }
        }
        Ok(report)
    }

    /// Submit one root, defaulting to the newest unsubmitted.
    ///
    /// Without a submitter, returns the calldata instead.
    pub async fn submit_one(&self, root: Option<FieldElement>) -> IndexerResult<SubmitOutcome> {
        let root = match root {
            Some(root) => {
                let record = self
                    .roots
                    .get(&root)?
                    .ok_or_else(|| IndexerError::NotFound(format!("root {root} is not recorded")))?;
                if record.submitted {
                    return Err(IndexerError::AlreadySubmitted(root));
                }
                root
            }
            None => self
                .roots
                .list_unsubmitted()?
                .last()
                .map(|record| record.root)
                .ok_or(IndexerError::NothingPending)?,
        };

        match &self.submitter {
            None => Ok(SubmitOutcome::Calldata {
                root,
                calldata: root.to_u256_halves(),
            }),
            Some(submitter) => {
                let tx_hash = self.submit_with(submitter.as_ref(), &root).await?;
                Ok(SubmitOutcome::Submitted { root, tx_hash })
            }
        }
    }

    /// Try every pending root, oldest first, continuing past failures.
    pub async fn submit_all(&self) -> IndexerResult<Vec<SubmitResult>> {
        let submitter = self.submitter.as_ref().ok_or(IndexerError::PublishingDisabled)?;
        let mut results = Vec::new();
        for record in self.roots.list_unsubmitted()? {
            let result = match self.submit_with(submitter.as_ref(), &record.root).await {
                Ok(tx) => SubmitResult {
                    root: record.root,
                    success: true,
                    tx,
                    error: None,
                },
                Err(e) => SubmitResult {
                    root: record.root,
                    success: false,
                    tx: None,
                    error: Some(e.to_string()),
                },
            };
            results.push(result);
        }
        Ok(results)
    }

    async fn submit_with(
        &self,
        submitter: &dyn RootSubmitter,
        root: &FieldElement,
    ) -> IndexerResult<Option<String>> {
        if self.roots.get(root)?.is_some_and(|record| record.submitted) {
            return Err(IndexerError::AlreadySubmitted(*root));
        }
        let receipt = submitter
            .submit(root)
            .await
            .map_err(|source| IndexerError::Publish { root: *root, source })?;
        self.root_writer.mark_submitted(root, receipt.tx_hash.as_deref())?;
        info!(%root, tx = receipt.tx_hash.as_deref().unwrap_or("?"), "root marked submitted");
        Ok(receipt.tx_hash)
    }
}

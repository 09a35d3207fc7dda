use thiserror::Error;

use arbor_chain::ChainError;
use arbor_crypto::CryptoError;
use arbor_store::StoreError;
use arbor_tree::TreeError;
use arbor_types::FieldElement;

/// How an error should be handled by the loop and reported to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Retry after a fixed delay; callers see "unavailable".
    Transient,
    /// Halt ingestion for manual intervention. Never auto-repaired.
    Integrity,
    /// Expected miss, reported as 404.
    NotFound,
    /// A root submission failed; the root stays unsubmitted.
    Publish,
    /// The request cannot be honored as made.
    Invalid,
}

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("submitting root {root} failed: {source}")]
    Publish {
        root: FieldElement,
        #[source]
        source: ChainError,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("no pending roots to submit")]
    NothingPending,

    #[error("root {0} is already submitted")]
    AlreadySubmitted(FieldElement),

    #[error("no root submitter configured")]
    PublishingDisabled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("ingestion loop is not running")]
    LoopStopped,
}

impl IndexerError {
    pub fn class(&self) -> ErrorClass {
        match self {
            IndexerError::Store(StoreError::Io(_)) => ErrorClass::Transient,
            IndexerError::Store(_) => ErrorClass::Integrity,
            IndexerError::Tree(TreeError::LeafOutOfRange { .. }) => ErrorClass::NotFound,
            IndexerError::Tree(_) => ErrorClass::Integrity,
            IndexerError::Chain(ChainError::Decode(_)) => ErrorClass::Integrity,
            IndexerError::Chain(_) => ErrorClass::Transient,
            IndexerError::Crypto(_) => ErrorClass::Integrity,
            IndexerError::Publish { .. } => ErrorClass::Publish,
            IndexerError::NotFound(_) | IndexerError::NothingPending => ErrorClass::NotFound,
            IndexerError::AlreadySubmitted(_)
            | IndexerError::PublishingDisabled
            | IndexerError::Config(_) => ErrorClass::Invalid,
            IndexerError::LoopStopped => ErrorClass::Transient,
        }
    }
}

pub type IndexerResult<T> = Result<T, IndexerError>;

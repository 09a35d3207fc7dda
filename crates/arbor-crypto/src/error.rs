/// Errors from hashing operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("poseidon hasher failure: {0}")]
    Poseidon(String),

    #[error("tree height {height} outside supported range 1..={max}")]
    InvalidHeight { height: usize, max: usize },

    #[error("path has {actual} siblings, expected {expected}")]
    PathLength { expected: usize, actual: usize },
}

/// Result alias for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

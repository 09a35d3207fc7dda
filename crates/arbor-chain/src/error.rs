use thiserror::Error;

/// Errors from talking to the settlement chain, the signing relay or the
/// publisher account.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// An event payload that cannot be turned into a leaf. Never retried.
    #[error("malformed commitment event: {0}")]
    Decode(String),

    #[error("invalid header value: {0}")]
    InvalidHeader(String),

    /// The node refused or failed an invoke sent from the publisher account.
    #[error("account invoke failed: {0}")]
    Account(String),

    #[error("invalid chain settings: {0}")]
    Config(String),
}

impl ChainError {
    /// Whether the same request may succeed if repeated later.
    pub fn is_transient(&self) -> bool {
        match self {
            ChainError::Transport(_) | ChainError::Rpc { .. } | ChainError::Account(_) => true,
            ChainError::Api { status, .. } => *status == 429 || *status >= 500,
            ChainError::Decode(_) | ChainError::InvalidHeader(_) | ChainError::Config(_) => false,
        }
    }
}

pub type ChainResult<T> = std::result::Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(ChainError::Rpc { code: -32603, message: "busy".into() }.is_transient());
        assert!(ChainError::Api { status: 503, message: String::new() }.is_transient());
        assert!(ChainError::Api { status: 429, message: String::new() }.is_transient());
        assert!(!ChainError::Api { status: 400, message: String::new() }.is_transient());
        assert!(!ChainError::Decode("short keys".into()).is_transient());
        assert!(ChainError::Account("nonce too low".into()).is_transient());
        assert!(!ChainError::Config("bad key".into()).is_transient());
    }
}

use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid field element literal: {0:?}")]
    InvalidFieldElement(String),

    #[error("value {0} is not below the field modulus")]
    OutOfField(String),

    #[error("u256 half exceeds 128 bits: {0}")]
    HalfOverflow(String),
}

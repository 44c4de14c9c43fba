//! Chain access errors

use thiserror::Error;

/// Failure reading from the chain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("RPC transport error: {0}")]
    Transport(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),

    #[error("Invalid transaction hash: {0}")]
    InvalidHash(String),

    #[error("Value does not fit in {0}")]
    ValueOverflow(&'static str),

    #[error("Malformed event log: {0}")]
    MalformedLog(String),
}

impl From<reqwest::Error> for ChainError {
    fn from(e: reqwest::Error) -> Self {
        ChainError::Transport(e.to_string())
    }
}

/// Result type for chain operations
pub type ChainResult<T> = Result<T, ChainError>;

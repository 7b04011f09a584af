//! Semantic-tier error types.

use thiserror::Error;

/// Errors returned by semantic cache backends.
#[derive(Debug, Error)]
pub enum L2CacheError {
    /// The semantic store could not be reached.
    #[error("semantic store unavailable: {reason}")]
    StoreUnavailable {
        /// Error message.
        reason: String,
    },

    /// The semantic store rejected the request.
    #[error("semantic store rejected request: status {status}")]
    StoreRejected {
        /// HTTP-ish status code reported by the store.
        status: u16,
    },

    /// The store responded with something the backend cannot decode.
    #[error("malformed semantic store response: {reason}")]
    MalformedResponse {
        /// Error message.
        reason: String,
    },

    /// A vector of the wrong dimension was handed to the backend.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Configured dimension.
        expected: usize,
        /// Supplied dimension.
        actual: usize,
    },
}

impl From<reqwest::Error> for L2CacheError {
    fn from(e: reqwest::Error) -> Self {
        L2CacheError::StoreUnavailable {
            reason: e.to_string(),
        }
    }
}

impl From<sqlx::Error> for L2CacheError {
    fn from(e: sqlx::Error) -> Self {
        L2CacheError::StoreUnavailable {
            reason: e.to_string(),
        }
    }
}

/// Convenience result type for semantic-tier operations.
pub type L2CacheResult<T> = Result<T, L2CacheError>;

//! Exact-tier error types.

use thiserror::Error;

/// Errors surfaced by exact store backends.
#[derive(Debug, Error)]
pub enum ExactCacheError {
    /// Protocol or connection failure from the Redis/Valkey client.
    #[error("exact store error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A connect or per-command deadline elapsed.
    #[error("exact store timed out after {elapsed_ms} ms")]
    Timeout {
        /// Elapsed milliseconds before the deadline fired.
        elapsed_ms: u128,
    },

    /// The configured store URL could not be turned into a client.
    #[error("invalid exact store configuration: {reason}")]
    InvalidConfig {
        /// Error message.
        reason: String,
    },
}

/// Convenience result type for exact-tier operations.
pub type ExactCacheResult<T> = Result<T, ExactCacheError>;

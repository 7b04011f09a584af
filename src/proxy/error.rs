//! Upstream proxy error types.

use thiserror::Error;

/// Errors surfaced by the upstream client pool.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The upstream could not be reached or timed out.
    #[error("upstream transport failure: {reason}")]
    Transport {
        /// Error message.
        reason: String,
    },

    /// An HTTP client could not be constructed.
    #[error("failed to build upstream client: {reason}")]
    ClientBuild {
        /// Error message.
        reason: String,
    },
}

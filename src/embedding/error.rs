//! Embedding error types.

use thiserror::Error;

/// Errors surfaced by the query embedder.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The embedder is disabled; the semantic tier must be bypassed.
    #[error("embedder is disabled")]
    Disabled,

    /// The input text is empty after trimming.
    #[error("cannot embed empty text")]
    EmptyInput,

    /// The worker task running the projection was cancelled or panicked.
    #[error("embedding task failed: {reason}")]
    TaskFailed {
        /// Error message.
        reason: String,
    },
}

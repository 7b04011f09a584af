//! Provider-agnostic semantic store surface.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::error::L2CacheResult;
use super::types::SemanticContext;

/// A vector store holding `(context, embedding, response)` tuples.
///
/// Implementations must treat freshness (`expires_at > now`) as a hard
/// filter, not a post-filter, and must never return a neighbour that
/// fails the context filters — the facade only applies the similarity
/// threshold on top.
#[async_trait]
pub trait SemanticBackend: Send + Sync {
    /// Idempotently creates the index/schema when missing. Safe to call
    /// concurrently; implementations converge on a single
    /// initialization.
    async fn ensure_ready(&self) -> L2CacheResult<()>;

    /// Returns the stored response of the nearest neighbour matching
    /// `ctx` with cosine similarity at or above `threshold`, if any.
    async fn search(
        &self,
        vector: &[f32],
        ctx: &SemanticContext,
        threshold: f32,
    ) -> L2CacheResult<Option<Value>>;

    /// Appends a new entry expiring after `ttl`. Existing entries for
    /// the same context are left in place; duplicates are expected.
    async fn index_doc(
        &self,
        vector: &[f32],
        ctx: &SemanticContext,
        query_text: &str,
        response: &Value,
        ttl: Duration,
    ) -> L2CacheResult<()>;
}

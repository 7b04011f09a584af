//! In-memory semantic backend for tests and examples.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::backend::SemanticBackend;
use super::error::{L2CacheError, L2CacheResult};
use super::types::SemanticContext;
use crate::embedding::cosine_similarity;

struct StoredEntry {
    ctx: SemanticContext,
    vector: Vec<f32>,
    query_text: String,
    response: Value,
    expires_at: Instant,
}

/// Brute-force in-memory semantic store with full filter semantics.
#[derive(Default)]
pub struct MockSemanticBackend {
    entries: Mutex<Vec<StoredEntry>>,
    fail_reads: Mutex<bool>,
    fail_writes: Mutex<bool>,
}

impl MockSemanticBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent reads fail, for degradation tests.
    pub fn set_fail_reads(&self, fail: bool) {
        *self.fail_reads.lock() = fail;
    }

    /// Makes subsequent writes fail, for degradation tests.
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Stored query texts, in insertion order.
    pub fn query_texts(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .map(|e| e.query_text.clone())
            .collect()
    }

    fn matches(ctx: &SemanticContext, stored: &SemanticContext) -> bool {
        if stored.tenant_id != ctx.tenant_id
            || stored.endpoint != ctx.endpoint
            || stored.backend != ctx.backend
        {
            return false;
        }
        if let Some(llm_source) = &ctx.llm_source
            && stored.llm_source.as_ref().is_some_and(|s| s != llm_source)
        {
            return false;
        }
        if let Some(model) = &ctx.model
            && stored.model.as_ref().is_some_and(|m| m != model)
        {
            return false;
        }
        true
    }
}

#[async_trait]
impl SemanticBackend for MockSemanticBackend {
    async fn ensure_ready(&self) -> L2CacheResult<()> {
        Ok(())
    }

    async fn search(
        &self,
        vector: &[f32],
        ctx: &SemanticContext,
        threshold: f32,
    ) -> L2CacheResult<Option<Value>> {
        if *self.fail_reads.lock() {
            return Err(L2CacheError::StoreUnavailable {
                reason: "mock read failure".to_string(),
            });
        }

        let now = Instant::now();
        let entries = self.entries.lock();
        let best = entries
            .iter()
            .filter(|e| e.expires_at > now && Self::matches(ctx, &e.ctx))
            .map(|e| (cosine_similarity(vector, &e.vector), e))
            .max_by(|(a, _), (b, _)| a.total_cmp(b));

        Ok(best
            .filter(|(similarity, _)| *similarity >= threshold)
            .map(|(_, e)| e.response.clone()))
    }

    async fn index_doc(
        &self,
        vector: &[f32],
        ctx: &SemanticContext,
        query_text: &str,
        response: &Value,
        ttl: Duration,
    ) -> L2CacheResult<()> {
        if *self.fail_writes.lock() {
            return Err(L2CacheError::StoreUnavailable {
                reason: "mock write failure".to_string(),
            });
        }

        self.entries.lock().push(StoredEntry {
            ctx: ctx.clone(),
            vector: vector.to_vec(),
            query_text: query_text.to_string(),
            response: response.clone(),
            expires_at: Instant::now() + ttl,
        });
        Ok(())
    }
}

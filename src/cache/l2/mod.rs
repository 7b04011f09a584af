//! Semantic cache tier.
//!
//! Stores `(context, embedding, response)` tuples and retrieves the
//! nearest neighbour under hard context filters, thresholded on cosine
//! similarity. Polymorphic over two providers: an OpenSearch knn index
//! and Postgres/pgvector. Provider types never leak above
//! [`SemanticBackend`].

pub mod backend;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod opensearch;
pub mod pgvector;
pub mod types;


pub use backend::SemanticBackend;
pub use error::{L2CacheError, L2CacheResult};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockSemanticBackend;
pub use opensearch::OpenSearchBackend;
pub use pgvector::PgVectorBackend;
pub use types::SemanticContext;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::embedding::QueryEmbedder;
use crate::observability;

/// Best-effort facade over a [`SemanticBackend`] plus the query
/// embedder.
///
/// Disabled when configuration says so, when the embedder is off, or
/// when the provider name is unknown; in all of those states reads
/// return misses and writes are dropped without error.
pub struct L2SemanticCache {
    embedder: QueryEmbedder,
    backend: Option<Arc<dyn SemanticBackend>>,
    threshold: f32,
    ttl: Duration,
}

impl L2SemanticCache {
    /// Wraps an embedder and an optional backend.
    pub fn new(
        embedder: QueryEmbedder,
        backend: Option<Arc<dyn SemanticBackend>>,
        threshold: f32,
        ttl: Duration,
    ) -> Self {
        Self {
            embedder,
            backend,
            threshold,
            ttl,
        }
    }

    /// Builds the semantic tier from configuration.
    pub fn from_config(config: &Config) -> Self {
        let embedder = QueryEmbedder::from_config(&config.semcache_embedder, config.semcache_dim);

        if !config.semcache_enable {
            info!("semantic cache disabled by configuration");
            return Self::new(embedder, None, config.semcache_threshold, config.semcache_ttl);
        }
        if !embedder.enabled() {
            warn!("semantic cache disabled: embedder unavailable");
            return Self::new(embedder, None, config.semcache_threshold, config.semcache_ttl);
        }

        let backend: Option<Arc<dyn SemanticBackend>> =
            match config.semcache_provider.trim().to_ascii_lowercase().as_str() {
                "opensearch" => match OpenSearchBackend::new(
                    &config.semcache_os_url,
                    &config.semcache_os_index,
                    &config.semcache_os_user,
                    &config.semcache_os_pass,
                    embedder.dim(),
                    config.semcache_client_timeout,
                ) {
                    Ok(backend) => Some(Arc::new(backend)),
                    Err(e) => {
                        warn!(error = %e, "semantic cache provider init failed");
                        None
                    }
                },
                "pgvector" => match PgVectorBackend::connect_lazy(
                    &config.semcache_pg_dsn,
                    &config.semcache_pg_table,
                    embedder.dim(),
                    config.semcache_client_timeout,
                ) {
                    Ok(backend) => Some(Arc::new(backend)),
                    Err(e) => {
                        warn!(error = %e, "semantic cache provider init failed");
                        None
                    }
                },
                other => {
                    warn!(provider = %other, "unknown semantic cache provider, disabling");
                    None
                }
            };

        if backend.is_some() {
            info!(
                provider = %config.semcache_provider,
                threshold = config.semcache_threshold,
                ttl_secs = config.semcache_ttl.as_secs(),
                dim = embedder.dim(),
                "semantic cache ready"
            );
        }
        Self::new(embedder, backend, config.semcache_threshold, config.semcache_ttl)
    }

    /// Whether lookups can ever hit.
    pub fn enabled(&self) -> bool {
        self.backend.is_some() && self.embedder.enabled()
    }

    /// Configured similarity threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Idempotently prepares the provider's schema. Failures are logged;
    /// the first request converges on initialization instead.
    pub async fn ensure_ready(&self) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        if let Err(e) = backend.ensure_ready().await {
            warn!(error = %e, "semantic cache ensure_ready failed, deferring to first use");
        }
    }

    /// Embeds `text` and returns the stored response of the closest
    /// fresh neighbour at or above the threshold. Any embedder or store
    /// failure reads as a miss.
    pub async fn try_get(&self, text: Option<&str>, ctx: &SemanticContext) -> Option<Value> {
        let backend = self.backend.as_ref()?;
        let text = text?.trim();
        if text.is_empty() {
            return None;
        }

        let vector = match self.embedder.embed(text).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!(error = %e, "embedding failed, bypassing semantic cache");
                return None;
            }
        };

        match backend.search(&vector, ctx, self.threshold).await {
            Ok(Some(hit)) => {
                info!(
                    endpoint = %ctx.endpoint,
                    backend = %ctx.backend,
                    tenant = %ctx.tenant_id,
                    "semantic cache hit"
                );
                observability::record_cache_lookup("semantic", "hit");
                Some(hit)
            }
            Ok(None) => {
                debug!(endpoint = %ctx.endpoint, "semantic cache miss");
                observability::record_cache_lookup("semantic", "miss");
                None
            }
            Err(e) => {
                warn!(error = %e, "semantic cache read failed, treating as miss");
                observability::record_cache_lookup("semantic", "error");
                None
            }
        }
    }

    /// Embeds `text` and appends a new entry for it. Failures are logged
    /// and dropped.
    pub async fn put(&self, text: Option<&str>, ctx: &SemanticContext, response: &Value) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
            return;
        };

        let vector = match self.embedder.embed(text).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!(error = %e, "embedding failed, dropping semantic write");
                return;
            }
        };

        match backend.index_doc(&vector, ctx, text, response, self.ttl).await {
            Ok(()) => {
                info!(
                    endpoint = %ctx.endpoint,
                    backend = %ctx.backend,
                    tenant = %ctx.tenant_id,
                    ttl_secs = self.ttl.as_secs(),
                    "semantic cache stored"
                );
                observability::record_cache_store("semantic", "success");
            }
            Err(e) => {
                warn!(error = %e, "semantic cache write failed, dropping");
                observability::record_cache_store("semantic", "error");
            }
        }
    }
}

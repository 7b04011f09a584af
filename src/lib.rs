//! # Synapse Router
//!
//! Multi-tenant HTTP edge router with a two-tier response cache.
//!
//! Synapse sits between clients and a fleet of search/chat upstream
//! services. Every request is fingerprinted, checked against an exact
//! (Valkey/Redis) cache, then against a semantic (embedding-similarity)
//! cache, and only proxied upstream on a double miss.
//!
//! ```text
//! Request → Tenant → L1 (exact) → L2 (semantic) → Upstream → double-write
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use synapse::Config;
//!
//! # fn run() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! println!("Listening on {}", config.socket_addr());
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! | Feature | Purpose |
//! |---------|---------|
//! | `mock` | In-memory store backends for tests/examples |
//!
//! ## Modules
//!
//! - [`cache`] - Tiered cache (L1 exact + L2 semantic)
//! - [`config`] - Environment-backed configuration
//! - [`embedding`] - Query embedder for the semantic tier
//! - [`gateway`] - Axum HTTP surface and dispatch pipeline
//! - [`hashing`] - Canonical request fingerprinting
//! - [`proxy`] - Pooled upstream HTTP clients
//! - [`tenant`] - Tenant registry and backend/LLM selection

#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod embedding;
pub mod gateway;
pub mod hashing;
pub mod observability;
pub mod proxy;
pub mod tenant;

pub use cache::l1::{ExactStore, L1ExactCache};
#[cfg(any(test, feature = "mock"))]
pub use cache::l1::{FailingExactStore, MemoryExactStore};
pub use cache::l2::{L2CacheError, L2CacheResult, L2SemanticCache, SemanticBackend, SemanticContext};
#[cfg(any(test, feature = "mock"))]
pub use cache::l2::MockSemanticBackend;
pub use config::{Config, ConfigError};
pub use embedding::{EmbeddingError, QueryEmbedder, cosine_similarity};
pub use gateway::{AppState, GatewayError, TENANT_HEADER, create_router_with_state};
pub use hashing::{cache_key, canonical_json, normalize_query};
pub use proxy::{BasicAuth, UpstreamPool};
pub use tenant::{Backend, LlmSource, TenantDescriptor, TenantError, TenantRegistry};

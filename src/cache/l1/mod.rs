//! Exact cache tier.
//!
//! Keys are canonical request fingerprints, values are the opaque JSON
//! bytes of the upstream response. The facade is strictly best-effort:
//! a failing store degrades reads to misses and drops writes, and the
//! dispatch pipeline never learns the difference beyond a WARN line and
//! a counter.

pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod store;

#[cfg(test)]
mod tests;

pub use error::{ExactCacheError, ExactCacheResult};
#[cfg(any(test, feature = "mock"))]
pub use mock::{FailingExactStore, MemoryExactStore};
pub use store::{ExactStore, RedisExactStore};

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::observability;

/// Best-effort facade over an [`ExactStore`].
pub struct L1ExactCache {
    store: Option<Arc<dyn ExactStore>>,
    ttl: Duration,
}

impl L1ExactCache {
    /// Wraps a store; `None` yields a disabled cache that always misses.
    pub fn new(store: Option<Arc<dyn ExactStore>>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Builds the exact tier from configuration.
    ///
    /// A misconfigured store URL is logged and the tier runs disabled;
    /// request handling must not depend on the cache being reachable.
    pub fn from_config(config: &Config) -> Self {
        if !config.cache_enable {
            info!("exact cache disabled by configuration");
            return Self::new(None, config.cache_ttl);
        }

        match RedisExactStore::connect(
            &config.cache_url,
            config.cache_cluster_enable,
            config.cache_tls_verify,
            config.cache_connect_timeout,
            config.cache_socket_timeout,
        ) {
            Ok(store) => {
                info!(
                    url = %config.cache_url,
                    cluster = config.cache_cluster_enable,
                    ttl_secs = config.cache_ttl.as_secs(),
                    "exact cache ready"
                );
                Self::new(Some(Arc::new(store)), config.cache_ttl)
            }
            Err(e) => {
                warn!(error = %e, "exact cache unavailable, running without it");
                Self::new(None, config.cache_ttl)
            }
        }
    }

    /// Whether a store is attached.
    pub fn enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Looks up `key`, returning the cached JSON document on a hit.
    ///
    /// Store errors and undecodable payloads are logged and read as a
    /// miss.
    pub async fn lookup(&self, key: &str) -> Option<Value> {
        let store = self.store.as_ref()?;
        match store.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    info!(key = %key, "exact cache hit");
                    observability::record_cache_lookup("exact", "hit");
                    Some(value)
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "exact cache entry undecodable, treating as miss");
                    observability::record_cache_lookup("exact", "error");
                    None
                }
            },
            Ok(None) => {
                debug!(key = %key, "exact cache miss");
                observability::record_cache_lookup("exact", "miss");
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "exact cache read failed, treating as miss");
                observability::record_cache_lookup("exact", "error");
                None
            }
        }
    }

    /// Stores `value` under `key` with the configured TTL. Failures are
    /// logged and dropped.
    pub async fn store(&self, key: &str, value: &Value) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key = %key, error = %e, "exact cache value unserializable, dropping write");
                return;
            }
        };
        match store.set(key, &bytes, self.ttl).await {
            Ok(()) => {
                debug!(key = %key, ttl_secs = self.ttl.as_secs(), "exact cache stored");
                observability::record_cache_store("exact", "success");
            }
            Err(e) => {
                warn!(key = %key, error = %e, "exact cache write failed, dropping");
                observability::record_cache_store("exact", "error");
            }
        }
    }
}

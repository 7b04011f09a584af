use std::sync::Arc;

use crate::cache::l1::L1ExactCache;
use crate::cache::l2::L2SemanticCache;
use crate::config::Config;
use crate::proxy::UpstreamPool;
use crate::tenant::TenantRegistry;

/// Shared per-process router state.
///
/// Every field is a process-wide singleton; handlers borrow read-only
/// views and the caches provide their own interior concurrency.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tenants: Arc<TenantRegistry>,
    pub exact: Arc<L1ExactCache>,
    pub semantic: Arc<L2SemanticCache>,
    pub upstreams: Arc<UpstreamPool>,
}

impl AppState {
    /// Assembles state from pre-built components.
    pub fn new(
        config: Arc<Config>,
        tenants: Arc<TenantRegistry>,
        exact: Arc<L1ExactCache>,
        semantic: Arc<L2SemanticCache>,
        upstreams: Arc<UpstreamPool>,
    ) -> Self {
        Self {
            config,
            tenants,
            exact,
            semantic,
            upstreams,
        }
    }

    /// Builds all components from configuration.
    pub fn from_config(config: Config, tenants: TenantRegistry) -> Self {
        let exact = L1ExactCache::from_config(&config);
        let semantic = L2SemanticCache::from_config(&config);
        let upstreams = UpstreamPool::new(config.upstream_timeout);
        Self {
            config: Arc::new(config),
            tenants: Arc::new(tenants),
            exact: Arc::new(exact),
            semantic: Arc::new(semantic),
            upstreams: Arc::new(upstreams),
        }
    }
}

//! Prometheus metrics for the router.
//!
//! The recorder is installed once at startup when metrics are enabled;
//! the counter helpers below are no-ops until then, so library code can
//! record unconditionally.

use std::sync::OnceLock;

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Errors from metrics-recorder installation.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// The global recorder could not be installed.
    #[error("failed to install metrics recorder: {0}")]
    Install(#[from] metrics_exporter_prometheus::BuildError),

    /// A recorder was already installed for this process.
    #[error("metrics recorder already initialized")]
    AlreadyInitialized,
}

/// Installs the Prometheus recorder and retains its render handle.
pub fn init_metrics() -> Result<(), MetricsError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)?;
    Ok(())
}

/// Returns the render handle for the `/metrics` route, if installed.
pub fn prometheus_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

/// Records a cache lookup outcome for a tier (`exact`/`semantic`).
pub fn record_cache_lookup(tier: &'static str, result: &'static str) {
    counter!("router_cache_lookups_total", "tier" => tier, "result" => result).increment(1);
}

/// Records a cache store outcome for a tier.
pub fn record_cache_store(tier: &'static str, result: &'static str) {
    counter!("router_cache_stores_total", "tier" => tier, "result" => result).increment(1);
}

/// Records an upstream call outcome per backend.
pub fn record_upstream(backend: &'static str, result: &'static str) {
    counter!("router_upstream_requests_total", "backend" => backend, "result" => result)
        .increment(1);
}

//! Tenant registry error types.

use thiserror::Error;

/// Errors surfaced by the tenant registry.
#[derive(Debug, Error)]
pub enum TenantError {
    /// The tenants file could not be read.
    #[error("failed to read tenants file '{path}': {source}")]
    Io {
        /// Configured file path.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The tenants file is not valid YAML.
    #[error("failed to parse tenants file '{path}': {source}")]
    Parse {
        /// Configured file path.
        path: String,
        /// Underlying YAML failure.
        #[source]
        source: serde_yaml::Error,
    },

    /// The tenant has no upstream URL configured for the backend.
    #[error("upstream not configured for backend '{backend}'")]
    BackendUnavailable {
        /// The backend that lacks an upstream URL.
        backend: &'static str,
    },
}

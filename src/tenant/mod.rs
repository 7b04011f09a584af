//! Tenant registry.
//!
//! Tenants are declared in a YAML file mapping tenant ids to upstream
//! base URLs, default backend/LLM selections, and optional upstream
//! credentials. The registry is loaded once at startup; `reload` swaps
//! the whole snapshot atomically so in-flight requests never observe a
//! partially-parsed registry.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::TenantError;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Deserialize;

/// Upstream search backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Backend {
    /// Postgres-backed search upstream.
    Postgres,
    /// Oracle-backed search upstream.
    Oracle,
    /// OpenSearch-backed search upstream.
    Opensearch,
}

impl Backend {
    /// Canonical lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Postgres => "postgres",
            Backend::Oracle => "oracle",
            Backend::Opensearch => "opensearch",
        }
    }

    /// Parses a backend label, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "postgres" => Some(Backend::Postgres),
            "oracle" => Some(Backend::Oracle),
            "opensearch" => Some(Backend::Opensearch),
            _ => None,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstream LLM provider selector for chat/RAG endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmSource {
    /// Local Ollama provider.
    Ollama,
    /// OCI Generative AI provider.
    OciGenai,
    /// AWS Bedrock provider.
    Bedrock,
}

impl LlmSource {
    /// Canonical lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmSource::Ollama => "ollama",
            LlmSource::OciGenai => "oci_genai",
            LlmSource::Bedrock => "bedrock",
        }
    }

    /// Parses an LLM source label, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "ollama" => Some(LlmSource::Ollama),
            "oci_genai" => Some(LlmSource::OciGenai),
            "bedrock" => Some(LlmSource::Bedrock),
            _ => None,
        }
    }
}

impl fmt::Display for LlmSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstream basic-auth credentials from the tenants file.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamAuth {
    /// Username.
    pub user: String,
    /// Password.
    pub pass: String,
}

/// Raw YAML shape of a tenant block.
#[derive(Debug, Default, Deserialize)]
struct RawTenant {
    default_backend: Option<String>,
    default_llm: Option<String>,
    #[serde(default)]
    upstreams: RawUpstreams,
    auth: Option<UpstreamAuth>,
}

#[derive(Debug, Default, Deserialize)]
struct RawUpstreams {
    postgres_api: Option<String>,
    oracle_api: Option<String>,
    opensearch_api: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDocument {
    #[serde(default)]
    tenants: BTreeMap<String, RawTenant>,
    default: Option<RawTenant>,
}

/// Resolved, immutable tenant configuration.
#[derive(Debug, Clone)]
pub struct TenantDescriptor {
    /// Backend used when a request carries no override.
    pub default_backend: Backend,
    /// LLM source used when a chat request carries no override.
    pub default_llm: LlmSource,
    /// Upstream base URLs per backend. Missing entries mean the backend
    /// is unavailable for this tenant.
    pub upstreams: BTreeMap<Backend, String>,
    /// Credentials applied to upstream calls unless overridden
    /// per-request.
    pub auth: Option<UpstreamAuth>,
}

impl TenantDescriptor {
    fn from_raw(raw: RawTenant) -> Self {
        let default_backend = raw
            .default_backend
            .as_deref()
            .and_then(Backend::parse)
            .unwrap_or(Backend::Opensearch);
        let default_llm = raw
            .default_llm
            .as_deref()
            .and_then(LlmSource::parse)
            .unwrap_or(LlmSource::Ollama);

        let mut upstreams = BTreeMap::new();
        if let Some(url) = raw.upstreams.postgres_api {
            upstreams.insert(Backend::Postgres, url);
        }
        if let Some(url) = raw.upstreams.oracle_api {
            upstreams.insert(Backend::Oracle, url);
        }
        if let Some(url) = raw.upstreams.opensearch_api {
            upstreams.insert(Backend::Opensearch, url);
        }

        Self {
            default_backend,
            default_llm,
            upstreams,
            auth: raw.auth,
        }
    }

    /// Returns the upstream base URL for `backend`, or
    /// `BackendUnavailable` when the tenant has none configured.
    pub fn upstream_for(&self, backend: Backend) -> Result<&str, TenantError> {
        self.upstreams
            .get(&backend)
            .map(String::as_str)
            .ok_or(TenantError::BackendUnavailable {
                backend: backend.as_str(),
            })
    }
}

type TenantMap = BTreeMap<String, Arc<TenantDescriptor>>;

/// In-memory view over the tenants file, reloadable at runtime.
pub struct TenantRegistry {
    path: String,
    tenants: ArcSwap<TenantMap>,
}

impl TenantRegistry {
    /// Loads the registry from `path`.
    pub fn load(path: &str) -> Result<Self, TenantError> {
        let tenants = Self::parse_file(path)?;
        Ok(Self {
            path: path.to_string(),
            tenants: ArcSwap::from_pointee(tenants),
        })
    }

    /// Builds a registry directly from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self, TenantError> {
        let tenants = Self::parse_yaml("<inline>", yaml)?;
        Ok(Self {
            path: "<inline>".to_string(),
            tenants: ArcSwap::from_pointee(tenants),
        })
    }

    /// Re-reads the tenants file and swaps the snapshot atomically.
    /// Readers holding the previous snapshot are unaffected.
    pub fn reload(&self) -> Result<(), TenantError> {
        let tenants = Self::parse_file(&self.path)?;
        self.tenants.store(Arc::new(tenants));
        Ok(())
    }

    /// Looks up a tenant by id.
    pub fn get(&self, tenant_id: &str) -> Option<Arc<TenantDescriptor>> {
        self.tenants.load().get(tenant_id).cloned()
    }

    /// Resolves the descriptor used when tenancy is disabled: the
    /// `default` block, or failing that the sole registered tenant.
    pub fn default_descriptor(&self) -> Option<(String, Arc<TenantDescriptor>)> {
        let snapshot = self.tenants.load();
        if let Some(descriptor) = snapshot.get("default") {
            return Some(("default".to_string(), descriptor.clone()));
        }
        snapshot
            .iter()
            .next()
            .map(|(id, descriptor)| (id.clone(), descriptor.clone()))
    }

    /// Number of registered tenants (including the `default` block).
    pub fn len(&self) -> usize {
        self.tenants.load().len()
    }

    /// Whether the registry holds no tenants at all.
    pub fn is_empty(&self) -> bool {
        self.tenants.load().is_empty()
    }

    fn parse_file(path: &str) -> Result<TenantMap, TenantError> {
        let raw = std::fs::read_to_string(path).map_err(|source| TenantError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::parse_yaml(path, &raw)
    }

    fn parse_yaml(path: &str, yaml: &str) -> Result<TenantMap, TenantError> {
        let document: RawDocument =
            serde_yaml::from_str(yaml).map_err(|source| TenantError::Parse {
                path: path.to_string(),
                source,
            })?;

        let mut tenants: TenantMap = document
            .tenants
            .into_iter()
            .map(|(id, raw)| (id, Arc::new(TenantDescriptor::from_raw(raw))))
            .collect();
        if let Some(raw) = document.default {
            tenants.insert("default".to_string(), Arc::new(TenantDescriptor::from_raw(raw)));
        }
        Ok(tenants)
    }
}

//! The per-request dispatch pipeline.
//!
//! Ordered steps, each with an explicit failure mode:
//! tenant → backend → exact lookup → semantic lookup → upstream →
//! double-write. The cardinal rule: caches never fail the request —
//! only validation and upstream failures reach the caller.

use axum::Json;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::l2::SemanticContext;
use crate::gateway::error::GatewayError;
use crate::gateway::payload::RequestPlan;
use crate::gateway::state::AppState;
use crate::hashing;
use crate::observability;
use crate::tenant::{Backend, LlmSource, TenantDescriptor};

/// Header carrying the tenant id.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Resolves the calling tenant from the `X-Tenant-Id` header.
///
/// With tenancy disabled the header is ignored and the registry's
/// default descriptor is used; with tenancy enabled a missing or
/// unknown id is a 401.
pub fn resolve_tenant(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(String, Arc<TenantDescriptor>), GatewayError> {
    if !state.config.tenancy_enable {
        return state
            .tenants
            .default_descriptor()
            .ok_or(GatewayError::TenantUnknown {
                id: "default".to_string(),
            });
    }

    let tenant_id = headers
        .get(TENANT_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(GatewayError::TenantMissing)?;

    let descriptor = state
        .tenants
        .get(tenant_id)
        .ok_or_else(|| GatewayError::TenantUnknown {
            id: tenant_id.to_string(),
        })?;
    Ok((tenant_id.to_string(), descriptor))
}

/// Picks the backend: request override or tenant default, validated.
pub fn resolve_backend(
    tenant: &TenantDescriptor,
    override_value: Option<&str>,
) -> Result<Backend, GatewayError> {
    match override_value {
        Some(value) => Backend::parse(value).ok_or_else(|| GatewayError::InvalidBackend {
            value: value.to_string(),
        }),
        None => Ok(tenant.default_backend),
    }
}

/// Picks the LLM source: request override or tenant default, validated.
pub fn resolve_llm(
    tenant: &TenantDescriptor,
    override_value: Option<&str>,
) -> Result<LlmSource, GatewayError> {
    match override_value {
        Some(value) => LlmSource::parse(value).ok_or_else(|| GatewayError::InvalidLlmSource {
            value: value.to_string(),
        }),
        None => Ok(tenant.default_llm),
    }
}

/// Validates an LLM source label without substituting a default; used
/// where the value is forwarded verbatim.
pub fn validate_llm(override_value: Option<&str>) -> Result<(), GatewayError> {
    if let Some(value) = override_value
        && LlmSource::parse(value).is_none()
    {
        return Err(GatewayError::InvalidLlmSource {
            value: value.to_string(),
        });
    }
    Ok(())
}

fn upstream_path(endpoint: &'static str) -> &'static str {
    endpoint.strip_prefix("/v1").unwrap_or(endpoint)
}

/// Runs the cache/proxy pipeline for a composed request.
pub async fn dispatch(
    state: &AppState,
    tenant_id: String,
    tenant: &TenantDescriptor,
    backend: Backend,
    plan: RequestPlan,
) -> Result<Response, GatewayError> {
    let base_url = tenant.upstream_for(backend).map_err(|_| {
        GatewayError::BackendUnavailable {
            backend: backend.as_str(),
        }
    })?;

    let auth = plan.auth_override.clone().or_else(|| {
        tenant.auth.as_ref().map(|auth| crate::proxy::BasicAuth {
            user: auth.user.clone(),
            pass: auth.pass.clone(),
        })
    });

    let key = hashing::cache_key(plan.endpoint, backend.as_str(), &plan.fingerprint);

    if let Some(hit) = state.exact.lookup(&key).await {
        return Ok(Json(hit).into_response());
    }

    let ctx = SemanticContext {
        tenant_id,
        endpoint: plan.endpoint.to_string(),
        backend: backend.as_str().to_string(),
        llm_source: plan.llm_source.clone(),
        model: plan.model.clone(),
    };
    // A semantic hit is returned as-is; the exact tier is not
    // back-filled from it.
    if let Some(hit) = state.semantic.try_get(plan.query_text.as_deref(), &ctx).await {
        return Ok(Json(hit).into_response());
    }

    let body = Value::Object(plan.forward);
    let reply = state
        .upstreams
        .post(base_url, upstream_path(plan.endpoint), &body, auth.as_ref())
        .await
        .map_err(|e| {
            warn!(backend = %backend, error = %e, "upstream transport failure");
            observability::record_upstream(backend.as_str(), "transport_error");
            GatewayError::UpstreamUnavailable { backend }
        })?;

    if reply.status.is_server_error() {
        warn!(backend = %backend, status = reply.status.as_u16(), "upstream server error");
        observability::record_upstream(backend.as_str(), "server_error");
        return Err(GatewayError::UpstreamUnavailable { backend });
    }
    if reply.status.is_client_error() {
        debug!(backend = %backend, status = reply.status.as_u16(), "upstream client error passed through");
        observability::record_upstream(backend.as_str(), "client_error");
        return Err(GatewayError::UpstreamClientError {
            status: reply.status,
            body: reply.body,
        });
    }

    observability::record_upstream(backend.as_str(), "success");
    let out: Value = serde_json::from_slice(&reply.body).map_err(|e| {
        warn!(backend = %backend, error = %e, "upstream returned unparseable JSON");
        GatewayError::UpstreamUnavailable { backend }
    })?;

    // Both writes are best-effort but complete before the response is
    // sent, so the immediately-following identical request sees the
    // exact hit.
    tokio::join!(
        state.semantic.put(plan.query_text.as_deref(), &ctx, &out),
        state.exact.store(&key, &out),
    );

    Ok(Json(out).into_response())
}

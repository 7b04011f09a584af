//! HTTP gateway layer.
//!
//! Declares the router's endpoints, decodes typed request models, and
//! hands composed plans to the dispatch pipeline. Pure glue over the
//! rest of the crate.

#![allow(missing_docs)]

pub mod dispatch;
pub mod error;
pub mod handler;
pub mod payload;
pub mod state;

#[cfg(test)]
mod handler_tests;

use axum::{
    Json, Router,
    http::{HeaderName, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use dispatch::{TENANT_HEADER, dispatch, resolve_backend, resolve_llm, resolve_tenant};
pub use error::GatewayError;
pub use payload::{
    ChatRequest, FtsSearchRequest, HybridSearchRequest, RagRequest, RequestPlan,
    VectorSearchRequest,
};
pub use state::AppState;

use crate::observability;

/// Assembles the router: endpoints, trace layer, and (per config) the
/// CORS layer and metrics route.
pub fn create_router_with_state(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/search/vector", post(handler::vector_search_handler))
        .route("/v1/search/hybrid", post(handler::hybrid_search_handler))
        .route("/v1/search/fts", post(handler::fts_search_handler))
        .route("/v1/search/rag", post(handler::rag_handler))
        .route(
            "/v1/chat/conversation",
            post(handler::chat_conversation_handler),
        )
        .route("/v1/chat/agentic", post(handler::chat_agentic_handler));

    if state.config.metrics_enable {
        router = router.route("/metrics", get(metrics_handler));
    }

    let mut router = router.layer(TraceLayer::new_for_http());
    if state.config.cors_enable {
        router = router.layer(cors_layer(&state.config.cors_allow_origins));
    }

    router.with_state(state)
}

/// Builds the CORS layer. A wildcard origin list uses `Any`, which the
/// CORS spec forbids combining with credentials; explicit origins get
/// credentials plus a concrete header allowlist.
fn cors_layer(allow_origins: &str) -> CorsLayer {
    let origins = allow_origins.trim();
    if origins.is_empty() || origins == "*" {
        return CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any)
            .allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(TENANT_HEADER),
        ])
        .allow_origin(AllowOrigin::list(parsed))
        .allow_credentials(true)
}

async fn health_handler() -> Response {
    Json(json!({"ok": true})).into_response()
}

async fn metrics_handler() -> Response {
    match observability::prometheus_handle() {
        Some(handle) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        )
            .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [("content-type", "text/plain")],
            "metrics recorder not initialized".to_string(),
        )
            .into_response(),
    }
}

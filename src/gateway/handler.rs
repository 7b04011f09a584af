//! Endpoint handlers: thin glue decoding typed payloads and handing a
//! composed plan to the dispatch pipeline.

use axum::{Json, extract::State, http::HeaderMap, response::Response};
use tracing::instrument;

use crate::gateway::dispatch::{
    dispatch, resolve_backend, resolve_llm, resolve_tenant, validate_llm,
};
use crate::gateway::error::GatewayError;
use crate::gateway::payload::{
    CHAT_AGENTIC_ENDPOINT, CHAT_CONVERSATION_ENDPOINT, ChatRequest, FtsSearchRequest,
    HybridSearchRequest, RagRequest, VectorSearchRequest,
};
use crate::gateway::state::AppState;

#[instrument(skip(state, headers, request))]
pub async fn vector_search_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<VectorSearchRequest>,
) -> Result<Response, GatewayError> {
    let (tenant_id, tenant) = resolve_tenant(&state, &headers)?;
    let backend = resolve_backend(&tenant, request.backend.as_deref())?;
    let plan = request.plan(state.config.cache_normalize_query);
    dispatch(&state, tenant_id, &tenant, backend, plan).await
}

#[instrument(skip(state, headers, request))]
pub async fn hybrid_search_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<HybridSearchRequest>,
) -> Result<Response, GatewayError> {
    let (tenant_id, tenant) = resolve_tenant(&state, &headers)?;
    let backend = resolve_backend(&tenant, request.backend.as_deref())?;
    let plan = request.plan(state.config.cache_normalize_query);
    dispatch(&state, tenant_id, &tenant, backend, plan).await
}

#[instrument(skip(state, headers, request))]
pub async fn fts_search_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<FtsSearchRequest>,
) -> Result<Response, GatewayError> {
    let (tenant_id, tenant) = resolve_tenant(&state, &headers)?;
    let backend = resolve_backend(&tenant, request.backend.as_deref())?;
    let plan = request.plan(state.config.cache_normalize_query);
    dispatch(&state, tenant_id, &tenant, backend, plan).await
}

#[instrument(skip(state, headers, request))]
pub async fn rag_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RagRequest>,
) -> Result<Response, GatewayError> {
    let (tenant_id, tenant) = resolve_tenant(&state, &headers)?;
    let backend = resolve_backend(&tenant, request.backend.as_deref())?;
    // RAG forwards llm_source as provided; validate without defaulting.
    validate_llm(request.llm_source.as_deref())?;
    let plan = request.plan(state.config.cache_normalize_query);
    dispatch(&state, tenant_id, &tenant, backend, plan).await
}

#[instrument(skip(state, headers, request))]
pub async fn chat_conversation_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Response, GatewayError> {
    chat_handler(state, headers, request, CHAT_CONVERSATION_ENDPOINT).await
}

#[instrument(skip(state, headers, request))]
pub async fn chat_agentic_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Response, GatewayError> {
    chat_handler(state, headers, request, CHAT_AGENTIC_ENDPOINT).await
}

async fn chat_handler(
    state: AppState,
    headers: HeaderMap,
    request: ChatRequest,
    endpoint: &'static str,
) -> Result<Response, GatewayError> {
    let (tenant_id, tenant) = resolve_tenant(&state, &headers)?;
    let backend = resolve_backend(&tenant, request.backend.as_deref())?;
    let llm = resolve_llm(&tenant, request.llm_source.as_deref())?;
    let plan = request.plan(endpoint, llm, state.config.cache_normalize_query);
    dispatch(&state, tenant_id, &tenant, backend, plan).await
}

//! Semantic-tier context types.

/// Hard filters identifying the slice of the semantic store a request
/// may read from and write to.
///
/// `tenant_id`, `endpoint`, and `backend` always filter exactly.
/// `llm_source` and `model` narrow the match when present; stored
/// entries with a null value match any query context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticContext {
    /// Owning tenant id.
    pub tenant_id: String,
    /// Endpoint label, e.g. `/v1/search/vector`.
    pub endpoint: String,
    /// Backend label, e.g. `opensearch`.
    pub backend: String,
    /// LLM source for chat/RAG requests.
    pub llm_source: Option<String>,
    /// Model name for chat/RAG requests.
    pub model: Option<String>,
}

impl SemanticContext {
    /// Context for a search endpoint (no LLM dimensions).
    pub fn for_search(tenant_id: &str, endpoint: &str, backend: &str) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            endpoint: endpoint.to_string(),
            backend: backend.to_string(),
            llm_source: None,
            model: None,
        }
    }
}

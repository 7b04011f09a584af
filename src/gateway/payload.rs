//! Typed request models and their fingerprint subsets.
//!
//! Each endpoint owns a struct-of-optionals model so the subset of
//! fields feeding the exact-cache fingerprint is explicit per endpoint
//! rather than hidden behind a generic dictionary. The reserved
//! `_upstream_user`/`_upstream_pass` keys are typed here too: they are
//! stripped from the forwarded body, excluded from the fingerprint, and
//! promoted to a basic-auth override.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::hashing::normalize_query;
use crate::proxy::BasicAuth;
use crate::tenant::LlmSource;

/// Vector search endpoint label.
pub const VECTOR_ENDPOINT: &str = "/v1/search/vector";
/// Hybrid search endpoint label.
pub const HYBRID_ENDPOINT: &str = "/v1/search/hybrid";
/// Full-text search endpoint label.
pub const FTS_ENDPOINT: &str = "/v1/search/fts";
/// RAG endpoint label.
pub const RAG_ENDPOINT: &str = "/v1/search/rag";
/// Conversational chat endpoint label.
pub const CHAT_CONVERSATION_ENDPOINT: &str = "/v1/chat/conversation";
/// Agentic chat endpoint label.
pub const CHAT_AGENTIC_ENDPOINT: &str = "/v1/chat/agentic";

/// A fully-composed request, ready for the dispatch pipeline.
pub struct RequestPlan {
    /// Endpoint label; the upstream path is this minus the `/v1` prefix.
    pub endpoint: &'static str,
    /// Body forwarded upstream, auth-override keys removed.
    pub forward: Map<String, Value>,
    /// Fingerprint subset feeding the exact-cache key.
    pub fingerprint: Map<String, Value>,
    /// Free-text field feeding the semantic tier.
    pub query_text: Option<String>,
    /// LLM source for the semantic context, when applicable.
    pub llm_source: Option<String>,
    /// Model name for the semantic context, when applicable.
    pub model: Option<String>,
    /// Per-request basic-auth override.
    pub auth_override: Option<BasicAuth>,
}

fn auth_override(user: Option<String>, pass: Option<String>) -> Option<BasicAuth> {
    match (user, pass) {
        (Some(user), Some(pass)) => Some(BasicAuth { user, pass }),
        _ => None,
    }
}

fn keyed_text(text: &str, normalize: bool) -> String {
    if normalize {
        normalize_query(text)
    } else {
        text.to_string()
    }
}

fn default_search_top_k() -> u32 {
    5
}

fn default_fts_top_k() -> u32 {
    10
}

fn default_chat_top_k() -> u32 {
    10
}

fn default_alpha() -> f64 {
    0.5
}

fn default_fts_mode() -> String {
    "both".to_string()
}

fn default_temperature() -> f64 {
    0.1
}

fn default_top_p() -> f64 {
    0.9
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_repeat_penalty() -> f64 {
    1.1
}

/// `POST /v1/search/vector` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct VectorSearchRequest {
    /// Search text.
    pub query: String,
    /// Result count.
    #[serde(default = "default_search_top_k")]
    pub top_k: u32,
    /// Backend override.
    pub backend: Option<String>,
    /// Upstream basic-auth user override.
    #[serde(rename = "_upstream_user")]
    pub upstream_user: Option<String>,
    /// Upstream basic-auth password override.
    #[serde(rename = "_upstream_pass")]
    pub upstream_pass: Option<String>,
}

impl VectorSearchRequest {
    /// Composes the dispatch plan; the fingerprint covers `{query, top_k}`.
    pub fn plan(self, normalize: bool) -> RequestPlan {
        let mut forward = Map::new();
        forward.insert("query".to_string(), json!(self.query));
        forward.insert("top_k".to_string(), json!(self.top_k));

        let mut fingerprint = forward.clone();
        fingerprint.insert("query".to_string(), json!(keyed_text(&self.query, normalize)));

        RequestPlan {
            endpoint: VECTOR_ENDPOINT,
            forward,
            fingerprint,
            query_text: Some(self.query),
            llm_source: None,
            model: None,
            auth_override: auth_override(self.upstream_user, self.upstream_pass),
        }
    }
}

/// `POST /v1/search/hybrid` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct HybridSearchRequest {
    /// Search text.
    pub query: String,
    /// Result count.
    #[serde(default = "default_search_top_k")]
    pub top_k: u32,
    /// Lexical/vector blend factor.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Backend override.
    pub backend: Option<String>,
    /// Upstream basic-auth user override.
    #[serde(rename = "_upstream_user")]
    pub upstream_user: Option<String>,
    /// Upstream basic-auth password override.
    #[serde(rename = "_upstream_pass")]
    pub upstream_pass: Option<String>,
}

impl HybridSearchRequest {
    /// Composes the dispatch plan; the fingerprint covers
    /// `{query, top_k, alpha}`.
    pub fn plan(self, normalize: bool) -> RequestPlan {
        let mut forward = Map::new();
        forward.insert("query".to_string(), json!(self.query));
        forward.insert("top_k".to_string(), json!(self.top_k));
        forward.insert("alpha".to_string(), json!(self.alpha));

        let mut fingerprint = forward.clone();
        fingerprint.insert("query".to_string(), json!(keyed_text(&self.query, normalize)));

        RequestPlan {
            endpoint: HYBRID_ENDPOINT,
            forward,
            fingerprint,
            query_text: Some(self.query),
            llm_source: None,
            model: None,
            auth_override: auth_override(self.upstream_user, self.upstream_pass),
        }
    }
}

/// `POST /v1/search/fts` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct FtsSearchRequest {
    /// Search text.
    pub query: String,
    /// Result count.
    #[serde(default = "default_fts_top_k")]
    pub top_k: u32,
    /// Search scope: `documents`, `metadata`, or `both`. Opaque to the
    /// router; the upstream validates it.
    #[serde(default = "default_fts_mode")]
    pub mode: String,
    /// Backend override.
    pub backend: Option<String>,
    /// Upstream basic-auth user override.
    #[serde(rename = "_upstream_user")]
    pub upstream_user: Option<String>,
    /// Upstream basic-auth password override.
    #[serde(rename = "_upstream_pass")]
    pub upstream_pass: Option<String>,
}

impl FtsSearchRequest {
    /// Composes the dispatch plan; the fingerprint covers
    /// `{query, top_k, mode}`.
    pub fn plan(self, normalize: bool) -> RequestPlan {
        let mut forward = Map::new();
        forward.insert("query".to_string(), json!(self.query));
        forward.insert("top_k".to_string(), json!(self.top_k));
        forward.insert("mode".to_string(), json!(self.mode));

        let mut fingerprint = forward.clone();
        fingerprint.insert("query".to_string(), json!(keyed_text(&self.query, normalize)));

        RequestPlan {
            endpoint: FTS_ENDPOINT,
            forward,
            fingerprint,
            query_text: Some(self.query),
            llm_source: None,
            model: None,
            auth_override: auth_override(self.upstream_user, self.upstream_pass),
        }
    }
}

/// `POST /v1/search/rag` request body.
///
/// Serialization is the forwarding rule: null optionals and the auth
/// override fields are skipped, everything else goes upstream verbatim.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RagRequest {
    /// The question to answer.
    pub question: String,
    /// Backend override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    /// LLM source override, forwarded as provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_source: Option<String>,
    /// Model override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Provider region.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Pre-retrieved context chunks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_chunks: Option<Vec<String>>,
    /// Source labels for the chunks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    /// Chunk metadata objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_metadata: Option<Vec<Value>>,
    /// Prompt template override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Nucleus sampling threshold.
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    /// Response token budget.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Repetition penalty.
    #[serde(default = "default_repeat_penalty")]
    pub repeat_penalty: f64,
    /// Prior conversation turns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_history: Option<Vec<Value>>,
    /// Upstream basic-auth user override.
    #[serde(rename = "_upstream_user", skip_serializing)]
    pub upstream_user: Option<String>,
    /// Upstream basic-auth password override.
    #[serde(rename = "_upstream_pass", skip_serializing)]
    pub upstream_pass: Option<String>,
}

impl RagRequest {
    /// Composes the dispatch plan; the fingerprint covers the full
    /// forwarded body (null fields and auth overrides already removed),
    /// with the question normalized for keying.
    pub fn plan(mut self, normalize: bool) -> RequestPlan {
        let auth = auth_override(self.upstream_user.take(), self.upstream_pass.take());

        let forward = match serde_json::to_value(&self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let mut fingerprint = forward.clone();
        fingerprint.insert(
            "question".to_string(),
            json!(keyed_text(&self.question, normalize)),
        );

        RequestPlan {
            endpoint: RAG_ENDPOINT,
            forward,
            fingerprint,
            llm_source: self.llm_source,
            model: self.model,
            query_text: Some(self.question),
            auth_override: auth,
        }
    }
}

/// `POST /v1/chat/conversation` and `/v1/chat/agentic` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// The user message.
    pub message: String,
    /// Backend override.
    pub backend: Option<String>,
    /// LLM source override.
    pub llm_source: Option<String>,
    /// Model override.
    pub model: Option<String>,
    /// Retrieval depth.
    #[serde(default = "default_chat_top_k")]
    pub top_k: u32,
    /// System prompt override.
    pub system_prompt: Option<String>,
    /// Prior conversation turns.
    pub chat_history: Option<Vec<Value>>,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Nucleus sampling threshold.
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    /// Response token budget.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Repetition penalty.
    #[serde(default = "default_repeat_penalty")]
    pub repeat_penalty: f64,
    /// Upstream basic-auth user override.
    #[serde(rename = "_upstream_user")]
    pub upstream_user: Option<String>,
    /// Upstream basic-auth password override.
    #[serde(rename = "_upstream_pass")]
    pub upstream_pass: Option<String>,
}

impl ChatRequest {
    /// Composes the dispatch plan for a chat endpoint with the resolved
    /// LLM source.
    ///
    /// The fingerprint deliberately covers only
    /// `{llm_source, model, message, top_k}` — chat history and sampling
    /// hyperparameters are excluded to maximize hit rate, so callers
    /// relying on deterministic decoding must bypass the cache
    /// themselves.
    pub fn plan(self, endpoint: &'static str, llm: LlmSource, normalize: bool) -> RequestPlan {
        let auth = auth_override(self.upstream_user, self.upstream_pass);

        let mut forward = Map::new();
        forward.insert("llm_source".to_string(), json!(llm.as_str()));
        if let Some(model) = &self.model {
            forward.insert("model".to_string(), json!(model));
        }
        forward.insert("message".to_string(), json!(self.message));
        if let Some(history) = &self.chat_history {
            forward.insert("chat_history".to_string(), json!(history));
        }
        if let Some(prompt) = &self.system_prompt {
            forward.insert("system_prompt".to_string(), json!(prompt));
        }
        forward.insert("temperature".to_string(), json!(self.temperature));
        forward.insert("top_p".to_string(), json!(self.top_p));
        forward.insert("max_tokens".to_string(), json!(self.max_tokens));
        forward.insert("repeat_penalty".to_string(), json!(self.repeat_penalty));
        forward.insert("top_k".to_string(), json!(self.top_k));

        let mut fingerprint = Map::new();
        fingerprint.insert("llm_source".to_string(), json!(llm.as_str()));
        fingerprint.insert("model".to_string(), json!(self.model));
        fingerprint.insert(
            "message".to_string(),
            json!(keyed_text(&self.message, normalize)),
        );
        fingerprint.insert("top_k".to_string(), json!(self.top_k));

        RequestPlan {
            endpoint,
            forward,
            fingerprint,
            llm_source: Some(llm.as_str().to_string()),
            model: self.model,
            query_text: Some(self.message),
            auth_override: auth,
        }
    }
}

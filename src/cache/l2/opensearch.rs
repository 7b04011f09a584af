//! OpenSearch-backed semantic store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use tokio::sync::OnceCell;
use tracing::warn;

use super::backend::SemanticBackend;
use super::error::{L2CacheError, L2CacheResult};
use super::types::SemanticContext;
use crate::embedding::cosine_similarity;

/// Semantic store over an OpenSearch knn index.
///
/// The index maps one document per cached response with a `knn_vector`
/// field of the configured dimension under cosine similarity. Because
/// the ANN index may surface neighbours below the configured threshold,
/// `search` re-computes cosine similarity from the returned embedding
/// before deciding hit or miss.
pub struct OpenSearchBackend {
    http: reqwest::Client,
    base_url: String,
    index: String,
    auth: Option<(String, String)>,
    dim: usize,
    ready: OnceCell<()>,
}

impl OpenSearchBackend {
    /// Builds a backend against `base_url`/`index`.
    pub fn new(
        base_url: &str,
        index: &str,
        user: &str,
        pass: &str,
        dim: usize,
        client_timeout: Duration,
    ) -> L2CacheResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(client_timeout)
            .build()
            .map_err(|e| L2CacheError::StoreUnavailable {
                reason: e.to_string(),
            })?;
        let auth = if user.is_empty() && pass.is_empty() {
            None
        } else {
            Some((user.to_string(), pass.to_string()))
        };
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            index: index.to_string(),
            auth,
            dim,
            ready: OnceCell::new(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some((user, pass)) = &self.auth {
            builder = builder.basic_auth(user, Some(pass));
        }
        builder
    }

    async fn create_index(&self) -> L2CacheResult<()> {
        let exists = self
            .request(reqwest::Method::GET, &format!("/{}", self.index))
            .send()
            .await?;
        if exists.status().is_success() {
            return Ok(());
        }

        let body = json!({
            "settings": {"index": {"knn": true}},
            "mappings": {
                "properties": {
                    "tenant_id": {"type": "keyword"},
                    "endpoint": {"type": "keyword"},
                    "backend": {"type": "keyword"},
                    "llm_source": {"type": "keyword"},
                    "model": {"type": "keyword"},
                    "query_text": {"type": "text"},
                    "embedding": {
                        "type": "knn_vector",
                        "dimension": self.dim,
                        "method": {
                            "name": "hnsw",
                            "space_type": "cosinesimil",
                            "engine": "nmslib"
                        }
                    },
                    "response_json": {"type": "text"},
                    "created_at": {"type": "date"},
                    "expires_at": {"type": "date"}
                }
            }
        });

        let created = self
            .request(reqwest::Method::PUT, &format!("/{}", self.index))
            .json(&body)
            .send()
            .await?;
        if !created.status().is_success() {
            return Err(L2CacheError::StoreRejected {
                status: created.status().as_u16(),
            });
        }
        Ok(())
    }

    /// Builds the bool filter clauses for `ctx`.
    ///
    /// Stored entries with a null `llm_source`/`model` match any query
    /// context, so the narrowing clauses accept either the exact value
    /// or a missing field.
    fn filters(ctx: &SemanticContext) -> Vec<Value> {
        let mut filters = vec![
            json!({"term": {"tenant_id": ctx.tenant_id}}),
            json!({"term": {"endpoint": ctx.endpoint}}),
            json!({"term": {"backend": ctx.backend}}),
            json!({"range": {"expires_at": {"gt": "now"}}}),
        ];
        if let Some(llm_source) = &ctx.llm_source {
            filters.push(json!({
                "bool": {
                    "minimum_should_match": 1,
                    "should": [
                        {"term": {"llm_source": llm_source}},
                        {"bool": {"must_not": {"exists": {"field": "llm_source"}}}}
                    ]
                }
            }));
        }
        if let Some(model) = &ctx.model {
            filters.push(json!({
                "bool": {
                    "minimum_should_match": 1,
                    "should": [
                        {"term": {"model": model}},
                        {"bool": {"must_not": {"exists": {"field": "model"}}}}
                    ]
                }
            }));
        }
        filters
    }
}

#[async_trait]
impl SemanticBackend for OpenSearchBackend {
    async fn ensure_ready(&self) -> L2CacheResult<()> {
        self.ready
            .get_or_try_init(|| self.create_index())
            .await
            .map(|_| ())
    }

    async fn search(
        &self,
        vector: &[f32],
        ctx: &SemanticContext,
        threshold: f32,
    ) -> L2CacheResult<Option<Value>> {
        if vector.len() != self.dim {
            return Err(L2CacheError::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        self.ensure_ready().await?;

        let query = json!({
            "size": 1,
            "_source": ["response_json", "embedding"],
            "query": {
                "bool": {
                    "must": [
                        {"knn": {"embedding": {"vector": vector, "k": 1}}}
                    ],
                    "filter": Self::filters(ctx)
                }
            }
        });

        let resp = self
            .request(reqwest::Method::POST, &format!("/{}/_search", self.index))
            .json(&query)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(L2CacheError::StoreRejected {
                status: resp.status().as_u16(),
            });
        }

        let data: Value = resp.json().await?;
        let Some(source) = data
            .pointer("/hits/hits/0/_source")
            .and_then(Value::as_object)
        else {
            return Ok(None);
        };

        let stored: Vec<f32> = source
            .get("embedding")
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_f64)
                    .map(|v| v as f32)
                    .collect()
            })
            .ok_or_else(|| L2CacheError::MalformedResponse {
                reason: "hit is missing its embedding".to_string(),
            })?;

        // The ANN stage may hand back a neighbour below the threshold;
        // the similarity decision stays on this side.
        let similarity = cosine_similarity(vector, &stored);
        if similarity < threshold {
            return Ok(None);
        }

        let response_json = source
            .get("response_json")
            .and_then(Value::as_str)
            .ok_or_else(|| L2CacheError::MalformedResponse {
                reason: "hit is missing response_json".to_string(),
            })?;
        match serde_json::from_str(response_json) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(error = %e, "stored semantic entry undecodable, treating as miss");
                Ok(None)
            }
        }
    }

    async fn index_doc(
        &self,
        vector: &[f32],
        ctx: &SemanticContext,
        query_text: &str,
        response: &Value,
        ttl: Duration,
    ) -> L2CacheResult<()> {
        if vector.len() != self.dim {
            return Err(L2CacheError::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        self.ensure_ready().await?;

        let created_at = Utc::now();
        let expires_at = created_at
            + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(3600));

        let document = json!({
            "tenant_id": ctx.tenant_id,
            "endpoint": ctx.endpoint,
            "backend": ctx.backend,
            "llm_source": ctx.llm_source,
            "model": ctx.model,
            "query_text": query_text,
            "embedding": vector,
            "response_json": response.to_string(),
            "created_at": created_at.to_rfc3339(),
            "expires_at": expires_at.to_rfc3339(),
        });

        let resp = self
            .request(reqwest::Method::POST, &format!("/{}/_doc", self.index))
            .json(&document)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(L2CacheError::StoreRejected {
                status: resp.status().as_u16(),
            });
        }
        Ok(())
    }
}

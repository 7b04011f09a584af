//! Router-level tests for tenant resolution, validation mapping, and
//! the cache-before-upstream ordering, driven through `oneshot` with
//! in-memory store backends. Upstream URLs point at a closed port so
//! any accidental proxy call surfaces as a 502.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use super::*;
use crate::cache::l1::{ExactStore, L1ExactCache, MemoryExactStore};
use crate::cache::l2::{L2SemanticCache, MockSemanticBackend};
use crate::config::Config;
use crate::embedding::{DEFAULT_EMBEDDER, QueryEmbedder};
use crate::hashing;
use crate::proxy::UpstreamPool;
use crate::tenant::TenantRegistry;

const TENANTS_YAML: &str = r#"
tenants:
  acme:
    default_backend: opensearch
    upstreams:
      opensearch_api: http://127.0.0.1:9
      postgres_api: http://127.0.0.1:9
default:
  default_backend: opensearch
  upstreams:
    opensearch_api: http://127.0.0.1:9
"#;

struct TestHarness {
    state: AppState,
    exact_store: Arc<MemoryExactStore>,
}

fn harness(tenancy_enable: bool) -> TestHarness {
    let config = Config {
        tenancy_enable,
        metrics_enable: false,
        cors_enable: false,
        upstream_timeout: Duration::from_millis(500),
        ..Config::default()
    };

    let registry = TenantRegistry::from_yaml(TENANTS_YAML).expect("tenants yaml");
    let exact_store = Arc::new(MemoryExactStore::new());
    let exact = L1ExactCache::new(Some(exact_store.clone()), Duration::from_secs(60));
    let semantic = L2SemanticCache::new(
        QueryEmbedder::from_config(DEFAULT_EMBEDDER, 64),
        Some(Arc::new(MockSemanticBackend::new())),
        0.90,
        Duration::from_secs(60),
    );
    let upstreams = UpstreamPool::new(config.upstream_timeout);

    TestHarness {
        state: AppState::new(
            Arc::new(config),
            Arc::new(registry),
            Arc::new(exact),
            Arc::new(semantic),
            Arc::new(upstreams),
        ),
        exact_store,
    }
}

fn post_json(uri: &str, tenant: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(tenant) = tenant {
        builder = builder.header("x-tenant-id", tenant);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

mod health {
    use super::*;

    #[tokio::test]
    async fn health_is_open_and_truthful() {
        let app = create_router_with_state(harness(false).state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"ok": true}));
    }
}

mod tenant_resolution {
    use super::*;

    #[tokio::test]
    async fn missing_header_is_401_when_tenancy_enabled() {
        let app = create_router_with_state(harness(true).state);
        let response = app
            .oneshot(post_json("/v1/search/vector", None, json!({"query": "q"})))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert!(body["error"].as_str().expect("error").contains("X-Tenant-Id"));
    }

    #[tokio::test]
    async fn unknown_tenant_is_401_with_id_echoed() {
        let app = create_router_with_state(harness(true).state);
        let response = app
            .oneshot(post_json(
                "/v1/search/vector",
                Some("ghost"),
                json!({"query": "q"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert!(body["error"].as_str().expect("error").contains("ghost"));
    }

    #[tokio::test]
    async fn header_is_ignored_when_tenancy_disabled() {
        // Routed to the default tenant; the closed upstream port means a
        // 502, proving resolution got past the tenant step.
        let app = create_router_with_state(harness(false).state);
        let response = app
            .oneshot(post_json(
                "/v1/search/vector",
                Some("ghost"),
                json!({"query": "q"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}

mod validation {
    use super::*;

    #[tokio::test]
    async fn invalid_backend_is_400() {
        let app = create_router_with_state(harness(true).state);
        let response = app
            .oneshot(post_json(
                "/v1/search/vector",
                Some("acme"),
                json!({"query": "q", "backend": "sqlite"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().expect("error").contains("sqlite"));
    }

    #[tokio::test]
    async fn invalid_llm_source_is_400() {
        let app = create_router_with_state(harness(true).state);
        let response = app
            .oneshot(post_json(
                "/v1/chat/conversation",
                Some("acme"),
                json!({"message": "hi", "llm_source": "claude"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rag_validates_llm_source_without_defaulting() {
        let app = create_router_with_state(harness(true).state);
        let response = app
            .oneshot(post_json(
                "/v1/search/rag",
                Some("acme"),
                json!({"question": "q", "llm_source": "claude"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unconfigured_backend_is_400() {
        // acme has no oracle upstream configured.
        let app = create_router_with_state(harness(true).state);
        let response = app
            .oneshot(post_json(
                "/v1/search/vector",
                Some("acme"),
                json!({"query": "q", "backend": "oracle"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().expect("error").contains("oracle"));
    }

    #[tokio::test]
    async fn malformed_body_is_a_client_error() {
        let app = create_router_with_state(harness(true).state);
        let request = Request::builder()
            .method("POST")
            .uri("/v1/search/vector")
            .header("content-type", "application/json")
            .header("x-tenant-id", "acme")
            .body(Body::from("{not json"))
            .expect("request");
        let response = app.oneshot(request).await.expect("response");

        assert!(response.status().is_client_error());
    }
}

mod cache_ordering {
    use super::*;

    #[tokio::test]
    async fn exact_hit_short_circuits_the_upstream() {
        let harness = harness(true);

        // Seed the exact tier under the key the handler will compute.
        let request = VectorSearchRequest {
            query: "hello".to_string(),
            top_k: 3,
            backend: None,
            upstream_user: None,
            upstream_pass: None,
        };
        let plan = request.plan(false);
        let key = hashing::cache_key(plan.endpoint, "opensearch", &plan.fingerprint);
        let cached = json!({"results": ["from-cache"]});
        harness
            .exact_store
            .set(
                &key,
                cached.to_string().as_bytes(),
                Duration::from_secs(60),
            )
            .await
            .expect("seed write");

        // The upstream port is closed, so anything short of a cache hit
        // would be a 502.
        let app = create_router_with_state(harness.state);
        let response = app
            .oneshot(post_json(
                "/v1/search/vector",
                Some("acme"),
                json!({"query": "hello", "top_k": 3}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, cached);
    }

    #[tokio::test]
    async fn unreachable_upstream_is_502_naming_the_backend() {
        let app = create_router_with_state(harness(true).state);
        let response = app
            .oneshot(post_json(
                "/v1/search/vector",
                Some("acme"),
                json!({"query": "nothing cached"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert!(body["error"].as_str().expect("error").contains("opensearch"));
    }
}

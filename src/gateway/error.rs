use axum::{
    Json,
    body::Body,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::tenant::Backend;

/// Errors that terminate the dispatch pipeline.
///
/// Cache and embedder failures never appear here; the only errors a
/// caller can observe are validation failures, tenant resolution
/// failures, and upstream failures.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing X-Tenant-Id header")]
    TenantMissing,

    #[error("unknown tenant: {id}")]
    TenantUnknown { id: String },

    #[error("invalid backend: {value}")]
    InvalidBackend { value: String },

    #[error("invalid llm_source: {value}")]
    InvalidLlmSource { value: String },

    #[error("upstream not configured for backend '{backend}'")]
    BackendUnavailable { backend: &'static str },

    #[error("upstream error ({backend})")]
    UpstreamUnavailable { backend: Backend },

    #[error("upstream rejected request: status {status}")]
    UpstreamClientError { status: StatusCode, body: Vec<u8> },
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            // Upstream 4xx responses pass through verbatim.
            GatewayError::UpstreamClientError { status, body } => {
                let mut response = Response::new(Body::from(body.clone()));
                *response.status_mut() = *status;
                response.headers_mut().insert(
                    CONTENT_TYPE,
                    axum::http::HeaderValue::from_static("application/json"),
                );
                return response;
            }
            GatewayError::TenantMissing | GatewayError::TenantUnknown { .. } => {
                StatusCode::UNAUTHORIZED
            }
            GatewayError::InvalidBackend { .. }
            | GatewayError::InvalidLlmSource { .. }
            | GatewayError::BackendUnavailable { .. } => StatusCode::BAD_REQUEST,
            GatewayError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });
        (status, body).into_response()
    }
}

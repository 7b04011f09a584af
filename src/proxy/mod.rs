//! Pooled upstream HTTP clients.
//!
//! One `reqwest::Client` (and therefore one connection pool) exists per
//! upstream base URL, created on first use and shared for the process
//! lifetime. Clients are never closed; the pool only ever grows to the
//! number of distinct configured base URLs.

pub mod error;

pub use error::ProxyError;

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use axum::http::StatusCode;
use parking_lot::RwLock;
use serde_json::Value;

/// Basic-auth credentials for an upstream call.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    /// Username.
    pub user: String,
    /// Password.
    pub pass: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Credentials stay out of logs.
        f.debug_struct("BasicAuth")
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .finish()
    }
}

/// Raw reply from an upstream call; status interpretation belongs to
/// the dispatcher.
#[derive(Debug)]
pub struct UpstreamReply {
    /// HTTP status returned by the upstream.
    pub status: StatusCode,
    /// Raw response body.
    pub body: Vec<u8>,
}

/// Per-base-URL pool of HTTP clients with a shared request timeout.
pub struct UpstreamPool {
    clients: RwLock<HashMap<String, reqwest::Client>>,
    timeout: Duration,
}

impl UpstreamPool {
    /// Creates an empty pool whose clients carry `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            timeout,
        }
    }

    /// Returns the client for `base_url`, building it on first use.
    /// Concurrent first users converge on a single instance.
    fn client_for(&self, base_url: &str) -> Result<reqwest::Client, ProxyError> {
        if let Some(client) = self.clients.read().get(base_url) {
            return Ok(client.clone());
        }

        let built = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ProxyError::ClientBuild {
                reason: e.to_string(),
            })?;

        let mut clients = self.clients.write();
        // Another request may have won the race; keep its client.
        Ok(clients
            .entry(base_url.to_string())
            .or_insert(built)
            .clone())
    }

    /// POSTs `body` as JSON to `base_url` + `path` with optional basic
    /// auth, returning the raw status and body.
    pub async fn post(
        &self,
        base_url: &str,
        path: &str,
        body: &Value,
        auth: Option<&BasicAuth>,
    ) -> Result<UpstreamReply, ProxyError> {
        let client = self.client_for(base_url)?;
        let url = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );

        let mut request = client.post(url).json(body);
        if let Some(auth) = auth {
            request = request.basic_auth(&auth.user, Some(&auth.pass));
        }

        let response = request.send().await.map_err(|e| ProxyError::Transport {
            reason: e.to_string(),
        })?;
        let status = StatusCode::from_u16(response.status().as_u16()).map_err(|e| {
            ProxyError::Transport {
                reason: e.to_string(),
            }
        })?;
        let body = response
            .bytes()
            .await
            .map_err(|e| ProxyError::Transport {
                reason: e.to_string(),
            })?
            .to_vec();

        Ok(UpstreamReply { status, body })
    }

    /// Number of clients currently pooled.
    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    /// Whether no client has been created yet.
    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn clients_are_reused_per_base_url() {
        let pool = UpstreamPool::new(Duration::from_secs(5));
        assert!(pool.is_empty());

        pool.client_for("http://a:1").expect("client builds");
        pool.client_for("http://a:1").expect("client builds");
        pool.client_for("http://b:2").expect("client builds");
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn basic_auth_debug_redacts_password() {
        let auth = BasicAuth {
            user: "svc".to_string(),
            pass: "hunter2".to_string(),
        };
        let rendered = format!("{auth:?}");
        assert!(rendered.contains("svc"));
        assert!(!rendered.contains("hunter2"));
    }
}

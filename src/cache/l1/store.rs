//! Exact store backends.

use std::time::Duration;

use async_trait::async_trait;
use redis::{ConnectionInfo, IntoConnectionInfo, aio::MultiplexedConnection, cluster::ClusterClient,
    cluster_async::ClusterConnection};

use super::error::{ExactCacheError, ExactCacheResult};

/// Key/value store with TTL semantics backing the exact tier.
#[async_trait]
pub trait ExactStore: Send + Sync {
    /// Fetches the raw bytes stored under `key`, if any.
    async fn get(&self, key: &str) -> ExactCacheResult<Option<Vec<u8>>>;

    /// Stores `value` under `key` with the given TTL.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> ExactCacheResult<()>;
}

/// A live connection to either a standalone or cluster deployment.
/// Both connection types speak the same command API, so a macro keeps
/// the dispatch duplication-free.
enum RedisConn {
    Standalone(MultiplexedConnection),
    Cluster(ClusterConnection),
}

macro_rules! redis_cmd {
    ($conn:expr, $cmd:expr) => {
        match $conn {
            RedisConn::Standalone(ref mut c) => $cmd.query_async(c).await,
            RedisConn::Cluster(ref mut c) => $cmd.query_async(c).await,
        }
    };
}

enum RedisClient {
    Standalone(redis::Client),
    Cluster(ClusterClient),
}

/// Valkey/Redis-backed exact store.
///
/// Standalone mode uses a multiplexed connection per operation with
/// separate connect and per-command deadlines. Cluster mode delegates
/// redirections (MOVED/ASK) to the cluster client, whose builder carries
/// the same two timeouts.
pub struct RedisExactStore {
    client: RedisClient,
    connect_timeout: Duration,
    socket_timeout: Duration,
}

impl RedisExactStore {
    /// Builds a store from its connection URL.
    ///
    /// `cluster` switches to cluster mode, where `url` may carry a
    /// comma-separated node list. When `tls_verify` is off, `rediss://`
    /// URLs are opened without certificate verification.
    pub fn connect(
        url: &str,
        cluster: bool,
        tls_verify: bool,
        connect_timeout: Duration,
        socket_timeout: Duration,
    ) -> ExactCacheResult<Self> {
        let client = if cluster {
            let nodes: Vec<ConnectionInfo> = url
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Self::node_url(s, tls_verify).into_connection_info())
                .collect::<Result<Vec<_>, _>>()?;
            if nodes.is_empty() {
                return Err(ExactCacheError::InvalidConfig {
                    reason: "no cluster nodes specified in URL".to_string(),
                });
            }

            let cluster_client = redis::cluster::ClusterClientBuilder::new(nodes)
                .connection_timeout(connect_timeout)
                .response_timeout(socket_timeout)
                .build()?;
            RedisClient::Cluster(cluster_client)
        } else {
            RedisClient::Standalone(redis::Client::open(Self::node_url(url, tls_verify))?)
        };

        Ok(Self {
            client,
            connect_timeout,
            socket_timeout,
        })
    }

    /// Normalizes a node URL, disabling certificate verification on
    /// `rediss://` endpoints when requested.
    fn node_url(url: &str, tls_verify: bool) -> String {
        let url = if url.starts_with("redis://") || url.starts_with("rediss://") {
            url.to_string()
        } else {
            format!("redis://{}", url)
        };
        if !tls_verify && url.starts_with("rediss://") && !url.contains('#') {
            format!("{}#insecure", url)
        } else {
            url
        }
    }

    async fn connection(&self) -> ExactCacheResult<RedisConn> {
        match &self.client {
            RedisClient::Standalone(client) => {
                let conn = tokio::time::timeout(
                    self.connect_timeout,
                    client.get_multiplexed_async_connection(),
                )
                .await
                .map_err(|_| ExactCacheError::Timeout {
                    elapsed_ms: self.connect_timeout.as_millis(),
                })??;
                Ok(RedisConn::Standalone(conn))
            }
            RedisClient::Cluster(client) => {
                let conn = client.get_async_connection().await?;
                Ok(RedisConn::Cluster(conn))
            }
        }
    }

    async fn with_deadline<T>(
        &self,
        op: impl std::future::Future<Output = Result<T, redis::RedisError>>,
    ) -> ExactCacheResult<T> {
        tokio::time::timeout(self.socket_timeout, op)
            .await
            .map_err(|_| ExactCacheError::Timeout {
                elapsed_ms: self.socket_timeout.as_millis(),
            })?
            .map_err(ExactCacheError::Redis)
    }
}

#[async_trait]
impl ExactStore for RedisExactStore {
    async fn get(&self, key: &str) -> ExactCacheResult<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        let op = async { redis_cmd!(conn, redis::cmd("GET").arg(key)) };
        let data: Option<Vec<u8>> = self.with_deadline(op).await?;
        Ok(data)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> ExactCacheResult<()> {
        let mut conn = self.connection().await?;
        let ttl_secs = ttl.as_secs().max(1);
        let op = async {
            redis_cmd!(
                conn,
                redis::cmd("SETEX").arg(key).arg(ttl_secs).arg(value)
            )
        };
        let _: () = self.with_deadline(op).await?;
        Ok(())
    }
}

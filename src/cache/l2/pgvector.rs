//! pgvector-backed semantic store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::sync::OnceCell;
use tracing::warn;

use super::backend::SemanticBackend;
use super::error::{L2CacheError, L2CacheResult};
use super::types::SemanticContext;

/// Semantic store over Postgres with the `vector` extension.
///
/// Similarity is cosine: the query computes `1 - (embedding <=> v)`
/// where `<=>` is pgvector's cosine-distance operator, ordered by
/// distance so the single nearest row comes back for thresholding.
pub struct PgVectorBackend {
    pool: PgPool,
    table: String,
    dim: usize,
    ready: OnceCell<()>,
}

impl PgVectorBackend {
    /// Builds a backend over `dsn`, creating the pool lazily so startup
    /// does not depend on the database being up.
    pub fn connect_lazy(
        dsn: &str,
        table: &str,
        dim: usize,
        client_timeout: Duration,
    ) -> L2CacheResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .acquire_timeout(client_timeout)
            .connect_lazy(dsn)?;
        Ok(Self {
            pool,
            table: table.to_string(),
            dim,
            ready: OnceCell::new(),
        })
    }

    /// Renders a pgvector literal: `[x1,x2,...]`, bound as text and cast
    /// with `::vector`.
    fn vector_literal(vector: &[f32]) -> String {
        let mut out = String::with_capacity(vector.len() * 8 + 2);
        out.push('[');
        for (i, v) in vector.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&format!("{v}"));
        }
        out.push(']');
        out
    }

    async fn create_schema(&self) -> L2CacheResult<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;

        let create_table = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id bigserial PRIMARY KEY,
                tenant_id text NOT NULL,
                endpoint text NOT NULL,
                backend text NOT NULL,
                llm_source text,
                model text,
                query_text text,
                embedding vector({dim}),
                response_json text,
                created_at timestamptz NOT NULL DEFAULT now(),
                expires_at timestamptz NOT NULL
            )
            "#,
            table = self.table,
            dim = self.dim,
        );
        sqlx::query(&create_table).execute(&self.pool).await?;

        let create_index = format!(
            "CREATE INDEX IF NOT EXISTS {table}_ann_idx ON {table} \
             USING ivfflat (embedding vector_cosine_ops) WITH (lists = 100)",
            table = self.table,
        );
        sqlx::query(&create_index).execute(&self.pool).await?;
        Ok(())
    }

    fn check_dim(&self, vector: &[f32]) -> L2CacheResult<()> {
        if vector.len() != self.dim {
            return Err(L2CacheError::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SemanticBackend for PgVectorBackend {
    async fn ensure_ready(&self) -> L2CacheResult<()> {
        self.ready
            .get_or_try_init(|| self.create_schema())
            .await
            .map(|_| ())
    }

    async fn search(
        &self,
        vector: &[f32],
        ctx: &SemanticContext,
        threshold: f32,
    ) -> L2CacheResult<Option<Value>> {
        self.check_dim(vector)?;
        self.ensure_ready().await?;

        // A null query-side llm_source/model matches anything; a stored
        // null matches any query context.
        let sql = format!(
            r#"
            SELECT response_json, 1 - (embedding <=> $1::vector) AS score
            FROM {table}
            WHERE tenant_id = $2
              AND endpoint = $3
              AND backend = $4
              AND ($5::text IS NULL OR llm_source IS NULL OR llm_source = $5)
              AND ($6::text IS NULL OR model IS NULL OR model = $6)
              AND expires_at > now()
            ORDER BY embedding <=> $1::vector
            LIMIT 1
            "#,
            table = self.table,
        );

        let row = sqlx::query(&sql)
            .bind(Self::vector_literal(vector))
            .bind(&ctx.tenant_id)
            .bind(&ctx.endpoint)
            .bind(&ctx.backend)
            .bind(ctx.llm_source.as_deref())
            .bind(ctx.model.as_deref())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let score: f64 = row
            .try_get("score")
            .map_err(|e| L2CacheError::MalformedResponse {
                reason: e.to_string(),
            })?;
        if (score as f32) < threshold {
            return Ok(None);
        }

        let response_json: String =
            row.try_get("response_json")
                .map_err(|e| L2CacheError::MalformedResponse {
                    reason: e.to_string(),
                })?;
        match serde_json::from_str(&response_json) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(error = %e, "stored semantic row undecodable, treating as miss");
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
        self.check_dim(vector)?;
        self.ensure_ready().await?;

        let created_at = Utc::now();
        let expires_at = created_at
            + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(3600));

        let sql = format!(
            r#"
            INSERT INTO {table}
              (tenant_id, endpoint, backend, llm_source, model, query_text,
               embedding, response_json, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7::vector, $8, $9, $10)
            "#,
            table = self.table,
        );

        sqlx::query(&sql)
            .bind(&ctx.tenant_id)
            .bind(&ctx.endpoint)
            .bind(&ctx.backend)
            .bind(ctx.llm_source.as_deref())
            .bind(ctx.model.as_deref())
            .bind(query_text)
            .bind(Self::vector_literal(vector))
            .bind(response.to_string())
            .bind(created_at)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_literal_shape() {
        assert_eq!(PgVectorBackend::vector_literal(&[1.0, -0.5, 0.25]), "[1,-0.5,0.25]");
        assert_eq!(PgVectorBackend::vector_literal(&[]), "[]");
    }
}

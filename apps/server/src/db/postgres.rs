//! PostgreSQL document store
//!
//! All collections share one `documents` table; each row holds the full JSON
//! document in a `jsonb` column.

use super::query_builder::{BindValue, QueryBuilder};
use crate::config::DatabaseConfig;
use async_trait::async_trait;
use devcamper_query::{DocumentStore, FindOptions, QueryError, Result, Selector, ID_FIELD};
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::{PgPool, Postgres, Row};
use std::time::{Duration, Instant};

const BACKEND: &str = "postgres";

#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool; every connection gets the configured statement timeout.
    pub async fn connect(config: &DatabaseConfig) -> std::result::Result<Self, sqlx::Error> {
        let statement_timeout_ms = config.statement_timeout_seconds.saturating_mul(1000);

        let pool = PgPoolOptions::new()
            .min_connections(config.pool_min_size)
            .max_connections(config.pool_max_size)
            .acquire_timeout(Duration::from_secs(config.pool_timeout_seconds))
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    sqlx::query(&format!("SET statement_timeout = {statement_timeout_ms}"))
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(&config.url)
            .await?;

        Ok(Self::new(pool))
    }

    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn bind_all<'q>(
    mut query: sqlx::query::Query<'q, Postgres, PgArguments>,
    bind_values: Vec<BindValue>,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    for value in bind_values {
        query = match value {
            BindValue::Text(v) => query.bind(v),
            BindValue::TextArray(vs) => query.bind(vs),
            BindValue::BigInt(n) => query.bind(n),
        };
    }
    query
}

fn document_id(document: &JsonValue) -> Result<String> {
    document
        .get(ID_FIELD)
        .and_then(JsonValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            QueryError::store(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "document has no string 'id' field",
            ))
        })
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn find(
        &self,
        collection: &str,
        selector: &Selector,
        options: &FindOptions,
    ) -> Result<Vec<JsonValue>> {
        let started = Instant::now();
        let (sql, bind_values) = QueryBuilder::build_find(collection, selector, options);

        let rows = bind_all(sqlx::query(&sql), bind_values)
            .fetch_all(&self.pool)
            .await
            .map_err(QueryError::store)?;

        let documents = rows
            .iter()
            .map(|row| row.try_get::<JsonValue, _>("body"))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(QueryError::store)?
            .iter()
            .map(|doc| options.projection.apply(doc))
            .collect();

        super::observe(BACKEND, "find", started);
        Ok(documents)
    }

    async fn count(&self, collection: &str, selector: &Selector) -> Result<u64> {
        let started = Instant::now();
        let (sql, bind_values) = QueryBuilder::build_count(collection, selector);

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for value in bind_values {
            query = match value {
                BindValue::Text(v) => query.bind(v),
                BindValue::TextArray(vs) => query.bind(vs),
                BindValue::BigInt(n) => query.bind(n),
            };
        }

        let total = query
            .fetch_one(&self.pool)
            .await
            .map_err(QueryError::store)?;

        super::observe(BACKEND, "count", started);
        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<JsonValue>> {
        let started = Instant::now();
        let body = sqlx::query_scalar::<_, JsonValue>(
            "SELECT body FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(QueryError::store)?;

        super::observe(BACKEND, "get", started);
        Ok(body)
    }

    async fn insert(&self, collection: &str, document: JsonValue) -> Result<JsonValue> {
        let started = Instant::now();
        let id = document_id(&document)?;

        let body = sqlx::query_scalar::<_, JsonValue>(
            "INSERT INTO documents (collection, id, body, created_at) \
             VALUES ($1, $2, $3, NOW()) RETURNING body",
        )
        .bind(collection)
        .bind(&id)
        .bind(&document)
        .fetch_one(&self.pool)
        .await
        .map_err(QueryError::store)?;

        super::observe(BACKEND, "insert", started);
        Ok(body)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        changes: JsonValue,
    ) -> Result<Option<JsonValue>> {
        let started = Instant::now();
        let body = sqlx::query_scalar::<_, JsonValue>(
            "UPDATE documents SET body = body || $3, updated_at = NOW() \
             WHERE collection = $1 AND id = $2 RETURNING body",
        )
        .bind(collection)
        .bind(id)
        .bind(&changes)
        .fetch_optional(&self.pool)
        .await
        .map_err(QueryError::store)?;

        super::observe(BACKEND, "update", started);
        Ok(body)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let started = Instant::now();
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(QueryError::store)?;

        super::observe(BACKEND, "delete", started);
        Ok(result.rows_affected() > 0)
    }
}

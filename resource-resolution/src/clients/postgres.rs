use super::sql::bind_named;
use super::{QueryExecutor, Row};
use crate::config::DatabaseConfig;
use crate::util::{ResolutionError, Result, SourceError};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row as _;
use std::time::Duration;
use tracing::{debug, info};

/// Runs source queries against PostgreSQL. Each row comes back through
/// `row_to_json`, so column types never have to be known up front.
#[derive(Debug, Clone)]
pub struct PgQueryExecutor {
    pool: PgPool,
}

impl PgQueryExecutor {
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| ResolutionError::Configuration("database url is not set".into()))?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_millis(config.timeout_ms))
            .connect(url)
            .await
            .map_err(|e| ResolutionError::Configuration(format!("database connection failed: {e}")))?;
        info!(max_connections = config.max_connections, "connected resolution database pool");
        Ok(Self { pool })
    }
}

#[async_trait]
impl QueryExecutor for PgQueryExecutor {
    async fn query(&self, sql: &str, params: &IndexMap<String, Value>) -> Result<Vec<Row>, SourceError> {
        let (positional, values) = bind_named(sql, params);
        let wrapped = format!("SELECT row_to_json(q) AS row FROM ({positional}) q");
        debug!(sql = %positional, params = values.len(), "database query");

        let mut query = sqlx::query(&wrapped);
        for value in values {
            query = match value {
                Value::Null => query.bind(Option::<String>::None),
                Value::Bool(b) => query.bind(b),
                Value::Number(n) if n.is_i64() => query.bind(n.as_i64()),
                Value::Number(n) => query.bind(n.as_f64()),
                Value::String(s) => query.bind(s),
                other => query.bind(other),
            };
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        rows.into_iter()
            .map(|row| {
                let value: Value = row
                    .try_get("row")
                    .map_err(|e| SourceError::Mapping(e.to_string()))?;
                match value {
                    Value::Object(map) => Ok(map),
                    other => Err(SourceError::Mapping(format!("unexpected row shape: {other}"))),
                }
            })
            .collect()
    }
}

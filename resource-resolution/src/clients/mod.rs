//! Seams to the systems a source processor talks to. Processors only see
//! these traits; the concrete clients are picked when the resolver is built.

pub mod rest;
pub mod sql;

#[cfg(feature = "postgres")]
pub mod postgres;

use crate::config::EngineConfig;
use crate::util::SourceError;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub use rest::HttpRestClient;

#[cfg(feature = "postgres")]
pub use postgres::PgQueryExecutor;

pub type Row = Map<String, Value>;

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Runs `sql` with `:name` parameters bound from `params` and returns
    /// each row as a column-name keyed object.
    async fn query(&self, sql: &str, params: &IndexMap<String, Value>) -> Result<Vec<Row>, SourceError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestRequest {
    pub method: String,
    pub url: String,
    pub headers: IndexMap<String, String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestResponse {
    pub status: u16,
    pub body: String,
}

impl RestResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait RestClient: Send + Sync {
    async fn exchange(&self, request: RestRequest) -> Result<RestResponse, SourceError>;
}

/// The clients available to one resolver. `endpoint-selector` values in a
/// source definition pick a named client, otherwise the default is used.
#[derive(Clone, Default)]
pub struct Collaborators {
    database: Option<Arc<dyn QueryExecutor>>,
    rest: Option<Arc<dyn RestClient>>,
    databases: HashMap<String, Arc<dyn QueryExecutor>>,
    rests: HashMap<String, Arc<dyn RestClient>>,
}

impl Collaborators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default clients from configuration: always an HTTP client, and a
    /// PostgreSQL pool when a database url is set.
    pub async fn from_config(config: &EngineConfig) -> crate::util::Result<Self> {
        let collaborators = Self::new().with_rest(Arc::new(HttpRestClient::new(&config.rest)?));

        #[cfg(feature = "postgres")]
        let collaborators = match config.database.url {
            Some(_) => collaborators.with_database(Arc::new(PgQueryExecutor::connect(&config.database).await?)),
            None => collaborators,
        };
        if cfg!(not(feature = "postgres")) && config.database.url.is_some() {
            tracing::warn!("database url set but the postgres feature is disabled, database sources will fail");
        }

        Ok(collaborators)
    }

    pub fn with_database(mut self, executor: Arc<dyn QueryExecutor>) -> Self {
        self.database = Some(executor);
        self
    }

    pub fn with_rest(mut self, client: Arc<dyn RestClient>) -> Self {
        self.rest = Some(client);
        self
    }

    pub fn with_database_endpoint(mut self, name: impl Into<String>, executor: Arc<dyn QueryExecutor>) -> Self {
        self.databases.insert(name.into(), executor);
        self
    }

    pub fn with_rest_endpoint(mut self, name: impl Into<String>, client: Arc<dyn RestClient>) -> Self {
        self.rests.insert(name.into(), client);
        self
    }

    pub fn database(&self, selector: Option<&str>) -> Result<Arc<dyn QueryExecutor>, SourceError> {
        let found = match selector {
            Some(name) => self.databases.get(name).cloned(),
            None => self.database.clone(),
        };
        found.ok_or_else(|| {
            SourceError::Transport(format!(
                "no database executor configured for endpoint ({})",
                selector.unwrap_or("default")
            ))
        })
    }

    pub fn rest(&self, selector: Option<&str>) -> Result<Arc<dyn RestClient>, SourceError> {
        let found = match selector {
            Some(name) => self.rests.get(name).cloned(),
            None => self.rest.clone(),
        };
        found.ok_or_else(|| {
            SourceError::Transport(format!(
                "no rest client configured for endpoint ({})",
                selector.unwrap_or("default")
            ))
        })
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("database", &self.database.is_some())
            .field("rest", &self.rest.is_some())
            .field("database_endpoints", &self.databases.keys().collect::<Vec<_>>())
            .field("rest_endpoints", &self.rests.keys().collect::<Vec<_>>())
            .finish()
    }
}

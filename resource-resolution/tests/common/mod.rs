#![allow(dead_code)]

use async_trait::async_trait;
use indexmap::IndexMap;
use resource_resolution::clients::{QueryExecutor, RestClient, RestRequest, RestResponse, Row};
use resource_resolution::meta::{load_assignments, load_dictionary, load_payload};
use resource_resolution::{ResourceAssignment, ResourceDictionary, SourceError};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("resource_resolution=debug")
        .with_test_writer()
        .try_init();
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

pub fn vnf_dictionary() -> ResourceDictionary {
    load_dictionary(&fixture("resources_definition_types.json")).unwrap()
}

pub fn vnf_assignments() -> Vec<ResourceAssignment> {
    load_assignments(&fixture("vnf-assignments.json")).unwrap()
}

pub fn vnf_payload() -> Value {
    load_payload(&fixture("payload.json")).unwrap()
}

/// Answers queries by the table named after `FROM` and records every call.
#[derive(Default)]
pub struct FakeDatabase {
    tables: HashMap<String, Vec<Row>>,
    pub calls: Mutex<Vec<(String, IndexMap<String, Value>)>>,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: &str, rows: Value) -> Self {
        let rows = rows
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().unwrap().clone())
            .collect();
        self.tables.insert(table.to_string(), rows);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn params_for(&self, table: &str) -> Option<IndexMap<String, Value>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(sql, _)| table_of(sql) == Some(table))
            .map(|(_, params)| params.clone())
    }
}

fn table_of(sql: &str) -> Option<&str> {
    let mut words = sql.split_whitespace();
    words.find(|w| w.eq_ignore_ascii_case("FROM"))?;
    words.next()
}

#[async_trait]
impl QueryExecutor for FakeDatabase {
    async fn query(&self, sql: &str, params: &IndexMap<String, Value>) -> Result<Vec<Row>, SourceError> {
        self.calls.lock().unwrap().push((sql.to_string(), params.clone()));
        Ok(table_of(sql)
            .and_then(|t| self.tables.get(t))
            .cloned()
            .unwrap_or_default())
    }
}

/// Serves canned bodies by exact url; anything else is a 404.
#[derive(Default)]
pub struct FakeRest {
    routes: HashMap<String, (u16, String)>,
    pub requests: Mutex<Vec<RestRequest>>,
}

impl FakeRest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, url: &str, status: u16, body: Value) -> Self {
        self.routes.insert(url.to_string(), (status, body.to_string()));
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl RestClient for FakeRest {
    async fn exchange(&self, request: RestRequest) -> Result<RestResponse, SourceError> {
        let (status, body) = self
            .routes
            .get(&request.url)
            .cloned()
            .unwrap_or((404, String::new()));
        self.requests.lock().unwrap().push(request);
        Ok(RestResponse { status, body })
    }
}

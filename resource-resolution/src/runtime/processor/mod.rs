//! One processor per [`SourceKind`]. Each resolves a single assignment
//! against the current context and either yields a value or an error that
//! is recorded on that assignment.

pub mod database;
pub mod default;
pub mod input;
pub mod rest;

use crate::clients::Collaborators;
use crate::config::EngineConfig;
use crate::meta::{ResourceAssignment, ResourceDefinition, ResourceSource, SourceKind};
use crate::runtime::context::ResolutionContext;
use crate::util::SourceError;
use indexmap::IndexMap;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

/// What a processor produced for one assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub value: Value,
    /// Parameters the value was looked up with.
    pub key_identifiers: IndexMap<String, Value>,
}

impl Resolved {
    pub fn value(value: Value) -> Self {
        Self { value, key_identifiers: IndexMap::new() }
    }
}

/// Read-only view a processor gets of the running resolution.
#[derive(Debug, Clone, Copy)]
pub struct SourceEnv<'a> {
    pub context: &'a ResolutionContext,
    pub definition: Option<&'a ResourceDefinition>,
    pub source: Option<&'a ResourceSource>,
    pub collaborators: &'a Collaborators,
    pub config: &'a EngineConfig,
}

impl<'a> SourceEnv<'a> {
    pub fn new(
        context: &'a ResolutionContext,
        collaborators: &'a Collaborators,
        config: &'a EngineConfig,
    ) -> Self {
        Self { context, definition: None, source: None, collaborators, config }
    }

    pub fn with_definition(mut self, definition: &'a ResourceDefinition) -> Self {
        self.definition = Some(definition);
        self
    }

    pub fn with_source(mut self, source: &'a ResourceSource) -> Self {
        self.source = Some(source);
        self
    }
}

pub async fn dispatch(
    kind: SourceKind,
    ra: &ResourceAssignment,
    env: SourceEnv<'_>,
) -> Result<Resolved, SourceError> {
    match kind {
        SourceKind::Input => input::resolve(ra, env),
        SourceKind::Default => default::resolve(ra, env),
        SourceKind::Database => database::resolve(ra, env).await,
        SourceKind::Mdsal => rest::resolve(ra, env).await,
    }
}

/// Remote processors use a value from the payload instead of calling out.
fn input_override(ra: &ResourceAssignment, env: &SourceEnv<'_>) -> Option<Resolved> {
    env.context.input(&ra.name).cloned().map(Resolved::value)
}

/// Resolves every `input-key-mapping` entry against the context.
fn mapped_inputs(
    mapping: &IndexMap<String, String>,
    context: &ResolutionContext,
) -> Result<IndexMap<String, Value>, SourceError> {
    mapping
        .iter()
        .map(|(param, key)| {
            context
                .lookup(key)
                .cloned()
                .map(|value| (param.clone(), value))
                .ok_or_else(|| SourceError::MissingInputKey(key.clone()))
        })
        .collect()
}

fn source_properties<T: serde::de::DeserializeOwned>(
    ra: &ResourceAssignment,
    env: &SourceEnv<'_>,
) -> Result<T, SourceError> {
    let source = env.source.ok_or_else(|| {
        SourceError::Mapping(format!(
            "no source definition for ({}) source({})",
            ra.dictionary_name(),
            ra.source().unwrap_or_default()
        ))
    })?;
    source
        .parse()
        .map_err(|e| SourceError::Mapping(format!("malformed source properties: {e}")))
}

async fn bounded<T, F>(timeout_ms: u64, call: F) -> Result<T, SourceError>
where
    F: Future<Output = Result<T, SourceError>>,
{
    tokio::time::timeout(Duration::from_millis(timeout_ms), call)
        .await
        .map_err(|_| SourceError::Timeout(timeout_ms))?
}

use super::{bounded, input_override, mapped_inputs, source_properties, Resolved, SourceEnv};
use crate::meta::{DatabaseSource, ResourceAssignment};
use crate::runtime::response::project;
use crate::util::SourceError;
use serde_json::Value;
use tracing::{debug, info};

pub async fn resolve(ra: &ResourceAssignment, env: SourceEnv<'_>) -> Result<Resolved, SourceError> {
    if let Some(resolved) = input_override(ra, &env) {
        debug!(assignment = %ra.name, "database source satisfied from input payload");
        return Ok(resolved);
    }

    let source: DatabaseSource = source_properties(ra, &env)?;
    let params = mapped_inputs(&source.input_key_mapping, env.context)?;
    let executor = env.collaborators.database(source.endpoint_selector.as_deref())?;
    info!(
        assignment = %ra.name,
        query = %source.query,
        params = ?params.keys().collect::<Vec<_>>(),
        "executing database source query"
    );

    let query = executor.query(&source.query, &params);
    let rows = bounded(env.config.database.timeout_ms, query).await?;
    if rows.is_empty() {
        return Err(SourceError::EmptyResult {
            dictionary_name: ra.dictionary_name().to_string(),
            source_name: ra.source().unwrap_or_default().to_string(),
        });
    }

    let response = Value::Array(rows.into_iter().map(Value::Object).collect());
    let value = project(ra, &source.output_key_mapping, &response)?;
    Ok(Resolved { value, key_identifiers: params })
}

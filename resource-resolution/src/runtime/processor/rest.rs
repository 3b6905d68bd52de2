use super::{bounded, input_override, mapped_inputs, source_properties, Resolved, SourceEnv};
use crate::clients::RestRequest;
use crate::meta::{ResourceAssignment, RestSource};
use crate::runtime::response::project;
use crate::util::template::substitute;
use crate::util::SourceError;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

pub async fn resolve(ra: &ResourceAssignment, env: SourceEnv<'_>) -> Result<Resolved, SourceError> {
    if let Some(resolved) = input_override(ra, &env) {
        debug!(assignment = %ra.name, "rest source satisfied from input payload");
        return Ok(resolved);
    }

    let source: RestSource = source_properties(ra, &env)?;
    let params = mapped_inputs(&source.input_key_mapping, env.context)?;
    let bindings: BTreeMap<String, Value> =
        params.iter().map(|(k, v)| (k.clone(), v.clone())).collect();

    let request = RestRequest {
        method: substitute(source.verb.as_deref().unwrap_or("GET"), &bindings),
        url: substitute(&source.url_path, &bindings),
        headers: source
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), substitute(v, &bindings)))
            .collect(),
        body: source.payload.as_deref().map(|p| substitute(p, &bindings)),
    };
    let url = request.url.clone();
    let client = env.collaborators.rest(source.endpoint_selector.as_deref())?;
    info!(assignment = %ra.name, method = %request.method, %url, "calling rest source");

    let response = bounded(env.config.rest.timeout_ms, client.exchange(request)).await?;
    if !response.is_success() || response.body.trim().is_empty() {
        warn!(
            assignment = %ra.name,
            status = response.status,
            %url,
            "rest source returned no usable body"
        );
        return Err(SourceError::Http { url, status: response.status });
    }

    if source.output_key_mapping.is_empty() {
        debug!(assignment = %ra.name, "no output-key-mapping, leaving value unset");
        return Ok(Resolved { value: Value::Null, key_identifiers: params });
    }

    let body: Value = serde_json::from_str(&response.body)
        .map_err(|e| SourceError::Mapping(format!("response from ({url}) is not json: {e}")))?;
    let node = if source.path.trim().is_empty() {
        &body
    } else {
        body.pointer(source.path.trim()).ok_or_else(|| {
            let path = &source.path;
            SourceError::Mapping(format!("path ({path}) not found in response from ({url})"))
        })?
    };
    let value = project(ra, &source.output_key_mapping, node)?;
    Ok(Resolved { value, key_identifiers: params })
}

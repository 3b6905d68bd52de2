use super::{Resolved, SourceEnv};
use crate::meta::{InputSource, ResourceAssignment};
use crate::util::SourceError;
use tracing::debug;

/// Reads `inputs/<name>`, or `inputs/<key>` when the source declares an
/// alternate key.
pub fn resolve(ra: &ResourceAssignment, env: SourceEnv<'_>) -> Result<Resolved, SourceError> {
    let key = env
        .source
        .and_then(|s| s.parse::<InputSource>().ok())
        .and_then(|s| s.key)
        .filter(|k| !k.trim().is_empty())
        .unwrap_or_else(|| ra.name.clone());

    match env.context.input(&key) {
        Some(value) => {
            debug!(assignment = %ra.name, %key, "found value in input payload");
            Ok(Resolved::value(value.clone()))
        }
        None => Err(SourceError::NotFound(key)),
    }
}

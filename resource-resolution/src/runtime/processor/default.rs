use super::{Resolved, SourceEnv};
use crate::meta::ResourceAssignment;
use crate::util::SourceError;

/// The declared default value, taken verbatim. Falls back to the definition's
/// default when the assignment carries no property of its own.
pub fn resolve(ra: &ResourceAssignment, env: SourceEnv<'_>) -> Result<Resolved, SourceError> {
    ra.property
        .as_ref()
        .and_then(|p| p.default_value.as_ref())
        .or_else(|| env.definition.and_then(|d| d.property.default_value.as_ref()))
        .filter(|v| !v.is_null())
        .map(|v| Resolved::value(v.clone()))
        .ok_or_else(|| SourceError::NoDefault(ra.name.clone()))
}

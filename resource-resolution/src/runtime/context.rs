use crate::meta::constants::{NAMESPACE_DICTIONARY, NAMESPACE_INPUTS, NAMESPACE_RESOLVED};
use crate::meta::ResourceAssignment;
use indexmap::IndexMap;
use serde_json::Value;

/// Path-keyed values accumulated during one resolution. Payload fields live
/// under `inputs/`, resolved assignments under `resolved/` and
/// `dictionary/`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionContext {
    values: IndexMap<String, Value>,
}

pub fn path(namespace: &str, key: &str) -> String {
    format!("{namespace}/{key}")
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the payload's `inputs` object, or the payload itself when it
    /// has no such field.
    pub fn from_payload(payload: &Value) -> Self {
        let mut context = Self::new();
        let fields = payload
            .get(NAMESPACE_INPUTS)
            .and_then(Value::as_object)
            .or_else(|| payload.as_object());
        if let Some(fields) = fields {
            for (key, value) in fields {
                context.put(NAMESPACE_INPUTS, key, value.clone());
            }
        }
        context
    }

    pub fn put(&mut self, namespace: &str, key: &str, value: Value) {
        self.values.insert(path(namespace, key), value);
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.values.get(path)
    }

    /// A non-null payload value for `key`.
    pub fn input(&self, key: &str) -> Option<&Value> {
        self.values
            .get(&path(NAMESPACE_INPUTS, key))
            .filter(|v| !v.is_null())
    }

    /// Exact path first, then `resolved/<key>`, then `inputs/<key>`.
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        self.values
            .get(key)
            .or_else(|| self.values.get(&path(NAMESPACE_RESOLVED, key)))
            .or_else(|| self.values.get(&path(NAMESPACE_INPUTS, key)))
            .filter(|v| !v.is_null())
    }

    pub fn record(&mut self, ra: &ResourceAssignment, value: &Value) {
        self.put(NAMESPACE_RESOLVED, &ra.name, value.clone());
        self.put(NAMESPACE_DICTIONARY, ra.dictionary_name(), value.clone());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn snapshot(&self) -> IndexMap<String, Value> {
        self.values.clone()
    }

    pub fn into_inner(self) -> IndexMap<String, Value> {
        self.values
    }
}

/// Assignment name to value, with `${name}` standing in for anything that
/// did not resolve so a template renderer leaves it in place.
pub fn resolved_params(assignments: &[ResourceAssignment]) -> IndexMap<String, Value> {
    assignments
        .iter()
        .map(|ra| {
            let value = match ra.value() {
                Some(v) if ra.is_resolved() && !v.is_null() => v.clone(),
                _ => Value::String(format!("${{{}}}", ra.name)),
            };
            (ra.name.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inputs_object_wins_over_top_level_fields() {
        let context = ResolutionContext::from_payload(&json!({
            "inputs": { "vnf-id": "v-1" },
            "request-id": "r-1"
        }));
        assert_eq!(context.input("vnf-id"), Some(&json!("v-1")));
        assert_eq!(context.input("request-id"), None);
    }

    #[test]
    fn flat_payload_becomes_inputs() {
        let context = ResolutionContext::from_payload(&json!({ "hostname": "h1", "empty": null }));
        assert_eq!(context.get("inputs/hostname"), Some(&json!("h1")));
        assert_eq!(context.input("empty"), None);
        assert!(ResolutionContext::from_payload(&json!("scalar")).is_empty());
    }

    #[test]
    fn lookup_prefers_resolved_over_inputs() {
        let mut context = ResolutionContext::from_payload(&json!({ "vnf-id": "from-input" }));
        assert_eq!(context.lookup("vnf-id"), Some(&json!("from-input")));
        let ra = ResourceAssignment::new("vnf-id").with_dictionary("vnf-id-dict");
        context.record(&ra, &json!("from-db"));
        assert_eq!(context.lookup("vnf-id"), Some(&json!("from-db")));
        assert_eq!(context.lookup("dictionary/vnf-id-dict"), Some(&json!("from-db")));
    }

    #[test]
    fn unresolved_assignments_render_as_placeholders() {
        let mut done = ResourceAssignment::new("a");
        done.set_resolved(Some(json!(42)));
        let mut failed = ResourceAssignment::new("b");
        failed.set_failed("no value");
        let params = resolved_params(&[done, failed, ResourceAssignment::new("c")]);
        assert_eq!(params["a"], json!(42));
        assert_eq!(params["b"], json!("${b}"));
        assert_eq!(params["c"], json!("${c}"));
    }
}

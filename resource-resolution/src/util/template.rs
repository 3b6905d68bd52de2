//! `${key}` / `$key` substitution for url paths, verbs and payloads.

use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// `${key}` or bare `$key`.
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z0-9_.\-]+)\}|\$([A-Za-z_][A-Za-z0-9_\-]*)").unwrap()
});

/// Replaces every placeholder that has a binding. Unbound placeholders are
/// left as-is so a downstream renderer can still see them.
pub fn substitute(content: &str, bindings: &BTreeMap<String, Value>) -> String {
    if !content.contains('$') {
        return content.to_string();
    }
    PLACEHOLDER_RE
        .replace_all(content, |caps: &Captures| {
            let key = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match bindings.get(key) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

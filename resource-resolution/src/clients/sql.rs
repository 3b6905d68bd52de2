use indexmap::IndexMap;
use serde_json::Value;

/// Rewrites `:name` parameters into positional `$n` placeholders and returns
/// the values in bind order. `::type` casts and quoted text are left alone.
/// A name bound twice reuses its first position.
pub fn bind_named(sql: &str, params: &IndexMap<String, Value>) -> (String, Vec<Value>) {
    let mut out = String::with_capacity(sql.len());
    let mut order: Vec<String> = Vec::new();
    let mut chars = sql.chars().peekable();
    let mut in_quote = false;

    while let Some(c) = chars.next() {
        if c == '\'' {
            in_quote = !in_quote;
            out.push(c);
            continue;
        }
        if in_quote || c != ':' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some(':') => {
                out.push_str("::");
                chars.next();
            }
            Some(n) if n.is_ascii_alphabetic() || n == '_' => {
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if n.is_ascii_alphanumeric() || n == '_' {
                        name.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if !params.contains_key(&name) {
                    out.push(':');
                    out.push_str(&name);
                    continue;
                }
                let position = match order.iter().position(|p| *p == name) {
                    Some(p) => p + 1,
                    None => {
                        order.push(name);
                        order.len()
                    }
                };
                out.push('$');
                out.push_str(&position.to_string());
            }
            _ => out.push(c),
        }
    }

    let values = order
        .iter()
        .map(|name| params.get(name).cloned().unwrap_or(Value::Null))
        .collect();
    (out, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, Value)]) -> IndexMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn named_parameters_become_positional() {
        let (sql, values) = bind_named(
            "SELECT hostname FROM vnf WHERE vnf_id = :vnf_id AND region = :region",
            &params(&[("region", json!("eu")), ("vnf_id", json!("v-1"))]),
        );
        assert_eq!(sql, "SELECT hostname FROM vnf WHERE vnf_id = $1 AND region = $2");
        assert_eq!(values, vec![json!("v-1"), json!("eu")]);
    }

    #[test]
    fn casts_and_literals_are_untouched() {
        let (sql, values) = bind_named(
            "SELECT ':skip' AS s, id::text FROM t WHERE a = :a OR b = :a",
            &params(&[("a", json!(3))]),
        );
        assert_eq!(sql, "SELECT ':skip' AS s, id::text FROM t WHERE a = $1 OR b = $1");
        assert_eq!(values, vec![json!(3)]);
    }

    #[test]
    fn unbound_names_stay_in_the_text() {
        let (sql, values) = bind_named("SELECT :missing", &IndexMap::new());
        assert_eq!(sql, "SELECT :missing");
        assert!(values.is_empty());
    }
}

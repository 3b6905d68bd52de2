use super::*;
use crate::util::{ResolutionError, Result};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, info};

fn is_yaml(path: &Path) -> bool {
    matches!(path.extension().and_then(|s| s.to_str()), Some("yaml") | Some("yml"))
}

fn is_catalog_file(path: &Path) -> bool {
    is_yaml(path) || path.extension().and_then(|s| s.to_str()) == Some("json")
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    if is_yaml(path) {
        Ok(serde_yaml::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(&content)?)
    }
}

/// Loads a resource dictionary from either a single map file
/// (`{"<dictionary-name>": {...}}`) or a directory holding one definition
/// per file. Malformed definitions are rejected here, before any
/// resolution is attempted.
pub fn load_dictionary(path: &Path) -> Result<ResourceDictionary> {
    let mut dictionary = if path.is_dir() {
        let mut entries = std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();
        let mut dictionary = ResourceDictionary::new();
        for p in entries.into_iter().filter(|p| is_catalog_file(p)) {
            let definition: ResourceDefinition = read_document(&p)?;
            let stem = p.file_stem().and_then(|s| s.to_str()).map(str::to_string);
            debug!(file = %p.display(), "loaded resource definition");
            let key = if definition.name.trim().is_empty() { stem } else { None };
            dictionary.insert(definition, key.as_deref());
        }
        dictionary
    } else {
        read_document::<ResourceDictionary>(path)?
    };
    dictionary.normalize();

    let problems = dictionary.problems();
    if !problems.is_empty() {
        return Err(ResolutionError::Configuration(problems.join("; ")));
    }
    info!(path = %path.display(), definitions = dictionary.len(), "loaded resource dictionary");
    Ok(dictionary)
}

pub fn load_assignments(path: &Path) -> Result<Vec<ResourceAssignment>> {
    let assignments: Vec<ResourceAssignment> = read_document(path)?;
    info!(path = %path.display(), assignments = assignments.len(), "loaded resource assignments");
    Ok(assignments)
}

pub fn load_payload(path: &Path) -> Result<serde_json::Value> {
    read_document(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(dir: &Path, name: &str, content: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn loads_map_file() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "resources_definition_types.json",
            r#"{"vnf-id": {"property": {"type": "string"}, "sources": {"input": {"type": "source-input"}}}}"#,
        );
        let dict = load_dictionary(&dir.path().join("resources_definition_types.json")).unwrap();
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get("vnf-id").unwrap().first_source(), Some("input"));
    }

    #[test]
    fn loads_directory_of_yaml_definitions() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "hostname.yaml",
            "property:\n  type: string\nsources:\n  default:\n    type: source-default\n",
        );
        write(dir.path(), "notes.txt", "ignored");
        let dict = load_dictionary(dir.path()).unwrap();
        assert_eq!(dict.get("hostname").unwrap().name, "hostname");
    }

    #[test]
    fn map_file_keeps_declared_source_and_mapping_order() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "dict.json",
            r#"{"hostname": {"property": {"type": "string"}, "sources": {
                "primary-db": {"type": "source-primary-db", "properties": {
                    "query": "SELECT z_name, a_name FROM vnf",
                    "output-key-mapping": {"hostname": "z_name", "alias": "a_name"}}},
                "default": {"type": "source-default"}}}}"#,
        );
        let dict = load_dictionary(&dir.path().join("dict.json")).unwrap();
        let definition = dict.get("hostname").unwrap();
        assert_eq!(definition.first_source(), Some("primary-db"));

        let db: DatabaseSource = definition.source("primary-db").unwrap().parse().unwrap();
        let outputs: Vec<&str> = db.output_key_mapping.keys().map(String::as_str).collect();
        assert_eq!(outputs, vec!["hostname", "alias"]);

        let ra = ResourceAssignment::new("hostname").with_property(definition.property.clone());
        let row = serde_json::json!([{ "z_name": "declared-first", "a_name": "declared-second" }]);
        let value = crate::runtime::response::project(&ra, &db.output_key_mapping, &row).unwrap();
        assert_eq!(value, serde_json::json!("declared-first"));
    }

    #[test]
    fn malformed_definition_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "dict.json",
            r#"{"vnf-name": {"property": {"type": "string"}, "sources": {"mdsal": {"type": "source-rest", "properties": {}}}}}"#,
        );
        let err = load_dictionary(&dir.path().join("dict.json")).unwrap_err();
        assert!(matches!(err, ResolutionError::Configuration(msg) if msg.contains("url-path")));
    }
}

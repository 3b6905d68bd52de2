use super::assignment::PropertyDefinition;
use super::constants::SourceKind;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSource {
    #[serde(rename = "type", default)]
    pub r#type: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

impl ResourceSource {
    pub fn of_type(r#type: impl Into<String>) -> Self {
        Self { r#type: r#type.into(), properties: Map::new() }
    }

    pub fn with_properties(mut self, properties: Value) -> Self {
        if let Value::Object(map) = properties {
            self.properties = map;
        }
        self
    }

    pub fn key_dependencies(&self) -> Vec<String> {
        self.properties
            .get("key-dependencies")
            .and_then(Value::as_array)
            .map(|deps| deps.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Reads the source properties into one of the typed shapes below.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.properties.clone()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InputSource {
    pub key: Option<String>,
    #[serde(default)]
    pub key_dependencies: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DatabaseSource {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub input_key_mapping: IndexMap<String, String>,
    #[serde(default)]
    pub output_key_mapping: IndexMap<String, String>,
    #[serde(default)]
    pub key_dependencies: Vec<String>,
    pub endpoint_selector: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RestSource {
    #[serde(default)]
    pub url_path: String,
    #[serde(default)]
    pub path: String,
    pub verb: Option<String>,
    pub payload: Option<String>,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    #[serde(default)]
    pub input_key_mapping: IndexMap<String, String>,
    #[serde(default)]
    pub output_key_mapping: IndexMap<String, String>,
    #[serde(default)]
    pub key_dependencies: Vec<String>,
    pub endpoint_selector: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DictionaryDependency {
    #[serde(default)]
    pub names: Vec<String>,
}

/// Catalog entry describing which sources can supply a dictionary key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResourceDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub property: PropertyDefinition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default)]
    pub sources: IndexMap<String, ResourceSource>,
    #[serde(default, alias = "dependency", skip_serializing_if = "IndexMap::is_empty")]
    pub dependencies: IndexMap<String, DictionaryDependency>,
}

impl ResourceDefinition {
    pub fn first_source(&self) -> Option<&str> {
        self.sources.keys().next().map(String::as_str)
    }

    pub fn source(&self, name: &str) -> Option<&ResourceSource> {
        self.sources.get(name)
    }

    /// Explicit per-source dependency names win over the source's
    /// `key-dependencies` property.
    pub fn dependencies_for(&self, source: &str) -> Option<Vec<String>> {
        if let Some(dependency) = self.dependencies.get(source) {
            return Some(dependency.names.clone());
        }
        let keys = self.sources.get(source)?.key_dependencies();
        (!keys.is_empty()).then_some(keys)
    }

    /// Structural problems that would make a resolution attempt meaningless.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.name.trim().is_empty() {
            problems.push("resource definition has no name".to_string());
        }
        for (source_name, source) in &self.sources {
            let kind = SourceKind::from_name(source_name)
                .or_else(|| SourceKind::from_source_type(&source.r#type));
            match kind {
                Some(SourceKind::Database) => match source.parse::<DatabaseSource>() {
                    Ok(db) if db.query.trim().is_empty() => problems.push(format!(
                        "{} source({}) is missing query",
                        self.name, source_name
                    )),
                    Ok(_) => {}
                    Err(e) => problems.push(format!(
                        "{} source({}) has malformed properties: {}",
                        self.name, source_name, e
                    )),
                },
                Some(SourceKind::Mdsal) => match source.parse::<RestSource>() {
                    Ok(rest) if rest.url_path.trim().is_empty() => problems.push(format!(
                        "{} source({}) is missing url-path",
                        self.name, source_name
                    )),
                    Ok(_) => {}
                    Err(e) => problems.push(format!(
                        "{} source({}) has malformed properties: {}",
                        self.name, source_name, e
                    )),
                },
                _ => {}
            }
        }
        problems
    }
}

/// Resource definitions keyed by dictionary name. Read-only during a
/// resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceDictionary {
    definitions: IndexMap<String, ResourceDefinition>,
}

impl ResourceDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mut definition: ResourceDefinition, key: Option<&str>) {
        let key = key.map(str::to_string).unwrap_or_else(|| definition.name.clone());
        if definition.name.trim().is_empty() {
            definition.name = key.clone();
        }
        self.definitions.insert(key, definition);
    }

    pub fn get(&self, dictionary_name: &str) -> Option<&ResourceDefinition> {
        self.definitions.get(dictionary_name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResourceDefinition)> {
        self.definitions.iter()
    }

    /// Fills in definition names from their keys, so a bare
    /// `{"vnf-id": {...}}` map can be used directly.
    pub fn normalize(&mut self) {
        for (key, definition) in self.definitions.iter_mut() {
            if definition.name.trim().is_empty() {
                definition.name = key.clone();
            }
        }
    }

    pub fn problems(&self) -> Vec<String> {
        self.definitions.values().flat_map(ResourceDefinition::problems).collect()
    }
}

impl FromIterator<ResourceDefinition> for ResourceDictionary {
    fn from_iter<T: IntoIterator<Item = ResourceDefinition>>(iter: T) -> Self {
        let mut dictionary = ResourceDictionary::new();
        for definition in iter {
            dictionary.insert(definition, None);
        }
        dictionary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hostname_definition() -> ResourceDefinition {
        serde_json::from_value(json!({
            "name": "hostname",
            "property": { "type": "string", "default": "host-1" },
            "sources": {
                "default": { "type": "source-default" },
                "db": {
                    "type": "source-db",
                    "properties": {
                        "query": "SELECT hostname FROM vnf WHERE id = :vnf_id",
                        "input-key-mapping": { "vnf_id": "vnf-id" },
                        "output-key-mapping": { "hostname": "hostname" },
                        "key-dependencies": ["vnf-id"]
                    }
                },
                "input": { "type": "source-input" }
            }
        }))
        .unwrap()
    }

    #[test]
    fn first_source_follows_declaration_order() {
        assert_eq!(hostname_definition().first_source(), Some("default"));
    }

    #[test]
    fn key_dependencies_are_read_from_source_properties() {
        let def = hostname_definition();
        assert_eq!(def.dependencies_for("db"), Some(vec!["vnf-id".to_string()]));
        assert_eq!(def.dependencies_for("default"), None);
    }

    #[test]
    fn explicit_dependency_map_wins() {
        let mut def = hostname_definition();
        def.dependencies.insert(
            "db".into(),
            DictionaryDependency { names: vec!["vnf-name".into(), "vnf-id".into()] },
        );
        assert_eq!(def.dependencies_for("db").unwrap().len(), 2);
    }

    #[test]
    fn database_source_without_query_is_a_problem() {
        let mut def = hostname_definition();
        def.sources.insert("primary-db".into(), ResourceSource::of_type("source-primary-db"));
        let problems = def.problems();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("missing query"));
    }

    #[test]
    fn dictionary_normalizes_names_from_keys() {
        let mut dict: ResourceDictionary = serde_json::from_value(json!({
            "vnf-id": { "property": { "type": "string" }, "sources": { "input": { "type": "source-input" } } }
        }))
        .unwrap();
        dict.normalize();
        assert_eq!(dict.get("vnf-id").unwrap().name, "vnf-id");
    }
}

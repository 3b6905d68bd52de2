use crate::meta::constants::SOURCE_INPUT;
use crate::meta::{ResourceAssignment, ResourceDefinition, ResourceDictionary};
use tracing::{debug, info, warn};

/// How an assignment ended up with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Set by the caller and left alone.
    Explicit(String),
    /// First source declared by the resource definition.
    FirstDeclared(String),
    /// No definition, or a definition without sources.
    DefaultInput,
}

/// Binds a source to one assignment. Running it again on the result changes
/// nothing.
pub fn map_source(ra: &mut ResourceAssignment, definition: Option<&ResourceDefinition>) -> Binding {
    if ra.has_blank_dictionary_name() {
        warn!(assignment = %ra.name, "missing dictionary-name, using assignment name");
        ra.dictionary_name = Some(ra.name.clone());
    }

    if let Some(source) = ra.source().map(str::to_string) {
        if ra.dependencies.is_empty() {
            if let Some(deps) = definition.and_then(|d| d.dependencies_for(&source)) {
                debug!(assignment = %ra.name, %source, ?deps, "copied key dependencies");
                ra.dependencies = deps;
            }
        }
        return Binding::Explicit(source);
    }

    let Some((definition, first)) = definition.and_then(|d| d.first_source().map(|s| (d, s.to_string())))
    else {
        ra.dictionary_source = Some(SOURCE_INPUT.to_string());
        return Binding::DefaultInput;
    };

    let property = ra.property.get_or_insert_with(Default::default);
    property.r#type = definition.property.r#type.clone();
    property.default_value = definition.property.default_value.clone();
    property.entry_schema = definition.property.entry_schema.clone();
    if let Some(deps) = definition.dependencies_for(&first) {
        ra.dependencies = deps;
    }
    ra.dictionary_source = Some(first.clone());
    Binding::FirstDeclared(first)
}

/// Auto-maps every assignment of the batch against the dictionary.
pub fn map_sources(assignments: &mut [ResourceAssignment], dictionary: &ResourceDictionary) {
    for ra in assignments.iter_mut() {
        let definition = dictionary.get(ra.dictionary_name());
        match map_source(ra, definition) {
            Binding::Explicit(source) => debug!(assignment = %ra.name, %source, "explicit source"),
            Binding::FirstDeclared(source) => {
                info!(assignment = %ra.name, %source, "mapped first declared source")
            }
            Binding::DefaultInput => {
                info!(assignment = %ra.name, found = definition.is_some(), "no declared sources, mapped input")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{DictionaryDependency, PropertyDefinition, ResourceSource};
    use serde_json::json;

    fn definition(sources: &[(&str, &str)]) -> ResourceDefinition {
        let mut def = ResourceDefinition {
            name: "hostname".into(),
            property: PropertyDefinition {
                default_value: Some(json!("host-1")),
                ..PropertyDefinition::of_type("string")
            },
            ..Default::default()
        };
        for (name, r#type) in sources {
            def.sources.insert(name.to_string(), ResourceSource::of_type(*r#type));
        }
        def
    }

    #[test]
    fn binds_first_declared_source_and_copies_property() {
        let def = definition(&[("default", "source-default"), ("db", "source-db")]);
        let mut ra = ResourceAssignment::new("hostname");
        assert_eq!(map_source(&mut ra, Some(&def)), Binding::FirstDeclared("default".into()));
        assert_eq!(ra.source(), Some("default"));
        let property = ra.property.as_ref().unwrap();
        assert_eq!(property.r#type, "string");
        assert_eq!(property.default_value, Some(json!("host-1")));
    }

    #[test]
    fn mapping_twice_gives_the_same_binding() {
        let def = definition(&[("default", "source-default"), ("db", "source-db")]);
        let mut ra = ResourceAssignment::new("hostname");
        map_source(&mut ra, Some(&def));
        let once = ra.clone();
        map_source(&mut ra, Some(&def));
        assert_eq!(ra.source(), Some("default"));
        assert_eq!(ra, once);
    }

    #[test]
    fn empty_sources_bind_input() {
        let def = definition(&[]);
        let mut ra = ResourceAssignment::new("hostname").with_dictionary("hostname");
        assert_eq!(map_source(&mut ra, Some(&def)), Binding::DefaultInput);
        assert_eq!(ra.source(), Some("input"));
    }

    #[test]
    fn missing_definition_binds_input() {
        let mut ra = ResourceAssignment::new("vnf-id");
        assert_eq!(map_source(&mut ra, None), Binding::DefaultInput);
        assert_eq!(ra.source(), Some("input"));
        assert_eq!(ra.dictionary_name.as_deref(), Some("vnf-id"));
    }

    #[test]
    fn explicit_source_wins() {
        let def = definition(&[("default", "source-default"), ("input", "source-input")]);
        let mut ra = ResourceAssignment::new("hostname").with_source("input");
        assert_eq!(map_source(&mut ra, Some(&def)), Binding::Explicit("input".into()));
        assert_eq!(ra.source(), Some("input"));
        assert!(ra.property.is_none());
    }

    #[test]
    fn dependencies_follow_the_bound_source() {
        let mut def = definition(&[("db", "source-db"), ("default", "source-default")]);
        def.dependencies
            .insert("db".into(), DictionaryDependency { names: vec!["vnf-id".into()] });
        let mut ra = ResourceAssignment::new("hostname");
        map_source(&mut ra, Some(&def));
        assert_eq!(ra.dependencies, vec!["vnf-id".to_string()]);

        let mut explicit = ResourceAssignment::new("hostname").with_source("db");
        map_source(&mut explicit, Some(&def));
        assert_eq!(explicit.dependencies, vec!["vnf-id".to_string()]);

        let mut own = ResourceAssignment::new("hostname")
            .with_source("db")
            .with_dependencies(["vnf-name"]);
        map_source(&mut own, Some(&def));
        assert_eq!(own.dependencies, vec!["vnf-name".to_string()]);
    }
}

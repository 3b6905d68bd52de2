use crate::config::ResolutionConfig;
use crate::meta::constants::KNOWN_SOURCES;
use crate::meta::{ResourceAssignment, SourceKind};
use crate::util::{ResolutionError, Result};
use std::collections::BTreeMap;

/// Source name to processor kind, owned by one resolver. Starts with the
/// fixed source names; tenants may add aliases on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRegistry {
    names: BTreeMap<String, SourceKind>,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        let names = KNOWN_SOURCES
            .iter()
            .filter_map(|name| SourceKind::from_name(name).map(|kind| (name.to_string(), kind)))
            .collect();
        Self { names }
    }
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ResolutionConfig) -> Self {
        config
            .source_aliases
            .iter()
            .fold(Self::default(), |registry, (name, kind)| registry.with_alias(name.clone(), *kind))
    }

    pub fn with_alias(mut self, name: impl Into<String>, kind: SourceKind) -> Self {
        self.names.insert(name.into(), kind);
        self
    }

    pub fn kind_of(&self, source: &str) -> Option<SourceKind> {
        self.names.get(source).copied()
    }

    /// The processor kind for an already mapped assignment.
    pub fn kind_for(&self, ra: &ResourceAssignment) -> Result<SourceKind> {
        let source = ra.source().unwrap_or_default();
        self.kind_of(source).ok_or_else(|| ResolutionError::UnknownSource {
            assignment: ra.name.clone(),
            source_name: source.to_string(),
        })
    }

    /// Every registered source name, sorted.
    pub fn names(&self) -> Vec<String> {
        self.names.keys().cloned().collect()
    }
}

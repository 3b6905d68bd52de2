use crate::meta::SourceKind;
use crate::util::{ResolutionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_FILE: &str = "resolution.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Resolve each ready batch concurrently instead of one by one.
    pub parallel_batches: bool,
    /// Mark a required assignment as failed when its source yields null.
    pub fail_on_required_missing: bool,
    /// Sources whose values are masked in logs.
    pub secret_sources: Vec<String>,
    /// Extra source names, e.g. `tenant-db = "database"`.
    pub source_aliases: BTreeMap<String, SourceKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestConfig {
    pub base_url: Option<String>,
    pub timeout_ms: u64,
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub resolution: ResolutionConfig,
    pub database: DatabaseConfig,
    pub rest: RestConfig,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        ResolutionConfig {
            parallel_batches: false,
            fail_on_required_missing: true,
            secret_sources: Vec::new(),
            source_aliases: BTreeMap::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            url: None,
            max_connections: 5,
            timeout_ms: 30_000,
        }
    }
}

impl Default for RestConfig {
    fn default() -> Self {
        RestConfig {
            base_url: None,
            timeout_ms: 30_000,
            headers: BTreeMap::new(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| ResolutionError::Configuration(format!("invalid value for {key}: {raw}")))
}

impl EngineConfig {
    /// Loads the given file (or `resolution.toml` in the working directory)
    /// and applies environment overrides. A missing file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let mut config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            EngineConfig::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Override order: `RESOLUTION_DB_URL` beats `DATABASE_URL`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("RESOLUTION_PARALLEL_BATCHES") {
            self.resolution.parallel_batches = parse_env("RESOLUTION_PARALLEL_BATCHES", &raw)?;
        }
        if let Some(url) = lookup("RESOLUTION_DB_URL").or_else(|| lookup("DATABASE_URL")) {
            self.database.url = Some(url);
        }
        if let Some(raw) = lookup("RESOLUTION_DB_TIMEOUT_MS") {
            self.database.timeout_ms = parse_env("RESOLUTION_DB_TIMEOUT_MS", &raw)?;
        }
        if let Some(url) = lookup("RESOLUTION_REST_BASE_URL") {
            self.rest.base_url = Some(url);
        }
        if let Some(raw) = lookup("RESOLUTION_REST_TIMEOUT_MS") {
            self.rest.timeout_ms = parse_env("RESOLUTION_REST_TIMEOUT_MS", &raw)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert!(!config.resolution.parallel_batches);
        assert!(config.resolution.fail_on_required_missing);
        assert_eq!(config.database.timeout_ms, 30_000);
        assert_eq!(config.rest.timeout_ms, 30_000);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resolution.toml");
        fs::write(
            &path,
            r#"
[resolution]
parallel_batches = true
secret_sources = ["primary-db"]

[resolution.source_aliases]
tenant-db = "database"

[rest]
base_url = "http://sdnc:8282"
"#,
        )
        .unwrap();

        let config = EngineConfig::load_from_file(&path).unwrap();
        assert!(config.resolution.parallel_batches);
        assert!(config.resolution.fail_on_required_missing);
        assert_eq!(config.resolution.source_aliases.get("tenant-db"), Some(&SourceKind::Database));
        assert_eq!(config.rest.base_url.as_deref(), Some("http://sdnc:8282"));
        assert_eq!(config.database, DatabaseConfig::default());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.resolution.secret_sources, Vec::<String>::new());
        assert!(config.resolution.source_aliases.is_empty());
        assert!(EngineConfig::load_from_file(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn overrides_take_precedence() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("RESOLUTION_PARALLEL_BATCHES", "true"),
            ("DATABASE_URL", "postgres://fallback"),
            ("RESOLUTION_DB_URL", "postgres://primary"),
            ("RESOLUTION_REST_TIMEOUT_MS", "500"),
        ]);
        let mut config = EngineConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert!(config.resolution.parallel_batches);
        assert_eq!(config.database.url.as_deref(), Some("postgres://primary"));
        assert_eq!(config.rest.timeout_ms, 500);
    }

    #[test]
    fn bad_override_is_a_configuration_error() {
        let mut config = EngineConfig::default();
        let err = config
            .apply_overrides(|key| (key == "RESOLUTION_DB_TIMEOUT_MS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ResolutionError::Configuration(_)));
    }
}

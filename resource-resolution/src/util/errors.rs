use thiserror::Error;

/// Structural and configuration failures. Any of these aborts the whole
/// resolution before (or instead of) dispatching a source processor.
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("resource assignment validation failed: {0}")]
    Validation(String),
    #[error("cyclic dependency: {0}")]
    CyclicDependency(String),
    #[error("unknown source ({source_name}) for assignment ({assignment})")]
    UnknownSource { assignment: String, source_name: String },
    #[error("couldn't get resource definition {dictionary_name} source({source_name}) for assignment ({assignment})")]
    MissingDefinition {
        assignment: String,
        dictionary_name: String,
        source_name: String,
    },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

/// Per-assignment failures. These are recorded on the assignment and never
/// propagated out of the resolver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("no value for ({0}) in input payload")]
    NotFound(String),
    #[error("empty result for dictionary name ({dictionary_name}) from source ({source_name})")]
    EmptyResult {
        dictionary_name: String,
        source_name: String,
    },
    #[error("request to ({url}) failed with response code ({status})")]
    Http { url: String, status: u16 },
    #[error("source call timed out after {0} ms")]
    Timeout(u64),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("response mapping failed: {0}")]
    Mapping(String),
    #[error("input-key-mapping references unresolved key ({0})")]
    MissingInputKey(String),
    #[error("no default value declared for ({0})")]
    NoDefault(String),
}

pub type Result<T, E = ResolutionError> = std::result::Result<T, E>;

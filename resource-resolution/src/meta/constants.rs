use serde::{Deserialize, Serialize};

pub const SOURCE_INPUT: &str = "input";
pub const SOURCE_DEFAULT: &str = "default";
pub const SOURCE_DB: &str = "db";
pub const SOURCE_PRIMARY_DB: &str = "primary-db";
pub const SOURCE_MDSAL: &str = "mdsal";
pub const SOURCE_REST: &str = "rest";

pub const KNOWN_SOURCES: [&str; 6] = [
    SOURCE_INPUT,
    SOURCE_DEFAULT,
    SOURCE_DB,
    SOURCE_PRIMARY_DB,
    SOURCE_MDSAL,
    SOURCE_REST,
];

pub const NAMESPACE_INPUTS: &str = "inputs";
pub const NAMESPACE_RESOLVED: &str = "resolved";
pub const NAMESPACE_DICTIONARY: &str = "dictionary";

pub const USER_SYSTEM: &str = "System";
pub const SECRET_MASK: &str = "*****";

/// The closed set of processor variants a source name can dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Input,
    Default,
    Database,
    Mdsal,
}

impl SourceKind {
    /// Exact, case-sensitive match against the fixed source-name constants.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            SOURCE_INPUT => Some(SourceKind::Input),
            SOURCE_DEFAULT => Some(SourceKind::Default),
            SOURCE_DB | SOURCE_PRIMARY_DB => Some(SourceKind::Database),
            SOURCE_MDSAL | SOURCE_REST => Some(SourceKind::Mdsal),
            _ => None,
        }
    }

    /// Maps a catalog `type` such as `source-db` or `source-rest`.
    pub fn from_source_type(source_type: &str) -> Option<Self> {
        let name = source_type.strip_prefix("source-").unwrap_or(source_type);
        match name {
            "processor-db" => Some(SourceKind::Database),
            other => Self::from_name(other),
        }
    }

    pub fn is_remote(self) -> bool {
        matches!(self, SourceKind::Database | SourceKind::Mdsal)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SourceKind::Input => "input",
            SourceKind::Default => "default",
            SourceKind::Database => "database",
            SourceKind::Mdsal => "mdsal",
        };
        f.write_str(name)
    }
}

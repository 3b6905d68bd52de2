pub mod clients;
pub mod config;
pub mod ir;
pub mod meta;
pub mod planner;
pub mod runtime;
pub mod util;

pub use clients::{Collaborators, QueryExecutor, RestClient};
pub use config::EngineConfig;
pub use meta::{ResourceAssignment, ResourceDefinition, ResourceDictionary, SourceKind};
pub use runtime::{ResolutionOutcome, Resolver, SourceRegistry};
pub use util::{ResolutionError, SourceError};

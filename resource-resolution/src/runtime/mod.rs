pub mod context;
pub mod orchestrator;
pub mod processor;
pub mod registry;
pub mod response;

pub use context::{resolved_params, ResolutionContext};
pub use orchestrator::{ResolutionOutcome, ResolutionPlan, Resolver};
pub use processor::{dispatch, Resolved, SourceEnv};
pub use registry::SourceRegistry;

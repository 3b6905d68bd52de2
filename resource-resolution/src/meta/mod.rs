pub mod assignment;
pub mod constants;
pub mod definition;
pub mod loader;

pub use assignment::*;
pub use constants::SourceKind;
pub use definition::*;
pub use loader::*;

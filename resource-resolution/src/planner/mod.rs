pub mod mapping;
pub mod sequence;
pub mod validate;

pub use mapping::{map_source, map_sources, Binding};
pub use sequence::{sequence, Sequence};
pub use validate::{batch_problems, validate_batch};

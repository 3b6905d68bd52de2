pub mod errors;
pub mod template;

pub use errors::*;

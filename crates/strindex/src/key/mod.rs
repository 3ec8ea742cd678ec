mod collection;
mod types;

pub use collection::*;
pub use types::*;
pub(crate) use types::validate_string;

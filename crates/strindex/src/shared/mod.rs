mod indexer;
mod strings;

pub use indexer::*;
pub use strings::*;

mod fetch_type;
mod result_set;

pub use fetch_type::*;
pub use result_set::*;

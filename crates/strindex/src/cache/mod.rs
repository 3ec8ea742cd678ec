mod caching;
mod interface;
mod memory;

pub use caching::*;
pub use interface::*;
pub use memory::*;

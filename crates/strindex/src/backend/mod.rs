mod interface;
mod memory;
#[cfg(test)]
mod tests;

pub use interface::*;
pub use memory::*;

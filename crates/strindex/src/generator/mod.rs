mod atomic;
mod id;
mod interface;
#[cfg(test)]
mod tests;

pub use atomic::*;
pub use id::*;
pub use interface::*;

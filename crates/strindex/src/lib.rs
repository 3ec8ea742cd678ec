#![doc = include_str!("../README.md")]

mod backend;
mod cache;
mod error;
mod generator;
mod indexer;
mod key;
mod mutex;
mod result;
mod shared;

pub use crate::backend::*;
pub use crate::cache::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::indexer::*;
pub use crate::key::*;
pub use crate::result::*;
pub use crate::shared::*;

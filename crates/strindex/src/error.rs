//! Error types for the string index.
//!
//! Every fallible operation in this crate returns [`Error`]. The variants
//! separate caller mistakes (`InvalidKey`, `Unsupported`) from broken
//! allocator invariants (`DuplicateKey`, `ConflictingMapping`,
//! `IncompleteBatch`) and from failures of the durable store itself
//! (`Store`), which are passed through without interpretation.

use core::fmt;
use std::sync::Arc;

use crate::{Id, ResolutionKey};

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Opaque failure raised by a durable store client.
pub type StoreError = Arc<dyn core::error::Error + Send + Sync + 'static>;

/// All error variants the index can emit.
#[derive(Clone, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The request was malformed (empty string, negative org id, unknown
    /// use-case). Raised before any I/O and never worth retrying.
    #[error("invalid key: {reason}")]
    InvalidKey { reason: String },

    /// The same key was recorded twice in one result set with different ids.
    #[error("duplicate key {key}: already bound to {existing}, attempted {attempted}")]
    DuplicateKey {
        key: ResolutionKey,
        existing: Id,
        attempted: Id,
    },

    /// Two sources disagree about a mapping: one key with two ids, or one id
    /// with two keys. The allocator's uniqueness invariant is broken.
    #[error("conflicting mapping: {reason}")]
    ConflictingMapping { reason: String },

    /// A shared-org operation was invoked on a backend without that layer.
    #[error("unsupported operation `{operation}`: wrap the backend in a SharedOrgIndexer")]
    Unsupported { operation: &'static str },

    /// A backend resolved fewer keys than it was asked to allocate.
    #[error("backend left {missing} key(s) unresolved")]
    IncompleteBatch { missing: usize },

    /// The id sequence cannot mint another value.
    #[error("id space exhausted")]
    IdSpaceExhausted,

    /// The operation failed because a lock was poisoned.
    ///
    /// This occurs when a thread panics while holding the lock. When the
    /// `parking-lot` feature is enabled, mutexes do not poison, so this
    /// variant is not available.
    #[cfg(not(feature = "parking-lot"))]
    #[error("lock poisoned")]
    LockPoisoned,

    /// Transport or availability failure from the durable store.
    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

impl Error {
    pub(crate) fn invalid_key(reason: impl fmt::Display) -> Self {
        Self::InvalidKey {
            reason: reason.to_string(),
        }
    }

    pub(crate) fn conflict(reason: impl fmt::Display) -> Self {
        Self::ConflictingMapping {
            reason: reason.to_string(),
        }
    }

    /// Wraps a store client failure so it can cross the [`crate::Indexer`]
    /// seam unchanged.
    pub fn store<E>(err: E) -> Self
    where
        E: core::error::Error + Send + Sync + 'static,
    {
        Self::Store(Arc::new(err))
    }
}

#[cfg(not(feature = "parking-lot"))]
use crate::mutex::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}

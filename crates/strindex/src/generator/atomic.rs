use core::num::NonZeroU64;

use portable_atomic::{AtomicU64, Ordering};

use crate::{Error, Id, IdSequence, Result};

/// The first id minted by a fresh sequence. Values below it are left free for
/// statically reserved strings (see [`crate::SharedStrings`]).
pub const DEFAULT_FIRST_ID: u64 = 10_000;

/// Sentinel stored once the sequence has handed out `u64::MAX`.
const EXHAUSTED: u64 = 0;

/// A lock-free id sequence.
///
/// The next value lives in an [`AtomicU64`] and is advanced with a
/// compare-and-swap loop, so concurrent callers never observe the same id.
/// Zero is never minted; it marks exhaustion.
#[derive(Debug)]
pub struct AtomicSequence {
    next: AtomicU64,
}

impl AtomicSequence {
    /// Creates a sequence starting at [`DEFAULT_FIRST_ID`].
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(DEFAULT_FIRST_ID),
        }
    }

    /// Creates a sequence whose first id is `first`.
    pub fn starting_at(first: NonZeroU64) -> Self {
        Self {
            next: AtomicU64::new(first.get()),
        }
    }
}

impl Default for AtomicSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSequence for AtomicSequence {
    fn next_id(&self) -> Result<Id> {
        let minted = self
            .next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != EXHAUSTED).then(|| current.checked_add(1).unwrap_or(EXHAUSTED))
            })
            .map_err(|_| Error::IdSpaceExhausted)?;
        Ok(Id::new(minted))
    }

    fn peek(&self) -> Option<Id> {
        match self.next.load(Ordering::Acquire) {
            EXHAUSTED => None,
            next => Some(Id::new(next)),
        }
    }
}

use crate::{Id, Result};

/// A source of never-repeating, monotonically increasing ids.
///
/// A single sequence must back every use-case and organization of an index,
/// which is what makes minted ids globally unique.
pub trait IdSequence: Send + Sync {
    /// Returns the next unused id.
    ///
    /// # Errors
    /// - [`crate::Error::IdSpaceExhausted`] once the sequence cannot advance.
    fn next_id(&self) -> Result<Id>;

    /// The id the next call to [`Self::next_id`] would return, if any.
    fn peek(&self) -> Option<Id>;
}

use crate::{Id, KeyCollection, Result, ResultSet};

/// A read-through cache consulted before the backend.
///
/// The forward direction is keyed by `(use_case, org_id, string)` and the
/// reverse direction by id alone. Eviction is the implementation's business;
/// a miss is always safe because the backend stays authoritative.
pub trait Cache: Send + Sync {
    /// Returns the cached ids for whichever keys are present, tagged
    /// [`crate::FetchType::CacheHit`]. Misses are simply absent.
    fn get_many(&self, keys: &KeyCollection) -> Result<ResultSet>;

    /// Stores every forward and reverse mapping in `results`.
    fn set_many(&self, results: &ResultSet) -> Result<()>;

    fn get_string(&self, id: Id) -> Result<Option<String>>;

    fn set_string(&self, id: Id, string: &str) -> Result<()>;
}

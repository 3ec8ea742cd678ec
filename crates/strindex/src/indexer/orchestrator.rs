#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{Error, Id, Indexer, KeyCollection, OrgId, ResolutionKey, Result, ResultSet, UseCase};

/// Caller-facing entry point: resolves strings to ids, minting ids for
/// strings never seen before.
///
/// Every resolution runs the same two-phase protocol against the wrapped
/// [`Indexer`]:
///
/// 1. **Read**: `lookup_batch` on the full request.
/// 2. **Remainder**: subtract what the read phase resolved. If nothing is
///    left the read results are returned as is.
/// 3. **Allocate**: `allocate_batch` on the remainder.
/// 4. **Merge**: union the two result sets and check every requested key is
///    present.
///
/// Single-key calls are the batch path on a one-element collection. The
/// orchestrator holds no locks and does not retry; races are settled by the
/// backend's atomic get-or-create, and store failures propagate unchanged.
///
/// # Example
/// ```
/// use strindex::{MemoryIndexer, StringIndexer, UseCase};
///
/// let indexer = StringIndexer::new(MemoryIndexer::new());
/// let id = indexer.record(UseCase::Transactions, 1u64, "latency_ms").unwrap();
///
/// assert_eq!(indexer.record(UseCase::Transactions, 1u64, "latency_ms").unwrap(), id);
/// assert_eq!(
///     indexer.reverse_resolve(UseCase::Transactions, 1u64, id).unwrap().as_deref(),
///     Some("latency_ms"),
/// );
/// ```
#[derive(Debug, Default)]
pub struct StringIndexer<I> {
    backend: I,
}

impl<I> StringIndexer<I>
where
    I: Indexer,
{
    pub fn new(backend: I) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &I {
        &self.backend
    }

    pub fn into_backend(self) -> I {
        self.backend
    }

    /// Resolves every `org -> strings` pair under one use-case.
    ///
    /// The returned [`ResultSet`] carries each id and its provenance;
    /// [`ResultSet::mapping`] turns it into `org -> string -> id`.
    ///
    /// # Errors
    /// - [`Error::InvalidKey`] if a string is empty. No backend call is made.
    /// - Any error from the backend, unchanged.
    pub fn bulk_record<O, S, T>(&self, use_case: UseCase, org_strings: T) -> Result<ResultSet>
    where
        T: IntoIterator<Item = (O, S)>,
        O: Into<OrgId>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        let keys = KeyCollection::from_org_strings(use_case, org_strings)?;
        self.bulk_record_keys(&keys)
    }

    /// Runs the read-then-allocate protocol on a collection that may span
    /// several use-cases.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all, fields(keys = keys.size())))]
    pub fn bulk_record_keys(&self, keys: &KeyCollection) -> Result<ResultSet> {
        if keys.is_empty() {
            return Ok(ResultSet::new());
        }

        let read = self.backend.lookup_batch(keys)?;
        let remaining = keys.subtract(&read);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            resolved = read.len(),
            remaining = remaining.size(),
            "read phase complete"
        );

        if remaining.is_empty() {
            return Ok(read);
        }

        let allocated = self.backend.allocate_batch(&remaining)?;
        let merged = read.merge(&allocated)?;

        let missing = keys.subtract(&merged).size();
        if missing > 0 {
            return Err(Error::IncompleteBatch { missing });
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            counts = ?merged.fetch_type_counts(),
            "allocate phase complete"
        );

        Ok(merged)
    }

    /// Resolves one string, minting an id if it has never been seen.
    pub fn record(
        &self,
        use_case: UseCase,
        org_id: impl Into<OrgId>,
        string: &str,
    ) -> Result<Id> {
        let key = ResolutionKey::new(use_case, org_id, string)?;
        let org_id = key.org_id();
        let results = self.bulk_record_keys(&KeyCollection::from_iter([key]))?;
        results
            .get(use_case, org_id, string)
            .ok_or(Error::IncompleteBatch { missing: 1 })
    }

    /// Looks up one string without allocating.
    pub fn resolve(
        &self,
        use_case: UseCase,
        org_id: impl Into<OrgId>,
        string: &str,
    ) -> Result<Option<Id>> {
        let key = ResolutionKey::new(use_case, org_id, string)?;
        let org_id = key.org_id();
        let results = self
            .backend
            .lookup_batch(&KeyCollection::from_iter([key]))?;
        Ok(results.get(use_case, org_id, string))
    }

    /// Returns the string an id was minted for.
    ///
    /// Ids are globally unique, so the backend is asked by id alone; the
    /// use-case and org only document the caller's scope.
    pub fn reverse_resolve(
        &self,
        _use_case: UseCase,
        _org_id: impl Into<OrgId>,
        id: Id,
    ) -> Result<Option<String>> {
        self.backend.reverse_resolve(id)
    }

    /// See [`Indexer::resolve_shared_org`].
    pub fn resolve_shared_org(&self, string: &str) -> Result<Option<Id>> {
        self.backend.resolve_shared_org(string)
    }

    /// See [`Indexer::reverse_shared_org_resolve`].
    pub fn reverse_shared_org_resolve(&self, id: Id) -> Result<Option<String>> {
        self.backend.reverse_shared_org_resolve(id)
    }
}

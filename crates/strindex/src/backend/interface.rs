use std::sync::Arc;

use crate::{Error, Id, KeyCollection, OrgId, Result, ResultSet, UseCase};

/// The authoritative allocator behind a [`crate::StringIndexer`].
///
/// This is the seam where a durable store is substituted for
/// [`crate::MemoryIndexer`]. Implementations are shared by many callers at
/// once and must not assume exclusive access to the store.
///
/// Batch methods either cover every input triple or fail as a whole.
pub trait Indexer: Send + Sync {
    /// Returns the existing mapping for each requested triple.
    ///
    /// Triples without a mapping are absent from the result; that is not an
    /// error.
    fn lookup_batch(&self, keys: &KeyCollection) -> Result<ResultSet>;

    /// Atomically gets or creates a mapping for each triple.
    ///
    /// A mapping created by another caller since the read phase must be
    /// returned as is, never re-minted. Newly minted ids must be written to
    /// the forward and reverse tables together, and re-running a batch after
    /// a partial failure must return the ids minted the first time.
    fn allocate_batch(&self, keys: &KeyCollection) -> Result<ResultSet>;

    /// Single-key read. Never allocates.
    fn resolve(&self, use_case: UseCase, org_id: OrgId, string: &str) -> Result<Option<Id>>;

    /// Single-key reverse read.
    fn reverse_resolve(&self, id: Id) -> Result<Option<String>>;

    /// Resolves a string in the cross-tenant shared namespace.
    ///
    /// # Errors
    /// - [`Error::Unsupported`] unless the backend is wrapped in a
    ///   [`crate::SharedOrgIndexer`].
    fn resolve_shared_org(&self, _string: &str) -> Result<Option<Id>> {
        Err(Error::Unsupported {
            operation: "resolve_shared_org",
        })
    }

    /// Reverse of [`Self::resolve_shared_org`].
    ///
    /// # Errors
    /// - [`Error::Unsupported`] unless the backend is wrapped in a
    ///   [`crate::SharedOrgIndexer`].
    fn reverse_shared_org_resolve(&self, _id: Id) -> Result<Option<String>> {
        Err(Error::Unsupported {
            operation: "reverse_shared_org_resolve",
        })
    }
}

macro_rules! forward_indexer {
    ($($ptr:ty),+ $(,)?) => {$(
        impl<T: Indexer + ?Sized> Indexer for $ptr {
            fn lookup_batch(&self, keys: &KeyCollection) -> Result<ResultSet> {
                (**self).lookup_batch(keys)
            }

            fn allocate_batch(&self, keys: &KeyCollection) -> Result<ResultSet> {
                (**self).allocate_batch(keys)
            }

            fn resolve(&self, use_case: UseCase, org_id: OrgId, string: &str) -> Result<Option<Id>> {
                (**self).resolve(use_case, org_id, string)
            }

            fn reverse_resolve(&self, id: Id) -> Result<Option<String>> {
                (**self).reverse_resolve(id)
            }

            fn resolve_shared_org(&self, string: &str) -> Result<Option<Id>> {
                (**self).resolve_shared_org(string)
            }

            fn reverse_shared_org_resolve(&self, id: Id) -> Result<Option<String>> {
                (**self).reverse_shared_org_resolve(id)
            }
        }
    )+};
}

forward_indexer!(&T, Box<T>, Arc<T>);

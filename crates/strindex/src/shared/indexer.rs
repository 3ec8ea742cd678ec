use crate::{Id, Indexer, KeyCollection, OrgId, Result, ResultSet, SharedStrings, UseCase};

/// An [`Indexer`] decorator that adds the cross-tenant shared namespace.
///
/// Only [`Indexer::resolve_shared_org`] and
/// [`Indexer::reverse_shared_org_resolve`] are answered here, from a
/// [`SharedStrings`] table. Org-scoped calls reach the inner indexer
/// unchanged, so per-org ids are never replaced by shared ones.
#[derive(Debug)]
pub struct SharedOrgIndexer<I> {
    inner: I,
    shared: SharedStrings,
}

impl<I> SharedOrgIndexer<I>
where
    I: Indexer,
{
    pub fn new(inner: I, shared: SharedStrings) -> Self {
        Self { inner, shared }
    }

    pub fn inner(&self) -> &I {
        &self.inner
    }

    pub fn shared(&self) -> &SharedStrings {
        &self.shared
    }
}

impl<I> Indexer for SharedOrgIndexer<I>
where
    I: Indexer,
{
    fn lookup_batch(&self, keys: &KeyCollection) -> Result<ResultSet> {
        self.inner.lookup_batch(keys)
    }

    fn allocate_batch(&self, keys: &KeyCollection) -> Result<ResultSet> {
        self.inner.allocate_batch(keys)
    }

    fn resolve(&self, use_case: UseCase, org_id: OrgId, string: &str) -> Result<Option<Id>> {
        self.inner.resolve(use_case, org_id, string)
    }

    fn reverse_resolve(&self, id: Id) -> Result<Option<String>> {
        self.inner.reverse_resolve(id)
    }

    fn resolve_shared_org(&self, string: &str) -> Result<Option<Id>> {
        Ok(self.shared.get(string))
    }

    fn reverse_shared_org_resolve(&self, id: Id) -> Result<Option<String>> {
        Ok(self.shared.get_by_id(id).map(str::to_owned))
    }
}

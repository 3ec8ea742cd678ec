#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Cache, FetchType, Id, Indexer, KeyCollection, OrgId, ResolutionKey, Result, ResultSet, UseCase,
};

/// An [`Indexer`] decorator that answers from a [`Cache`] first.
///
/// Cache hits come back tagged [`crate::FetchType::CacheHit`]. Misses go to
/// the inner indexer, keep the inner indexer's provenance, and are written
/// back to the cache.
#[derive(Debug)]
pub struct CachingIndexer<I, C> {
    inner: I,
    cache: C,
}

impl<I, C> CachingIndexer<I, C>
where
    I: Indexer,
    C: Cache,
{
    pub fn new(inner: I, cache: C) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &I {
        &self.inner
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }
}

impl<I, C> Indexer for CachingIndexer<I, C>
where
    I: Indexer,
    C: Cache,
{
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip_all, fields(keys = keys.size())))]
    fn lookup_batch(&self, keys: &KeyCollection) -> Result<ResultSet> {
        let hits = self.cache.get_many(keys)?;
        let misses = keys.subtract(&hits);

        #[cfg(feature = "tracing")]
        tracing::trace!(hits = hits.len(), misses = misses.size(), "cache lookup");

        if misses.is_empty() {
            return Ok(hits);
        }
        let found = self.inner.lookup_batch(&misses)?;
        self.cache.set_many(&found)?;
        hits.merge(&found)
    }

    fn allocate_batch(&self, keys: &KeyCollection) -> Result<ResultSet> {
        let allocated = self.inner.allocate_batch(keys)?;
        self.cache.set_many(&allocated)?;
        Ok(allocated)
    }

    fn resolve(&self, use_case: UseCase, org_id: OrgId, string: &str) -> Result<Option<Id>> {
        let key = ResolutionKey::new(use_case, org_id, string)?;
        let hits = self.cache.get_many(&KeyCollection::from_iter([key]))?;
        if let Some(id) = hits.get(use_case, org_id, string) {
            return Ok(Some(id));
        }
        let id = self.inner.resolve(use_case, org_id, string)?;
        if let Some(id) = id {
            let mut found = ResultSet::new();
            found.add(use_case, org_id, string, id, FetchType::DbRead)?;
            self.cache.set_many(&found)?;
        }
        Ok(id)
    }

    fn reverse_resolve(&self, id: Id) -> Result<Option<String>> {
        if let Some(string) = self.cache.get_string(id)? {
            return Ok(Some(string));
        }
        let string = self.inner.reverse_resolve(id)?;
        if let Some(string) = &string {
            self.cache.set_string(id, string)?;
        }
        Ok(string)
    }

    fn resolve_shared_org(&self, string: &str) -> Result<Option<Id>> {
        self.inner.resolve_shared_org(string)
    }

    fn reverse_shared_org_resolve(&self, id: Id) -> Result<Option<String>> {
        self.inner.reverse_shared_org_resolve(id)
    }
}

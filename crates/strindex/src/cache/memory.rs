use std::collections::HashMap;

use crate::{
    Cache, FetchType, Id, KeyCollection, ResolutionKey, Result, ResultSet,
    mutex::{Mutex, lock},
};

#[derive(Debug, Default)]
struct Entries {
    ids: HashMap<ResolutionKey, Id>,
    strings: HashMap<Id, String>,
}

/// An unbounded in-process [`Cache`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<Entries>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached forward entries.
    pub fn len(&self) -> Result<usize> {
        let entries = lock!(self.entries);
        Ok(entries.ids.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|len| len == 0)
    }
}

impl Cache for MemoryCache {
    fn get_many(&self, keys: &KeyCollection) -> Result<ResultSet> {
        let entries = lock!(self.entries);
        let mut hits = ResultSet::new();
        for key in keys.keys() {
            if let Some(&id) = entries.ids.get(&key) {
                let (use_case, org_id, string) = key.into_parts();
                hits.add(use_case, org_id, string, id, FetchType::CacheHit)?;
            }
        }
        Ok(hits)
    }

    fn set_many(&self, results: &ResultSet) -> Result<()> {
        let mut entries = lock!(self.entries);
        for result in results.results() {
            entries.strings.insert(result.id(), result.key().string().to_owned());
            entries.ids.insert(result.key().clone(), result.id());
        }
        Ok(())
    }

    fn get_string(&self, id: Id) -> Result<Option<String>> {
        let entries = lock!(self.entries);
        Ok(entries.strings.get(&id).cloned())
    }

    fn set_string(&self, id: Id, string: &str) -> Result<()> {
        let mut entries = lock!(self.entries);
        entries.strings.insert(id, string.to_owned());
        Ok(())
    }
}

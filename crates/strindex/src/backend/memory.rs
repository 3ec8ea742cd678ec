use core::num::NonZeroU64;
use std::collections::{BTreeMap, HashMap};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    AtomicSequence, Error, FetchType, Id, IdSequence, Indexer, KeyCollection, OrgId, Result,
    ResultSet, UseCase,
    key::validate_string,
    mutex::{Mutex, lock},
};

/// Forward (`use_case -> org -> string -> id`) and reverse (`id -> string`)
/// tables. Only [`Tables::get_or_insert_with`] writes to them, and it writes
/// both sides at once.
#[derive(Debug, Default)]
struct Tables {
    forward: BTreeMap<UseCase, BTreeMap<OrgId, HashMap<String, Id>>>,
    reverse: HashMap<Id, String>,
}

impl Tables {
    fn get(&self, use_case: UseCase, org_id: OrgId, string: &str) -> Option<Id> {
        self.forward
            .get(&use_case)?
            .get(&org_id)?
            .get(string)
            .copied()
    }

    /// Returns the existing id for the key, or binds a freshly minted one.
    ///
    /// The boolean is `true` when `mint` was called. A minted id that is
    /// already in the reverse table means the sequence repeated itself and
    /// nothing is written.
    fn get_or_insert_with(
        &mut self,
        use_case: UseCase,
        org_id: OrgId,
        string: &str,
        mint: impl FnOnce() -> Result<Id>,
    ) -> Result<(Id, bool)> {
        let strings = self
            .forward
            .entry(use_case)
            .or_default()
            .entry(org_id)
            .or_default();
        if let Some(&id) = strings.get(string) {
            return Ok((id, false));
        }

        let id = mint()?;
        if let Some(bound) = self.reverse.get(&id) {
            return Err(Error::conflict(format_args!(
                "sequence reissued id {id} (bound to {bound:?}) for {string:?}"
            )));
        }
        strings.insert(string.to_owned(), id);
        self.reverse.insert(id, string.to_owned());
        Ok((id, true))
    }
}

/// An in-process reference backend.
///
/// All use-cases and organizations draw from one [`IdSequence`], which is what
/// makes ids globally unique. Every batch runs under a single table lock, so a
/// get-or-create can never interleave with another caller's.
///
/// Intended for tests and local tooling. Nothing is persisted.
#[derive(Debug)]
pub struct MemoryIndexer<S = AtomicSequence> {
    tables: Mutex<Tables>,
    sequence: S,
}

impl MemoryIndexer {
    /// Creates an empty backend minting from [`crate::DEFAULT_FIRST_ID`].
    pub fn new() -> Self {
        Self::with_sequence(AtomicSequence::new())
    }

    /// Creates an empty backend whose first minted id is `first`.
    pub fn with_first_id(first: NonZeroU64) -> Self {
        Self::with_sequence(AtomicSequence::starting_at(first))
    }
}

impl Default for MemoryIndexer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> MemoryIndexer<S>
where
    S: IdSequence,
{
    pub fn with_sequence(sequence: S) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            sequence,
        }
    }

    /// Number of keys stored across every scope.
    pub fn len(&self) -> Result<usize> {
        let tables = lock!(self.tables);
        Ok(tables.reverse.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|len| len == 0)
    }
}

impl<S> Indexer for MemoryIndexer<S>
where
    S: IdSequence,
{
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip_all, fields(keys = keys.size())))]
    fn lookup_batch(&self, keys: &KeyCollection) -> Result<ResultSet> {
        let tables = lock!(self.tables);
        let mut results = ResultSet::new();
        for (use_case, org_id, string) in keys.as_triples() {
            if let Some(id) = tables.get(use_case, org_id, string) {
                results.add(use_case, org_id, string, id, FetchType::DbRead)?;
            }
        }
        Ok(results)
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip_all, fields(keys = keys.size())))]
    fn allocate_batch(&self, keys: &KeyCollection) -> Result<ResultSet> {
        let mut tables = lock!(self.tables);
        let mut results = ResultSet::new();
        for (use_case, org_id, string) in keys.as_triples() {
            let (id, minted) =
                tables.get_or_insert_with(use_case, org_id, string, || self.sequence.next_id())?;
            // A key minted by a racing caller since the read phase is reported
            // as read, not first seen.
            let fetch_type = if minted {
                FetchType::FirstSeen
            } else {
                FetchType::DbRead
            };
            results.add(use_case, org_id, string, id, fetch_type)?;
        }
        Ok(results)
    }

    fn resolve(&self, use_case: UseCase, org_id: OrgId, string: &str) -> Result<Option<Id>> {
        validate_string(string)?;
        let tables = lock!(self.tables);
        Ok(tables.get(use_case, org_id, string))
    }

    fn reverse_resolve(&self, id: Id) -> Result<Option<String>> {
        let tables = lock!(self.tables);
        Ok(tables.reverse.get(&id).cloned())
    }
}

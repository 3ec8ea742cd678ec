use std::collections::BTreeMap;

use crate::{Error, FetchType, Id, OrgId, ResolutionKey, Result, UseCase};

/// The outcome of resolving one [`ResolutionKey`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyResult {
    key: ResolutionKey,
    id: Id,
    fetch_type: FetchType,
}

impl KeyResult {
    pub fn new(key: ResolutionKey, id: Id, fetch_type: FetchType) -> Self {
        Self {
            key,
            id,
            fetch_type,
        }
    }

    pub fn key(&self) -> &ResolutionKey {
        &self.key
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn fetch_type(&self) -> FetchType {
        self.fetch_type
    }
}

/// Id and provenance recorded for a key inside a [`ResultSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Resolved {
    pub id: Id,
    pub fetch_type: FetchType,
}

type OrgResults = BTreeMap<OrgId, BTreeMap<String, Resolved>>;

/// Resolved mappings keyed by use-case, org and string, with a reverse index
/// from id to key over the same entries.
///
/// The forward and reverse sides are always written together, and the set
/// refuses to hold two keys with one id or one key with two ids.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultSet {
    forward: BTreeMap<UseCase, OrgResults>,
    reverse: BTreeMap<Id, ResolutionKey>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one resolution.
    ///
    /// Re-adding a key with the id it already has is a no-op and keeps the
    /// original provenance.
    ///
    /// # Errors
    /// - [`Error::InvalidKey`] if `string` is empty.
    /// - [`Error::DuplicateKey`] if the key is already bound to another id.
    /// - [`Error::ConflictingMapping`] if `id` is already bound to another
    ///   key.
    pub fn add(
        &mut self,
        use_case: UseCase,
        org_id: impl Into<OrgId>,
        string: impl Into<String>,
        id: Id,
        fetch_type: FetchType,
    ) -> Result<()> {
        let key = ResolutionKey::new(use_case, org_id, string)?;
        self.add_result(KeyResult::new(key, id, fetch_type))
    }

    /// [`Self::add`] for a prebuilt [`KeyResult`].
    pub fn add_result(&mut self, result: KeyResult) -> Result<()> {
        let KeyResult {
            key,
            id,
            fetch_type,
        } = result;
        if let Some(existing) = self.get(key.use_case(), key.org_id(), key.string()) {
            if existing == id {
                return Ok(());
            }
            return Err(Error::DuplicateKey {
                key,
                existing,
                attempted: id,
            });
        }
        self.insert_new(key, Resolved { id, fetch_type })
    }

    /// Looks up the id resolved for a key.
    pub fn get(&self, use_case: UseCase, org_id: OrgId, string: &str) -> Option<Id> {
        self.resolved(use_case, org_id, string)
            .map(|resolved| resolved.id)
    }

    /// Looks up how the id for a key was obtained.
    pub fn fetch_type(&self, use_case: UseCase, org_id: OrgId, string: &str) -> Option<FetchType> {
        self.resolved(use_case, org_id, string)
            .map(|resolved| resolved.fetch_type)
    }

    /// Reverse lookup. Ids are globally unique, so no scope is needed.
    pub fn get_by_id(&self, id: Id) -> Option<&str> {
        self.reverse.get(&id).map(ResolutionKey::string)
    }

    /// The full key an id is bound to.
    pub fn key_by_id(&self, id: Id) -> Option<&ResolutionKey> {
        self.reverse.get(&id)
    }

    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }

    /// Unions two result sets without modifying either.
    ///
    /// Keys present in both with the same id collapse into one entry that
    /// keeps the earlier-stage provenance, so the result does not depend on
    /// argument order.
    ///
    /// # Errors
    /// - [`Error::ConflictingMapping`] if the sets bind one key to two ids or
    ///   one id to two keys. This is never resolved silently.
    pub fn merge(&self, other: &Self) -> Result<Self> {
        let mut merged = self.clone();
        merged.merge_from(other)?;
        Ok(merged)
    }

    pub(crate) fn merge_from(&mut self, other: &Self) -> Result<()> {
        for (use_case, org_id, string, incoming) in other.iter() {
            let existing = self
                .forward
                .get_mut(&use_case)
                .and_then(|orgs| orgs.get_mut(&org_id))
                .and_then(|strings| strings.get_mut(string));
            match existing {
                Some(existing) if existing.id == incoming.id => {
                    existing.fetch_type = existing.fetch_type.min(incoming.fetch_type);
                }
                Some(existing) => {
                    return Err(Error::conflict(format_args!(
                        "{} resolved to both {} and {}",
                        ResolutionKey::from_validated(use_case, org_id, string),
                        existing.id,
                        incoming.id,
                    )));
                }
                None => self.insert_new(
                    ResolutionKey::from_validated(use_case, org_id, string),
                    incoming,
                )?,
            }
        }
        Ok(())
    }

    /// Iterates every entry in `(use_case, org_id, string)` order.
    pub fn iter(&self) -> impl Iterator<Item = (UseCase, OrgId, &str, Resolved)> + '_ {
        self.forward.iter().flat_map(|(&use_case, orgs)| {
            orgs.iter().flat_map(move |(&org_id, strings)| {
                strings
                    .iter()
                    .map(move |(string, &resolved)| (use_case, org_id, string.as_str(), resolved))
            })
        })
    }

    /// Owned [`KeyResult`]s in the same order as [`Self::iter`].
    pub fn results(&self) -> impl Iterator<Item = KeyResult> + '_ {
        self.iter().map(|(use_case, org_id, string, resolved)| {
            KeyResult::new(
                ResolutionKey::from_validated(use_case, org_id, string),
                resolved.id,
                resolved.fetch_type,
            )
        })
    }

    /// The `org -> string -> id` mapping for one use-case.
    pub fn mapping(&self, use_case: UseCase) -> BTreeMap<OrgId, BTreeMap<String, Id>> {
        self.forward
            .get(&use_case)
            .map(|orgs| {
                orgs.iter()
                    .map(|(&org_id, strings)| {
                        let ids = strings
                            .iter()
                            .map(|(string, resolved)| (string.clone(), resolved.id))
                            .collect();
                        (org_id, ids)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of entries per provenance.
    pub fn fetch_type_counts(&self) -> BTreeMap<FetchType, usize> {
        let mut counts = BTreeMap::new();
        for (.., resolved) in self.iter() {
            *counts.entry(resolved.fetch_type).or_insert(0) += 1;
        }
        counts
    }

    fn resolved(&self, use_case: UseCase, org_id: OrgId, string: &str) -> Option<Resolved> {
        self.forward
            .get(&use_case)?
            .get(&org_id)?
            .get(string)
            .copied()
    }

    /// Inserts a key known to be absent from the forward side.
    fn insert_new(&mut self, key: ResolutionKey, resolved: Resolved) -> Result<()> {
        if let Some(bound) = self.reverse.get(&resolved.id) {
            return Err(Error::conflict(format_args!(
                "id {} bound to both {bound} and {key}",
                resolved.id
            )));
        }
        self.forward
            .entry(key.use_case())
            .or_default()
            .entry(key.org_id())
            .or_default()
            .insert(key.string().to_owned(), resolved);
        self.reverse.insert(resolved.id, key);
        Ok(())
    }
}

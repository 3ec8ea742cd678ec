use std::collections::{BTreeMap, BTreeSet};

use crate::{OrgId, ResolutionKey, Result, ResultSet, UseCase, key::validate_string};

type OrgStrings = BTreeMap<OrgId, BTreeSet<String>>;

/// A deduplicated batch of pending resolution requests, grouped by use-case
/// then organization.
///
/// Duplicate strings collapse, so [`KeyCollection::size`] always counts
/// distinct `(use_case, org_id, string)` triples.
///
/// Every org entry holds at least one string; two collections are equal when
/// they hold the same triples.
#[derive(Clone, Debug, Default)]
pub struct KeyCollection {
    keys: BTreeMap<UseCase, OrgStrings>,
    size: usize,
}

impl KeyCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection for a single use-case from `org -> strings` pairs.
    ///
    /// # Errors
    /// - [`crate::Error::InvalidKey`] if any string is empty. Nothing is
    ///   returned in that case, so a bad batch never reaches a backend.
    pub fn from_org_strings<O, S, I>(use_case: UseCase, org_strings: I) -> Result<Self>
    where
        I: IntoIterator<Item = (O, S)>,
        O: Into<OrgId>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        let mut collection = Self::new();
        for (org_id, strings) in org_strings {
            collection.add(use_case, org_id, strings)?;
        }
        Ok(collection)
    }

    /// Merges `strings` into the set held for `(use_case, org_id)`.
    ///
    /// Repeating the same input is a no-op. The whole call is validated before
    /// anything is inserted, so a rejected call leaves the collection intact.
    ///
    /// # Errors
    /// - [`crate::Error::InvalidKey`] if any string is empty.
    pub fn add<S>(
        &mut self,
        use_case: UseCase,
        org_id: impl Into<OrgId>,
        strings: impl IntoIterator<Item = S>,
    ) -> Result<()>
    where
        S: Into<String>,
    {
        let strings = strings
            .into_iter()
            .map(Into::into)
            .map(|string: String| validate_string(&string).map(|()| string))
            .collect::<Result<Vec<_>>>()?;
        if strings.is_empty() {
            return Ok(());
        }

        let set = self
            .keys
            .entry(use_case)
            .or_default()
            .entry(org_id.into())
            .or_default();
        for string in strings {
            if set.insert(string) {
                self.size += 1;
            }
        }
        Ok(())
    }

    /// Inserts an already validated key. Returns `false` if it was present.
    pub fn insert(&mut self, key: ResolutionKey) -> bool {
        let (use_case, org_id, string) = key.into_parts();
        let inserted = self
            .keys
            .entry(use_case)
            .or_default()
            .entry(org_id)
            .or_default()
            .insert(string);
        if inserted {
            self.size += 1;
        }
        inserted
    }

    /// Total number of distinct `(use_case, org_id, string)` triples.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn contains(&self, use_case: UseCase, org_id: OrgId, string: &str) -> bool {
        self.keys
            .get(&use_case)
            .and_then(|orgs| orgs.get(&org_id))
            .is_some_and(|strings| strings.contains(string))
    }

    /// Use-cases with at least one pending string.
    pub fn use_cases(&self) -> impl Iterator<Item = UseCase> + '_ {
        self.keys.keys().copied()
    }

    /// Iterates every triple in `(use_case, org_id, string)` order.
    ///
    /// The iterator borrows the collection, so calling this again restarts
    /// from the beginning.
    pub fn as_triples(&self) -> impl Iterator<Item = (UseCase, OrgId, &str)> + '_ {
        self.keys.iter().flat_map(|(&use_case, orgs)| {
            orgs.iter().flat_map(move |(&org_id, strings)| {
                strings
                    .iter()
                    .map(move |string| (use_case, org_id, string.as_str()))
            })
        })
    }

    /// Same order as [`Self::as_triples`], as owned keys.
    pub fn keys(&self) -> impl Iterator<Item = ResolutionKey> + '_ {
        self.as_triples()
            .map(|(use_case, org_id, string)| ResolutionKey::from_validated(use_case, org_id, string))
    }

    /// Returns the triples of `self` that `results` has not resolved.
    ///
    /// Neither input is modified.
    pub fn subtract(&self, results: &ResultSet) -> Self {
        let mut remaining = Self::new();
        for (use_case, org_id, string) in self.as_triples() {
            if results.get(use_case, org_id, string).is_none() {
                remaining.insert(ResolutionKey::from_validated(use_case, org_id, string));
            }
        }
        remaining
    }
}

impl PartialEq for KeyCollection {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.as_triples().eq(other.as_triples())
    }
}

impl Eq for KeyCollection {}

impl FromIterator<ResolutionKey> for KeyCollection {
    fn from_iter<T: IntoIterator<Item = ResolutionKey>>(iter: T) -> Self {
        let mut collection = Self::new();
        for key in iter {
            collection.insert(key);
        }
        collection
    }
}

impl Extend<ResolutionKey> for KeyCollection {
    fn extend<T: IntoIterator<Item = ResolutionKey>>(&mut self, iter: T) {
        for key in iter {
            self.insert(key);
        }
    }
}

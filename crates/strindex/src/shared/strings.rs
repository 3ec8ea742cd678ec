use std::collections::HashMap;

use crate::{Error, Id, Result, key::validate_string};

/// A fixed table of strings that resolve to the same id for every
/// organization.
///
/// Ids in this table are reserved: they must sit below the first id the
/// backend mints, so a shared id can never be handed to an org-scoped key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SharedStrings {
    by_string: HashMap<String, Id>,
    by_id: HashMap<Id, String>,
}

impl SharedStrings {
    /// Builds the table from `(string, id)` pairs.
    ///
    /// # Errors
    /// - [`Error::InvalidKey`] if a string is empty.
    /// - [`Error::ConflictingMapping`] if a string or an id appears twice.
    pub fn new<S, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut table = Self::default();
        for (string, id) in entries {
            let string = string.into();
            let id = Id::new(id);
            validate_string(&string)?;
            if let Some(existing) = table.by_string.get(&string) {
                return Err(Error::conflict(format_args!(
                    "shared string {string:?} listed with ids {existing} and {id}"
                )));
            }
            if let Some(existing) = table.by_id.get(&id) {
                return Err(Error::conflict(format_args!(
                    "shared id {id} listed for {existing:?} and {string:?}"
                )));
            }
            table.by_id.insert(id, string.clone());
            table.by_string.insert(string, id);
        }
        Ok(table)
    }

    pub fn get(&self, string: &str) -> Option<Id> {
        self.by_string.get(string).copied()
    }

    pub fn get_by_id(&self, id: Id) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    /// The largest reserved id, if the table is not empty.
    pub fn max_id(&self) -> Option<Id> {
        self.by_id.keys().max().copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

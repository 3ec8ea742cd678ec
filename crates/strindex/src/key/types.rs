use core::{fmt, str::FromStr};

use crate::{Error, Result};

/// A namespace partition of the string keyspace.
///
/// Identical strings under different use-cases are distinct keys and receive
/// distinct ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UseCase {
    Sessions,
    Transactions,
    Spans,
    EscalatingIssues,
    Custom,
}

impl UseCase {
    /// Every registered use-case, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Sessions,
        Self::Transactions,
        Self::Spans,
        Self::EscalatingIssues,
        Self::Custom,
    ];

    /// The registry name of this use-case.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sessions => "sessions",
            Self::Transactions => "transactions",
            Self::Spans => "spans",
            Self::EscalatingIssues => "escalating_issues",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UseCase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|use_case| use_case.as_str() == s)
            .ok_or_else(|| Error::invalid_key(format_args!("unknown use-case `{s}`")))
    }
}

/// Tenant identifier.
///
/// Unsigned by construction, so a negative org id can only arrive as text and
/// is rejected by [`OrgId::from_str`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[repr(transparent)]
pub struct OrgId(u64);

impl OrgId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for OrgId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for OrgId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| Error::invalid_key(format_args!("org id `{s}`: {e}")))
    }
}

/// A single `(use_case, org_id, string)` resolution request.
///
/// The string is stored verbatim; no normalization is applied.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ResolutionKey {
    use_case: UseCase,
    org_id: OrgId,
    string: String,
}

impl ResolutionKey {
    /// Builds a key, rejecting empty strings with [`Error::InvalidKey`].
    pub fn new(
        use_case: UseCase,
        org_id: impl Into<OrgId>,
        string: impl Into<String>,
    ) -> Result<Self> {
        let string = string.into();
        validate_string(&string)?;
        Ok(Self {
            use_case,
            org_id: org_id.into(),
            string,
        })
    }

    /// Skips validation for strings that already came out of a
    /// [`crate::KeyCollection`] or [`crate::ResultSet`].
    pub(crate) fn from_validated(use_case: UseCase, org_id: OrgId, string: &str) -> Self {
        debug_assert!(!string.is_empty());
        Self {
            use_case,
            org_id,
            string: string.to_owned(),
        }
    }

    pub fn use_case(&self) -> UseCase {
        self.use_case
    }

    pub fn org_id(&self) -> OrgId {
        self.org_id
    }

    pub fn string(&self) -> &str {
        &self.string
    }

    pub fn into_parts(self) -> (UseCase, OrgId, String) {
        (self.use_case, self.org_id, self.string)
    }
}

impl fmt::Display for ResolutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {:?})", self.use_case, self.org_id, self.string)
    }
}

pub(crate) fn validate_string(string: &str) -> Result<()> {
    if string.is_empty() {
        return Err(Error::invalid_key("string must not be empty"));
    }
    Ok(())
}

use core::fmt;

/// How a resolved mapping was obtained.
///
/// Provenance is reporting metadata only and never changes which id is
/// returned. Variants are ordered by resolution stage, earliest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FetchType {
    /// Served by a read-through cache in front of the backend.
    CacheHit,
    /// Served from a static table of shared strings.
    Hardcoded,
    /// Found among the backend's existing mappings.
    DbRead,
    /// Minted by this call.
    FirstSeen,
}

impl FetchType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CacheHit => "cache_hit",
            Self::Hardcoded => "hardcoded",
            Self::DbRead => "db_read",
            Self::FirstSeen => "first_seen",
        }
    }
}

impl fmt::Display for FetchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Layout versions of persisted data.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `major.minor.patch` version of a persisted layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Bumped when older readers can no longer read the data
    pub major: u16,
    /// Bumped when fields are added
    pub minor: u16,
    /// Bumped for fixes without layout changes
    pub patch: u16,
}

impl SchemaVersion {
    /// Item tag tree layout written by this build.
    pub const ITEM_TAG: Self = Self::new(1, 0, 0);

    /// Manifest layout read by this build.
    pub const MANIFEST: Self = Self::new(1, 0, 0);

    /// Creates a version.
    #[must_use]
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Checks whether a reader at `self` understands data written at `data`.
    ///
    /// The majors must agree and the reader must know every minor addition.
    #[must_use]
    pub const fn is_compatible_with(&self, data: &Self) -> bool {
        self.major == data.major && self.minor >= data.minor
    }

    /// Parses `major.minor.patch`, returning `None` on any malformed part.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        text.parse().ok()
    }
}

impl FromStr for SchemaVersion {
    type Err = crate::TallyError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || crate::TallyError::VersionMismatch {
            expected: "major.minor.patch".to_owned(),
            actual: text.to_owned(),
        };
        let mut parts = text.trim().split('.').map(str::parse::<u16>);
        let mut next = || parts.next().and_then(Result::ok).ok_or_else(invalid);
        let version = Self::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(version)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

//! Per-entity write counter.

use crate::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Monotonic write counter of a single entity.
///
/// A stored entity's version starts at 1 on its first successful write and
/// grows by exactly one per successful conditioned write. [`Version::ZERO`]
/// is the implicit prior value of an entity that was never written.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// The version of an entity that has never been written.
    pub const ZERO: Version = Version(0);

    /// Creates a version from its raw counter value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw counter value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the version that follows this one, saturating at `u64::MAX`.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Returns the version that follows this one, or `None` at `u64::MAX`.
    #[must_use]
    pub const fn checked_next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(next) => Some(Self(next)),
            None => None,
        }
    }

    /// Encodes the version as a persisted attribute value.
    #[must_use]
    pub fn to_value(self) -> Value {
        Value::from(self.0)
    }
}

impl From<u64> for Version {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl TryFrom<&Value> for Version {
    type Error = Error;

    /// Decodes a persisted version attribute.
    ///
    /// Accepts non-negative integers and numeric strings (some stores hand
    /// numbers back as strings).
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .map(Self)
                .ok_or_else(|| Error::InvalidVersion(n.to_string())),
            Value::String(s) => s
                .parse::<u64>()
                .map(Self)
                .map_err(|_| Error::InvalidVersion(s.clone())),
            other => Err(Error::InvalidVersion(other.to_string())),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

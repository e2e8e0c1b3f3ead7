//! Handles for hidden per-entity fields.
//!
//! A hidden field is a slot on an entity that is not part of its visible
//! attribute set and is never serialized with it. Each configured locking
//! instance owns its own handle, so two instances never share a slot.

use std::fmt;
use uuid::Uuid;

/// Opaque identifier of a hidden entity slot.
///
/// Handles are compared by identity only. Uses UUID v7 so that handles
/// created later sort after earlier ones in debug output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldHandle(Uuid);

impl FieldHandle {
    /// Creates a new handle, distinct from every other handle.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a handle from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for FieldHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FieldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field:{}", self.0)
    }
}

//! Accessors for the hidden version slot.

use crate::error::{LockError, LockResult};
use optilock_model::Entity;
use optilock_types::{FieldHandle, Version};

/// Reads and writes the version slot owned by one locking instance.
///
/// No validation is done: a version set here is simply the base of the next
/// write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionStore {
    field: FieldHandle,
}

impl VersionStore {
    pub fn new(field: FieldHandle) -> Self {
        Self { field }
    }

    pub fn field(&self) -> FieldHandle {
        self.field
    }

    /// The in-memory version, if one was ever set.
    pub fn get(&self, entity: &Entity) -> Option<Version> {
        entity.hidden_version(self.field)
    }

    /// The in-memory version, [`Version::ZERO`] if unset.
    pub fn current(&self, entity: &Entity) -> Version {
        self.get(entity).unwrap_or(Version::ZERO)
    }

    pub fn set(&self, entity: &mut Entity, version: Version) {
        entity.set_hidden_version(self.field, version);
    }

    /// The version the entity's next write would carry.
    pub fn next(&self, entity: &Entity) -> LockResult<Version> {
        let current = self.current(entity);
        current
            .checked_next()
            .ok_or(LockError::VersionOverflow(current))
    }

    /// Bumps the in-memory version and returns the new value.
    ///
    /// The bump is not undone if the write fails. At `u64::MAX` the entity is
    /// left unchanged and [`LockError::VersionOverflow`] is returned.
    pub fn stamp(&self, entity: &mut Entity) -> LockResult<Version> {
        let next = self.next(entity)?;
        self.set(entity, next);
        Ok(next)
    }
}

//! Converging read-modify-write.

use crate::error::{LockError, LockResult};
use crate::plugin::VersionedModel;
use async_trait::async_trait;
use optilock_model::Entity;
use optilock_store::{Condition, WriteOptions};
use tracing::{debug, warn};

/// Applies a change to the working copy of an entity.
///
/// Returning `false` stops the loop without writing.
#[async_trait]
pub trait Mutator: Send {
    async fn apply(&mut self, entity: &mut Entity) -> bool;
}

#[async_trait]
impl<F> Mutator for F
where
    F: FnMut(&mut Entity) -> bool + Send,
{
    async fn apply(&mut self, entity: &mut Entity) -> bool {
        self(entity)
    }
}

/// Options of [`VersionedModel::put_next_version`].
#[derive(Debug, Clone, Default)]
pub struct PutNextVersionOptions {
    /// Maximum number of write attempts; 0 means unbounded.
    pub max_attempts: u32,
    /// Caller condition applied to every attempt.
    pub condition: Option<Condition>,
}

impl PutNextVersionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// Outcome of [`VersionedModel::put_next_version`].
#[derive(Debug, Clone)]
pub struct PutNextVersionResult {
    /// The written entity, or the unwritten working copy if the mutator stopped.
    pub entity: Entity,
    /// Write attempts made, counting the last one. When the mutator stopped
    /// the loop, the number of mutator calls instead.
    pub attempts: u32,
    /// Whether the entity was written.
    pub written: bool,
}

impl VersionedModel {
    /// Applies `mutator` and writes, retrying against the stored copy on
    /// version conflicts.
    ///
    /// On a conflict the working copy is replaced by the stored entity carried
    /// by the conflict, so each retry starts from stored version + 1. Fails
    /// with the conflict, annotated with the attempt count, once
    /// `max_attempts` is reached. Any other failure stops the loop at once.
    pub async fn put_next_version<M>(
        &self,
        entity: Entity,
        mut mutator: M,
        options: PutNextVersionOptions,
    ) -> LockResult<PutNextVersionResult>
    where
        M: Mutator,
    {
        if !self.context.config.fetch_on_conflict {
            return Err(LockError::FetchOnConflictRequired);
        }

        let mut working = entity;
        let mut attempts: u32 = 1;
        loop {
            if !mutator.apply(&mut working).await {
                debug!(model = %self.model().name(), attempts, "Mutator stopped; nothing written");
                return Ok(PutNextVersionResult {
                    entity: working,
                    attempts,
                    written: false,
                });
            }

            let write_options = WriteOptions {
                condition: options.condition.clone(),
                version: None,
            };
            match self.put_with(&mut working, write_options).await {
                Ok(()) => {
                    debug!(
                        model = %self.model().name(),
                        attempts,
                        version = ?self.get_version(&working),
                        "putNextVersion written"
                    );
                    return Ok(PutNextVersionResult {
                        entity: working,
                        attempts,
                        written: true,
                    });
                }
                Err(LockError::Conflict(conflict)) => {
                    if options.max_attempts > 0 && attempts >= options.max_attempts {
                        warn!(
                            model = %self.model().name(),
                            attempts,
                            "putNextVersion gave up after repeated version conflicts"
                        );
                        return Err(LockError::Conflict(conflict.with_attempts(attempts)));
                    }
                    debug!(
                        model = %self.model().name(),
                        attempts,
                        stored = ?self.get_version(conflict.stored()),
                        "Version conflict; retrying against stored copy"
                    );
                    working = conflict.into_stored();
                    attempts += 1;
                }
                Err(other) => {
                    return Err(LockError::WriteFailed {
                        attempts,
                        source: Box::new(other),
                    });
                }
            }
        }
    }
}

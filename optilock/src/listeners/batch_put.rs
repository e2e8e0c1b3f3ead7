use super::LockContext;
use crate::error::LockError;
use async_trait::async_trait;
use optilock_store::{
    Actions, Hook, HookEvent, HookOutcome, ModelError, Payload, VersionContext,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Rejects batch writes, or stamps each entity when they are allowed.
pub(crate) struct StampBatch {
    context: Arc<LockContext>,
}

impl StampBatch {
    pub fn new(context: Arc<LockContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Hook for StampBatch {
    async fn handle(&self, event: HookEvent<'_>, actions: &mut Actions) -> HookOutcome {
        let Payload::BatchPutCalled { entities, options } = event.payload else {
            return HookOutcome::Continue;
        };
        if !self.context.config.allow_unsupported_batch {
            return HookOutcome::Reject(ModelError::hook(LockError::BatchUnsupported));
        }
        // Every entity must have a successor before any of them is bumped.
        let versions = match entities
            .iter()
            .map(|entity| self.context.versions.next(entity))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(versions) => versions,
            Err(err) => {
                warn!(model = %event.model.name(), error = %err, "Batch put rejected before any request");
                return HookOutcome::Reject(ModelError::hook(err));
            }
        };
        for (entity, version) in entities.iter_mut().zip(&versions) {
            self.context.versions.set(entity, *version);
        }
        debug!(model = %event.model.name(), ?versions, "model:batchPut|called");

        let mut options = options.clone();
        options.version = Some(VersionContext::Batch(versions));
        actions.update_options(options);
        HookOutcome::Continue
    }
}

/// Writes the stamped versions onto the outgoing items, by position.
pub(crate) struct AttachBatchVersions {
    context: Arc<LockContext>,
}

impl AttachBatchVersions {
    pub fn new(context: Arc<LockContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Hook for AttachBatchVersions {
    async fn handle(&self, event: HookEvent<'_>, actions: &mut Actions) -> HookOutcome {
        let Payload::BatchPutRequest { requests, options } = event.payload else {
            return HookOutcome::Continue;
        };
        let Some(VersionContext::Batch(versions)) = &options.version else {
            warn!(model = %event.model.name(), "Batch put reached request:pre without stamped versions");
            return HookOutcome::Reject(ModelError::hook(LockError::MissingVersionContext(
                "batchPut",
            )));
        };

        let mut items: Vec<_> = requests
            .iter()
            .flat_map(|request| request.items.iter().cloned())
            .collect();
        if items.len() != versions.len() {
            warn!(
                items = items.len(),
                versions = versions.len(),
                "Batch item count does not match stamped versions"
            );
            return HookOutcome::Reject(ModelError::hook(LockError::MissingVersionContext(
                "batchPut",
            )));
        }
        for (item, version) in items.iter_mut().zip(versions) {
            self.context.conditions.stamp_item(item, *version);
        }
        debug!(model = %event.model.name(), requests = requests.len(), "model:batchPut|request:pre");
        actions.update_items(items);
        HookOutcome::Continue
    }
}

use super::LockContext;
use async_trait::async_trait;
use optilock_store::{
    Actions, Hook, HookEvent, HookOutcome, ModelError, Payload, VersionContext,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Bumps the entity's version and hands it to the request stage.
pub(crate) struct StampVersion {
    context: Arc<LockContext>,
}

impl StampVersion {
    pub fn new(context: Arc<LockContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Hook for StampVersion {
    async fn handle(&self, event: HookEvent<'_>, actions: &mut Actions) -> HookOutcome {
        if let Payload::PutCalled { entity, options } = event.payload {
            let next = match self.context.versions.stamp(entity) {
                Ok(next) => next,
                Err(err) => {
                    warn!(model = %event.model.name(), error = %err, "Put rejected before any request");
                    return HookOutcome::Reject(ModelError::hook(err));
                }
            };
            debug!(model = %event.model.name(), version = %next, "model:put|called");
            let mut options = options.clone();
            options.version = Some(VersionContext::Single(next));
            actions.update_options(options);
        }
        HookOutcome::Continue
    }
}

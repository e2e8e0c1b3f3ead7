use super::LockContext;
use async_trait::async_trait;
use optilock_store::{Actions, Hook, HookEvent, HookOutcome, Payload};
use std::sync::Arc;
use tracing::debug;

/// Logs the stored version of a fetched entity.
pub(crate) struct GetLogger {
    context: Arc<LockContext>,
}

impl GetLogger {
    pub fn new(context: Arc<LockContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Hook for GetLogger {
    async fn handle(&self, event: HookEvent<'_>, _actions: &mut Actions) -> HookOutcome {
        if let Payload::Get {
            key,
            data: Some(entity),
            ..
        } = event.payload
        {
            debug!(
                model = %event.model.name(),
                %key,
                version = ?self.context.versions.get(entity),
                "model:get|request:post"
            );
        }
        HookOutcome::Continue
    }
}

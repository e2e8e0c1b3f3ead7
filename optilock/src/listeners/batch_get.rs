use super::LockContext;
use async_trait::async_trait;
use optilock_store::{Actions, Hook, HookEvent, HookOutcome, Payload};
use std::sync::Arc;
use tracing::debug;

/// Logs the stored versions of a batch read.
pub(crate) struct BatchGetLogger {
    context: Arc<LockContext>,
}

impl BatchGetLogger {
    pub fn new(context: Arc<LockContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Hook for BatchGetLogger {
    async fn handle(&self, event: HookEvent<'_>, _actions: &mut Actions) -> HookOutcome {
        if let Payload::BatchGet { keys, data, .. } = event.payload {
            let versions: Vec<_> = data
                .iter()
                .map(|entity| self.context.versions.get(entity))
                .collect();
            debug!(
                model = %event.model.name(),
                requested = keys.len(),
                found = data.len(),
                ?versions,
                "model:batchGet|request:post"
            );
        }
        HookOutcome::Continue
    }
}

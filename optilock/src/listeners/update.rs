use super::LockContext;
use async_trait::async_trait;
use optilock_store::{Actions, Hook, HookEvent, HookOutcome, Payload};
use std::sync::Arc;
use tracing::{debug, warn};

/// Adds `ADD <version> 1` to every update.
pub(crate) struct IncrementOnUpdate {
    context: Arc<LockContext>,
}

impl IncrementOnUpdate {
    pub fn new(context: Arc<LockContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Hook for IncrementOnUpdate {
    async fn handle(&self, event: HookEvent<'_>, actions: &mut Actions) -> HookOutcome {
        if let Payload::UpdateCalled {
            key, expression, ..
        } = event.payload
        {
            let attribute = self.context.conditions.attribute_name();
            let mut expression = expression.clone();
            if expression.touches(attribute) {
                warn!(%key, attribute, "Update expression touches the version attribute; dropping those actions");
                expression = expression.without(attribute);
            }
            debug!(model = %event.model.name(), %key, "model:update|called");
            actions.update_expression(expression.add(attribute, 1));
        }
        HookOutcome::Continue
    }
}

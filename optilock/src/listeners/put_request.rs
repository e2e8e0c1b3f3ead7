use super::LockContext;
use crate::error::LockError;
use async_trait::async_trait;
use optilock_store::{
    Actions, Hook, HookEvent, HookOutcome, ModelError, Payload, VersionContext,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Persists the stamped version and conditions the write on it.
pub(crate) struct InjectCondition {
    context: Arc<LockContext>,
}

impl InjectCondition {
    pub fn new(context: Arc<LockContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Hook for InjectCondition {
    async fn handle(&self, event: HookEvent<'_>, actions: &mut Actions) -> HookOutcome {
        let Payload::PutRequest { request, options } = event.payload else {
            return HookOutcome::Continue;
        };
        let Some(VersionContext::Single(next)) = options.version else {
            warn!(model = %event.model.name(), "Put reached request:pre without a stamped version");
            return HookOutcome::Reject(ModelError::hook(LockError::MissingVersionContext("put")));
        };

        let conditions = &self.context.conditions;
        let condition = match conditions.merge(options.condition.clone(), next) {
            Ok(condition) => condition,
            Err(err) => return HookOutcome::Reject(err.into()),
        };
        debug!(
            model = %event.model.name(),
            version = %next,
            condition = %condition,
            "model:put|request:pre"
        );

        let mut item = request.item.clone();
        conditions.stamp_item(&mut item, next);
        actions.update_item(item);

        let mut options = options.clone();
        options.condition = Some(condition);
        actions.update_options(options);
        HookOutcome::Continue
    }
}

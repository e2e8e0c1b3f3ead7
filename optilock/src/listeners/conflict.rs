use super::LockContext;
use crate::error::OptimisticLockError;
use async_trait::async_trait;
use optilock_store::{
    Actions, Hook, HookEvent, HookOutcome, ModelError, Payload, VersionContext,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Tells version conflicts apart from other conditional-write rejections.
///
/// On a conditional-check failure the stored entity is fetched by key. If its
/// version is at least the one submitted, the error is replaced by an
/// [`OptimisticLockError`] carrying it. Otherwise the caller's own condition
/// failed and the original error stands.
pub(crate) struct ConflictDetector {
    context: Arc<LockContext>,
}

impl ConflictDetector {
    pub fn new(context: Arc<LockContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Hook for ConflictDetector {
    async fn handle(&self, event: HookEvent<'_>, actions: &mut Actions) -> HookOutcome {
        let HookEvent { model, payload, .. } = event;
        let Payload::PutResponse {
            request,
            options,
            error: Some(error),
        } = payload
        else {
            return HookOutcome::Continue;
        };
        if !error.is_conditional_check_failed() {
            return HookOutcome::Continue;
        }

        let Some(VersionContext::Single(attempted)) = options.version else {
            warn!(
                model = %model.name(),
                "Put reached request:post without a stamped version; keeping original error"
            );
            return HookOutcome::Continue;
        };
        let key = match model.schema().key_of(&request.item) {
            Ok(key) => key,
            Err(err) => return HookOutcome::Reject(err.into()),
        };

        let stored = match model.get(&key).await {
            Ok(stored) => stored,
            Err(read_error) => {
                debug!(model = %model.name(), %key, error = %read_error, "Refetch after conditional failure failed");
                return HookOutcome::Reject(read_error);
            }
        };
        let Some(stored) = stored else {
            debug!(model = %model.name(), %key, "Entity gone after conditional failure; keeping original error");
            return HookOutcome::Continue;
        };

        let stored_version = self.context.versions.current(&stored);
        if stored_version >= attempted {
            debug!(
                model = %model.name(),
                %key,
                stored = %stored_version,
                attempted = %attempted,
                "model:put|request:post version conflict"
            );
            let metadata = error.as_store_error().map(|e| e.metadata.clone());
            actions.update_error(ModelError::hook(OptimisticLockError::new(stored, metadata)));
        } else {
            debug!(
                model = %model.name(),
                %key,
                stored = %stored_version,
                attempted = %attempted,
                "Conditional failure not caused by the version condition"
            );
        }
        HookOutcome::Continue
    }
}

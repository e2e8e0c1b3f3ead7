//! Stage hooks of one locking instance.
//!
//! | operation | stage | hook |
//! |---|---|---|
//! | get, batchGet | request:post | version logging, when debug logging is on |
//! | put | called | stamp the next version |
//! | put | request:pre | persist the version and add the version condition |
//! | put | request:post | conflict detection, when fetching on conflict |
//! | batchPut | called | reject, or stamp every item when batches are allowed |
//! | batchPut | request:pre | persist versions by position, when batches are allowed |
//! | update | called | `ADD version 1` |

mod batch_get;
mod batch_put;
mod conflict;
mod get;
mod put_called;
mod put_request;
mod update;

use crate::condition::ConditionBuilder;
use crate::config::OptimisticLockingConfig;
use crate::version::VersionStore;
use optilock_store::{Hook, HookRegistry, Operation, Stage};
use std::sync::Arc;
use tracing::Level;

pub(crate) use batch_get::BatchGetLogger;
pub(crate) use batch_put::{AttachBatchVersions, StampBatch};
pub(crate) use conflict::ConflictDetector;
pub(crate) use get::GetLogger;
pub(crate) use put_called::StampVersion;
pub(crate) use put_request::InjectCondition;
pub(crate) use update::IncrementOnUpdate;

/// State shared by the hooks of one instance.
#[derive(Debug)]
pub(crate) struct LockContext {
    pub config: OptimisticLockingConfig,
    pub versions: VersionStore,
    pub conditions: ConditionBuilder,
}

impl LockContext {
    pub fn new(config: OptimisticLockingConfig) -> Self {
        Self {
            versions: VersionStore::new(config.version_field),
            conditions: ConditionBuilder::new(config.attribute_name.clone()),
            config,
        }
    }
}

fn hook(hook: impl Hook + 'static) -> Option<Arc<dyn Hook>> {
    Some(Arc::new(hook))
}

/// Builds the registry for one instance.
pub(crate) fn create_hooks(name: &str, context: &Arc<LockContext>) -> HookRegistry {
    let mut registry = HookRegistry::new(name);
    let config = &context.config;
    let debug = tracing::enabled!(Level::DEBUG);

    registry.register(
        Operation::Get,
        Stage::RequestPost,
        debug.then(|| hook(GetLogger::new(context.clone()))).flatten(),
    );
    registry.register(
        Operation::BatchGet,
        Stage::RequestPost,
        debug.then(|| hook(BatchGetLogger::new(context.clone()))).flatten(),
    );

    registry.register(
        Operation::Put,
        Stage::Called,
        hook(StampVersion::new(context.clone())),
    );
    registry.register(
        Operation::Put,
        Stage::RequestPre,
        hook(InjectCondition::new(context.clone())),
    );
    registry.register(
        Operation::Put,
        Stage::RequestPost,
        config
            .fetch_on_conflict
            .then(|| hook(ConflictDetector::new(context.clone())))
            .flatten(),
    );

    registry.register(
        Operation::BatchPut,
        Stage::Called,
        hook(StampBatch::new(context.clone())),
    );
    registry.register(
        Operation::BatchPut,
        Stage::RequestPre,
        config
            .allow_unsupported_batch
            .then(|| hook(AttachBatchVersions::new(context.clone())))
            .flatten(),
    );

    registry.register(
        Operation::Update,
        Stage::Called,
        hook(IncrementOnUpdate::new(context.clone())),
    );

    registry
}

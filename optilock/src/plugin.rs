//! The locking plugin and the model it produces.

use crate::config::OptimisticLockingConfig;
use crate::error::{LockError, LockResult};
use crate::listeners::{self, LockContext};
use crate::version::VersionStore;
use optilock_model::Entity;
use optilock_store::{BatchPutOutput, HookRegistry, Model, UpdateExpression, WriteOptions};
use optilock_types::{Key, Version};
use std::sync::Arc;
use tracing::info;

/// A configured optimistic-locking instance.
///
/// Each instance owns its own hidden version slot, so instances with
/// different settings can be installed on different models side by side.
#[derive(Debug, Clone)]
pub struct OptimisticLocking {
    context: Arc<LockContext>,
}

impl OptimisticLocking {
    pub const NAME: &'static str = "optimistic-locking";
    pub const DESCRIPTION: &'static str =
        "Versions every write and rejects writes based on a stale version";

    pub fn new(config: OptimisticLockingConfig) -> LockResult<Self> {
        config.validate()?;
        Ok(Self {
            context: Arc::new(LockContext::new(config)),
        })
    }

    pub fn config(&self) -> &OptimisticLockingConfig {
        &self.context.config
    }

    pub fn versions(&self) -> VersionStore {
        self.context.versions
    }

    /// Builds the hook registry of this instance.
    pub fn hooks(&self) -> HookRegistry {
        listeners::create_hooks(Self::NAME, &self.context)
    }

    /// Installs the plugin on a model.
    ///
    /// Declares the version attribute as hidden, so reads move it into the
    /// entity's version slot and writes never send the slot as an attribute.
    pub fn install(&self, mut model: Model) -> LockResult<VersionedModel> {
        let config = &self.context.config;
        if model.schema().is_key_attribute(&config.attribute_name) {
            return Err(LockError::InvalidConfig(format!(
                "attribute_name '{}' is a key attribute of table '{}'",
                config.attribute_name,
                model.name()
            )));
        }
        model
            .schema_mut()
            .declare_hidden(config.attribute_name.clone(), config.version_field)?;
        model.plugin(Arc::new(self.hooks()));

        info!(
            model = %model.name(),
            attribute = %config.attribute_name,
            fetch_on_conflict = config.fetch_on_conflict,
            allow_unsupported_batch = config.allow_unsupported_batch,
            "Optimistic locking installed"
        );
        Ok(VersionedModel {
            model,
            context: self.context.clone(),
        })
    }
}

/// A model with optimistic locking installed.
pub struct VersionedModel {
    model: Model,
    pub(crate) context: Arc<LockContext>,
}

impl VersionedModel {
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Plugins installed through this run after the locking hooks at each stage.
    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn config(&self) -> &OptimisticLockingConfig {
        &self.context.config
    }

    // ================================================================
    // Version accessors
    // ================================================================

    /// The entity's in-memory version. May not be persisted yet.
    pub fn get_version(&self, entity: &Entity) -> Option<Version> {
        self.context.versions.get(entity)
    }

    /// Sets the base version of the entity's next write. Not validated.
    pub fn set_version(&self, entity: &mut Entity, version: Version) {
        self.context.versions.set(entity, version);
    }

    // ================================================================
    // Operations
    // ================================================================

    pub async fn get(&self, key: &Key) -> LockResult<Option<Entity>> {
        Ok(self.model.get(key).await?)
    }

    pub async fn batch_get(&self, keys: &[Key]) -> LockResult<Vec<Entity>> {
        Ok(self.model.batch_get(keys).await?)
    }

    /// Writes the entity conditioned on its version.
    ///
    /// The entity's version is bumped before the write and stays bumped if
    /// the write fails.
    pub async fn put(&self, entity: &mut Entity) -> LockResult<()> {
        self.put_with(entity, WriteOptions::default()).await
    }

    /// Writes the entity with a caller condition ANDed to the version condition.
    pub async fn put_with(&self, entity: &mut Entity, options: WriteOptions) -> LockResult<()> {
        Ok(self.model.put(entity, options).await?)
    }

    /// Writes the entity only if no item with its key exists.
    pub async fn create(&self, entity: &mut Entity) -> LockResult<()> {
        Ok(self.model.create(entity).await?)
    }

    /// Writes several entities. Rejected unless batches are allowed; when
    /// allowed, items are stamped but not conditioned.
    pub async fn batch_put(&self, entities: &mut [Entity]) -> LockResult<BatchPutOutput> {
        Ok(self.model.batch_put(entities).await?)
    }

    /// Applies a partial update, incrementing the stored version.
    pub async fn update(
        &self,
        key: &Key,
        expression: UpdateExpression,
        options: WriteOptions,
    ) -> LockResult<Entity> {
        Ok(self.model.update(key, expression, options).await?)
    }
}

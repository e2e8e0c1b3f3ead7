//! The model pipeline.
//!
//! A [`Model`] binds a [`Schema`] to a [`StorageBackend`] and runs each
//! operation through the `called → request:pre → backend → request:post`
//! stages, firing the hooks of every installed [`HookRegistry`].

use crate::backend::StorageBackend;
use crate::condition::Condition;
use crate::error::{ModelError, ModelResult, StoreError};
use crate::hooks::{Actions, Hook, HookEvent, HookOutcome, HookRegistry, Operation, Payload, Stage};
use crate::options::WriteOptions;
use crate::request::{
    BatchGetRequest, BatchWriteRequest, GetRequest, PutRequest, UpdateRequest, MAX_BATCH_GET_KEYS,
    MAX_BATCH_WRITE_ITEMS,
};
use crate::update::UpdateExpression;
use optilock_model::{Entity, Schema};
use optilock_types::{Attributes, Key};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Result of a batch write.
#[derive(Debug, Default)]
pub struct BatchPutOutput {
    /// Items the backend did not process.
    pub unprocessed: Vec<Entity>,
}

/// A table bound to a backend, with stage hooks.
pub struct Model {
    name: String,
    schema: Schema,
    backend: Arc<dyn StorageBackend>,
    plugins: Vec<Arc<HookRegistry>>,
}

impl Model {
    pub fn new(schema: Schema, backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            name: schema.table().to_string(),
            schema,
            backend,
            plugins: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Installs a hook registry. Registries fire in installation order.
    pub fn plugin(&mut self, registry: Arc<HookRegistry>) {
        debug!(model = %self.name, plugin = %registry.name(), slots = registry.len(), "Plugin registered");
        self.plugins.push(registry);
    }

    pub fn plugins(&self) -> &[Arc<HookRegistry>] {
        &self.plugins
    }

    pub fn clear_plugins(&mut self) {
        self.plugins.clear();
    }

    // ================================================================
    // Reads
    // ================================================================

    /// Reads one entity by key.
    pub async fn get(&self, key: &Key) -> ModelResult<Option<Entity>> {
        let op = Operation::Get;
        for stage in [Stage::Called, Stage::RequestPre] {
            for hook in self.hooks(op, stage) {
                let payload = Payload::Get {
                    key,
                    data: None,
                    error: None,
                };
                self.dispatch(hook, op, stage, payload).await?.finish(op, stage);
            }
        }

        let request = GetRequest {
            table: self.name.clone(),
            key: key.clone(),
        };
        let mut result = match self.backend.get_item(&request).await {
            Ok(Some(item)) => self.schema.decode(item).map(Some).map_err(ModelError::from),
            Ok(None) => Ok(None),
            Err(err) => Err(err.into()),
        };

        let stage = Stage::RequestPost;
        for hook in self.hooks(op, stage) {
            let payload = Payload::Get {
                key,
                data: result.as_ref().ok().and_then(Option::as_ref),
                error: result.as_ref().err(),
            };
            let mut actions = self.dispatch(hook, op, stage, payload).await?;
            if let Some(err) = actions.error.take() {
                result = Err(err);
            }
            actions.finish(op, stage);
        }
        result
    }

    /// Reads several entities. Results follow the order of `keys`; missing
    /// keys are skipped.
    pub async fn batch_get(&self, keys: &[Key]) -> ModelResult<Vec<Entity>> {
        let op = Operation::BatchGet;
        for stage in [Stage::Called, Stage::RequestPre] {
            for hook in self.hooks(op, stage) {
                let payload = Payload::BatchGet {
                    keys,
                    data: &[],
                    error: None,
                };
                self.dispatch(hook, op, stage, payload).await?.finish(op, stage);
            }
        }

        let mut result = self.fetch_many(keys).await;

        let stage = Stage::RequestPost;
        for hook in self.hooks(op, stage) {
            let payload = Payload::BatchGet {
                keys,
                data: result.as_deref().unwrap_or(&[]),
                error: result.as_ref().err(),
            };
            let mut actions = self.dispatch(hook, op, stage, payload).await?;
            if let Some(err) = actions.error.take() {
                result = Err(err);
            }
            actions.finish(op, stage);
        }
        result
    }

    async fn fetch_many(&self, keys: &[Key]) -> ModelResult<Vec<Entity>> {
        let mut found: HashMap<String, Entity> = HashMap::with_capacity(keys.len());
        for chunk in keys.chunks(MAX_BATCH_GET_KEYS) {
            let request = BatchGetRequest {
                table: self.name.clone(),
                keys: chunk.to_vec(),
            };
            for item in self.backend.batch_get_items(&request).await? {
                let id = self.schema.key_of(&item)?.storage_id();
                found.insert(id, self.schema.decode(item)?);
            }
        }
        Ok(keys
            .iter()
            .filter_map(|key| found.remove(&key.storage_id()))
            .collect())
    }

    // ================================================================
    // Writes
    // ================================================================

    /// Writes an entity.
    ///
    /// Hooks at `called` may change the entity in place (hidden slots
    /// included), so the caller's copy reflects what was submitted.
    pub async fn put(&self, entity: &mut Entity, options: WriteOptions) -> ModelResult<()> {
        let op = Operation::Put;
        let mut options = options;

        let stage = Stage::Called;
        for hook in self.hooks(op, stage) {
            let payload = Payload::PutCalled {
                entity: &mut *entity,
                options: &options,
            };
            let mut actions = self.dispatch(hook, op, stage, payload).await?;
            if let Some(updated) = actions.options.take() {
                options = updated;
            }
            actions.finish(op, stage);
        }

        let mut request = PutRequest {
            table: self.name.clone(),
            item: self.schema.encode(entity),
            condition: options.condition.clone(),
        };

        let stage = Stage::RequestPre;
        for hook in self.hooks(op, stage) {
            let payload = Payload::PutRequest {
                request: &request,
                options: &options,
            };
            let mut actions = self.dispatch(hook, op, stage, payload).await?;
            if let Some(updated) = actions.options.take() {
                request.condition = updated.condition.clone();
                options = updated;
            }
            if let Some(item) = actions.item.take() {
                request.item = item;
            }
            actions.finish(op, stage);
        }

        let mut result = self.backend.put_item(&request).await.map_err(ModelError::from);
        if let Err(err) = &result {
            debug!(model = %self.name, error = %err, "Put failed");
        }

        let stage = Stage::RequestPost;
        for hook in self.hooks(op, stage) {
            let payload = Payload::PutResponse {
                request: &request,
                options: &options,
                error: result.as_ref().err(),
            };
            let mut actions = self.dispatch(hook, op, stage, payload).await?;
            if let Some(err) = actions.error.take() {
                result = Err(err);
            }
            actions.finish(op, stage);
        }
        result
    }

    /// Writes an entity with default options.
    pub async fn save(&self, entity: &mut Entity) -> ModelResult<()> {
        self.put(entity, WriteOptions::default()).await
    }

    /// Writes an entity only if no item with its key exists.
    pub async fn create(&self, entity: &mut Entity) -> ModelResult<()> {
        let options = WriteOptions::new()
            .with_condition(Condition::attribute_not_exists(self.schema.hash_key()));
        self.put(entity, options).await
    }

    /// Writes several entities in chunks, without conditions.
    pub async fn batch_put(&self, entities: &mut [Entity]) -> ModelResult<BatchPutOutput> {
        let op = Operation::BatchPut;
        let mut options = WriteOptions::default();

        let stage = Stage::Called;
        for hook in self.hooks(op, stage) {
            let payload = Payload::BatchPutCalled {
                entities: &mut *entities,
                options: &options,
            };
            let mut actions = self.dispatch(hook, op, stage, payload).await?;
            if let Some(updated) = actions.options.take() {
                options = updated;
            }
            actions.finish(op, stage);
        }

        let mut requests: Vec<BatchWriteRequest> = entities
            .chunks(MAX_BATCH_WRITE_ITEMS)
            .map(|chunk| BatchWriteRequest {
                table: self.name.clone(),
                items: chunk.iter().map(|e| self.schema.encode(e)).collect(),
            })
            .collect();

        let stage = Stage::RequestPre;
        for hook in self.hooks(op, stage) {
            let payload = Payload::BatchPutRequest {
                requests: &requests,
                options: &options,
            };
            let mut actions = self.dispatch(hook, op, stage, payload).await?;
            if let Some(updated) = actions.options.take() {
                options = updated;
            }
            if let Some(items) = actions.items.take() {
                redistribute(&mut requests, items)?;
            }
            actions.finish(op, stage);
        }

        let mut unprocessed: Vec<Attributes> = Vec::new();
        let mut result: ModelResult<()> = Ok(());
        for request in &requests {
            match self.backend.batch_write_items(request).await {
                Ok(rest) => unprocessed.extend(rest),
                Err(err) => {
                    result = Err(err.into());
                    break;
                }
            }
        }

        let stage = Stage::RequestPost;
        for hook in self.hooks(op, stage) {
            let payload = Payload::BatchPutResponse {
                requests: &requests,
                unprocessed: &unprocessed,
                error: result.as_ref().err(),
            };
            let mut actions = self.dispatch(hook, op, stage, payload).await?;
            if let Some(err) = actions.error.take() {
                result = Err(err);
            }
            actions.finish(op, stage);
        }
        result?;

        let unprocessed = unprocessed
            .into_iter()
            .map(|item| self.schema.decode(item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BatchPutOutput { unprocessed })
    }

    /// Applies an update expression to the item at `key` and returns the
    /// stored result. The item is created if absent.
    pub async fn update(
        &self,
        key: &Key,
        expression: UpdateExpression,
        options: WriteOptions,
    ) -> ModelResult<Entity> {
        let op = Operation::Update;
        let mut expression = expression;
        let mut options = options;

        let stage = Stage::Called;
        for hook in self.hooks(op, stage) {
            let payload = Payload::UpdateCalled {
                key,
                expression: &expression,
                options: &options,
            };
            let mut actions = self.dispatch(hook, op, stage, payload).await?;
            if let Some(updated) = actions.expression.take() {
                expression = updated;
            }
            if let Some(updated) = actions.options.take() {
                options = updated;
            }
            actions.finish(op, stage);
        }

        let mut request = UpdateRequest {
            table: self.name.clone(),
            key: key.clone(),
            expression,
            condition: options.condition.clone(),
        };

        let stage = Stage::RequestPre;
        for hook in self.hooks(op, stage) {
            let payload = Payload::UpdateRequest {
                request: &request,
                options: &options,
            };
            let mut actions = self.dispatch(hook, op, stage, payload).await?;
            if let Some(updated) = actions.expression.take() {
                request.expression = updated;
            }
            if let Some(updated) = actions.options.take() {
                request.condition = updated.condition.clone();
                options = updated;
            }
            actions.finish(op, stage);
        }

        let mut result = match self.backend.update_item(&request).await {
            Ok(item) => self.schema.decode(item).map_err(ModelError::from),
            Err(err) => Err(err.into()),
        };

        let stage = Stage::RequestPost;
        for hook in self.hooks(op, stage) {
            let payload = Payload::UpdateResponse {
                request: &request,
                data: result.as_ref().ok(),
                error: result.as_ref().err(),
            };
            let mut actions = self.dispatch(hook, op, stage, payload).await?;
            if let Some(err) = actions.error.take() {
                result = Err(err);
            }
            actions.finish(op, stage);
        }
        result
    }

    // ================================================================
    // Hook dispatch
    // ================================================================

    fn hooks(&self, operation: Operation, stage: Stage) -> impl Iterator<Item = &Arc<dyn Hook>> + '_ {
        self.plugins
            .iter()
            .filter_map(move |registry| registry.get(operation, stage))
    }

    async fn dispatch(
        &self,
        hook: &Arc<dyn Hook>,
        operation: Operation,
        stage: Stage,
        payload: Payload<'_>,
    ) -> ModelResult<Actions> {
        debug!(model = %self.name, "{operation}:{stage}");
        let mut actions = Actions::default();
        let event = HookEvent {
            model: self,
            operation,
            stage,
            payload,
        };
        match hook.handle(event, &mut actions).await {
            HookOutcome::Continue => Ok(actions),
            HookOutcome::Reject(err) => {
                debug!(model = %self.name, %operation, %stage, error = %err, "Hook rejected operation");
                Err(err)
            }
        }
    }
}

/// Puts a flattened item list back into the per-chunk requests, by position.
fn redistribute(requests: &mut [BatchWriteRequest], items: Vec<Attributes>) -> ModelResult<()> {
    let expected: usize = requests.iter().map(|r| r.items.len()).sum();
    if items.len() != expected {
        return Err(StoreError::validation(format!(
            "hook returned {} batch items, expected {expected}",
            items.len()
        ))
        .into());
    }
    let mut items = items.into_iter();
    for request in requests.iter_mut() {
        for slot in request.items.iter_mut() {
            if let Some(item) = items.next() {
                *slot = item;
            }
        }
    }
    Ok(())
}

//! Stage hooks.
//!
//! Every model operation runs through three stages: `called` (before any
//! request is built), `request:pre` (before the request is sent) and
//! `request:post` (once the response or error is known). A [`HookRegistry`]
//! holds at most one [`Hook`] per (operation, stage) slot; a model awaits each
//! installed registry's hook in installation order before moving on.
//!
//! Hooks observe a [`HookEvent`] and request changes through [`Actions`];
//! the model applies the actions that make sense for the stage and logs the
//! rest. Returning [`HookOutcome::Reject`] aborts the whole operation.

use crate::error::ModelError;
use crate::model::Model;
use crate::options::WriteOptions;
use crate::request::{BatchWriteRequest, PutRequest, UpdateRequest};
use crate::update::UpdateExpression;
use async_trait::async_trait;
use optilock_model::Entity;
use optilock_types::{Attributes, Key};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Model operation categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    Get,
    BatchGet,
    Put,
    BatchPut,
    Update,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "get",
            Self::BatchGet => "batchGet",
            Self::Put => "put",
            Self::BatchPut => "batchPut",
            Self::Update => "update",
        })
    }
}

/// Lifecycle stages of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Called,
    RequestPre,
    RequestPost,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Called => "called",
            Self::RequestPre => "request:pre",
            Self::RequestPost => "request:post",
        })
    }
}

/// Stage-specific data of a [`HookEvent`].
///
/// The `called` payloads of writes hand out the caller's entities mutably so
/// that hooks can update hidden slots in place. Everything else is read-only.
pub enum Payload<'a> {
    /// Any stage of `get`. `data` and `error` are only set at `request:post`.
    Get {
        key: &'a Key,
        data: Option<&'a Entity>,
        error: Option<&'a ModelError>,
    },
    /// Any stage of `batchGet`. `data` and `error` are only set at `request:post`.
    BatchGet {
        keys: &'a [Key],
        data: &'a [Entity],
        error: Option<&'a ModelError>,
    },
    PutCalled {
        entity: &'a mut Entity,
        options: &'a WriteOptions,
    },
    PutRequest {
        request: &'a PutRequest,
        options: &'a WriteOptions,
    },
    PutResponse {
        request: &'a PutRequest,
        options: &'a WriteOptions,
        error: Option<&'a ModelError>,
    },
    BatchPutCalled {
        entities: &'a mut [Entity],
        options: &'a WriteOptions,
    },
    /// The per-chunk write requests, in order.
    BatchPutRequest {
        requests: &'a [BatchWriteRequest],
        options: &'a WriteOptions,
    },
    BatchPutResponse {
        requests: &'a [BatchWriteRequest],
        unprocessed: &'a [Attributes],
        error: Option<&'a ModelError>,
    },
    UpdateCalled {
        key: &'a Key,
        expression: &'a UpdateExpression,
        options: &'a WriteOptions,
    },
    UpdateRequest {
        request: &'a UpdateRequest,
        options: &'a WriteOptions,
    },
    UpdateResponse {
        request: &'a UpdateRequest,
        data: Option<&'a Entity>,
        error: Option<&'a ModelError>,
    },
}

/// What a hook sees.
pub struct HookEvent<'a> {
    pub model: &'a Model,
    pub operation: Operation,
    pub stage: Stage,
    pub payload: Payload<'a>,
}

/// Changes a hook asks the model to make.
#[derive(Debug, Default)]
pub struct Actions {
    pub(crate) options: Option<WriteOptions>,
    pub(crate) item: Option<Attributes>,
    pub(crate) items: Option<Vec<Attributes>>,
    pub(crate) expression: Option<UpdateExpression>,
    pub(crate) error: Option<ModelError>,
}

impl Actions {
    /// Replaces the pending write options.
    pub fn update_options(&mut self, options: WriteOptions) {
        self.options = Some(options);
    }

    /// Replaces the outgoing item of a single-item write.
    pub fn update_item(&mut self, item: Attributes) {
        self.item = Some(item);
    }

    /// Replaces the outgoing items of a batch write, flattened across requests.
    pub fn update_items(&mut self, items: Vec<Attributes>) {
        self.items = Some(items);
    }

    /// Replaces the pending update expression.
    pub fn update_expression(&mut self, expression: UpdateExpression) {
        self.expression = Some(expression);
    }

    /// Replaces the outgoing error at `request:post`.
    pub fn update_error(&mut self, error: ModelError) {
        self.error = Some(error);
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_none()
            && self.item.is_none()
            && self.items.is_none()
            && self.expression.is_none()
            && self.error.is_none()
    }

    /// Logs every action the model did not take out.
    pub(crate) fn finish(self, operation: Operation, stage: Stage) {
        let unapplied = [
            ("update_options", self.options.is_some()),
            ("update_item", self.item.is_some()),
            ("update_items", self.items.is_some()),
            ("update_expression", self.expression.is_some()),
            ("update_error", self.error.is_some()),
        ];
        for (action, _) in unapplied.iter().filter(|(_, set)| *set) {
            warn!(%operation, %stage, action = %action, "Hook action does not apply to this stage; ignored");
        }
    }
}

/// How a hook wants the operation to proceed.
#[derive(Debug)]
pub enum HookOutcome {
    Continue,
    /// Abort the operation with the given error.
    Reject(ModelError),
}

/// A callback bound to one (operation, stage) slot.
#[async_trait]
pub trait Hook: Send + Sync {
    async fn handle(&self, event: HookEvent<'_>, actions: &mut Actions) -> HookOutcome;
}

/// The hooks of one configured plugin instance.
pub struct HookRegistry {
    name: String,
    hooks: HashMap<(Operation, Stage), Arc<dyn Hook>>,
}

impl HookRegistry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hooks: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binds `hook` to a slot, returning the hook it replaces.
    ///
    /// Registering `None` leaves the slot empty.
    pub fn register(
        &mut self,
        operation: Operation,
        stage: Stage,
        hook: Option<Arc<dyn Hook>>,
    ) -> Option<Arc<dyn Hook>> {
        match hook {
            Some(hook) => self.hooks.insert((operation, stage), hook),
            None => self.hooks.remove(&(operation, stage)),
        }
    }

    pub fn get(&self, operation: Operation, stage: Stage) -> Option<&Arc<dyn Hook>> {
        self.hooks.get(&(operation, stage))
    }

    pub fn contains(&self, operation: Operation, stage: Stage) -> bool {
        self.hooks.contains_key(&(operation, stage))
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Occupied slots, sorted.
    pub fn slots(&self) -> Vec<(Operation, Stage)> {
        let mut slots: Vec<_> = self.hooks.keys().copied().collect();
        slots.sort();
        slots
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("name", &self.name)
            .field("slots", &self.slots())
            .finish()
    }
}

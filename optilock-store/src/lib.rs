//! Keyed store pipeline for optilock.
//!
//! This crate is the host side that the locking engine plugs into:
//! - [`Condition`] / [`UpdateExpression`]: conditional-write predicates and
//!   partial-update expressions
//! - [`StorageBackend`]: the keyed-store interface, with an in-memory
//!   implementation in [`MemoryBackend`]
//! - [`Model`]: a table bound to a backend, running every operation through
//!   `called`, `request:pre` and `request:post` stages
//! - [`HookRegistry`] / [`Hook`]: per-plugin callbacks for those stages

mod backend;
mod condition;
mod error;
mod hooks;
mod memory;
mod model;
mod options;
mod request;
mod update;

pub use backend::StorageBackend;
pub use condition::{Comparator, Condition, Operand, Predicate};
pub use error::{
    CONDITIONAL_CHECK_FAILED_MESSAGE, ConditionError, ErrorCode, ErrorMetadata, ModelError,
    ModelResult, StoreError, StoreResult,
};
pub use hooks::{Actions, Hook, HookEvent, HookOutcome, HookRegistry, Operation, Payload, Stage};
pub use memory::{BackendOp, MemoryBackend};
pub use model::{BatchPutOutput, Model};
pub use options::{VersionContext, WriteOptions};
pub use request::{
    BatchGetRequest, BatchWriteRequest, GetRequest, MAX_BATCH_GET_KEYS, MAX_BATCH_WRITE_ITEMS,
    PutRequest, UpdateRequest,
};
pub use update::UpdateExpression;

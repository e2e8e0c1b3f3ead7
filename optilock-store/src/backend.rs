//! Storage backend abstraction.
//!
//! Defines the keyed-store interface the model pipeline talks to.

use crate::error::StoreResult;
use crate::request::{BatchGetRequest, BatchWriteRequest, GetRequest, PutRequest, UpdateRequest};
use async_trait::async_trait;
use optilock_types::Attributes;

/// Abstract keyed store.
///
/// Implementations must evaluate a write's condition and apply the write
/// atomically with respect to other writes to the same item.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Returns the name of the backend.
    fn name(&self) -> &'static str;

    /// Reads one item.
    async fn get_item(&self, request: &GetRequest) -> StoreResult<Option<Attributes>>;

    /// Reads several items. Missing keys are skipped; order is unspecified.
    async fn batch_get_items(&self, request: &BatchGetRequest) -> StoreResult<Vec<Attributes>>;

    /// Writes one item, failing with a conditional-check error if the
    /// request's condition does not hold for the stored item.
    async fn put_item(&self, request: &PutRequest) -> StoreResult<()>;

    /// Writes several items without conditions.
    /// Returns the items the backend did not process.
    async fn batch_write_items(&self, request: &BatchWriteRequest) -> StoreResult<Vec<Attributes>>;

    /// Applies an update expression and returns the resulting item.
    async fn update_item(&self, request: &UpdateRequest) -> StoreResult<Attributes>;
}

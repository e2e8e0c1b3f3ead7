//! Requests sent to a storage backend.

use crate::condition::Condition;
use crate::update::UpdateExpression;
use optilock_types::{Attributes, Key};

/// Maximum number of items in one batch write request.
pub const MAX_BATCH_WRITE_ITEMS: usize = 25;

/// Maximum number of keys in one batch get request.
pub const MAX_BATCH_GET_KEYS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct GetRequest {
    pub table: String,
    pub key: Key,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchGetRequest {
    pub table: String,
    pub keys: Vec<Key>,
}

/// A single-item write, optionally conditioned on the stored item.
#[derive(Debug, Clone, PartialEq)]
pub struct PutRequest {
    pub table: String,
    pub item: Attributes,
    pub condition: Option<Condition>,
}

/// An unconditioned multi-item write.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchWriteRequest {
    pub table: String,
    pub items: Vec<Attributes>,
}

/// A partial update of one item, creating it if absent.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    pub table: String,
    pub key: Key,
    pub expression: UpdateExpression,
    pub condition: Option<Condition>,
}

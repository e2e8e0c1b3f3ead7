//! Shared test helpers for locking tests.

#![allow(dead_code)]

use optilock::{OptimisticLocking, OptimisticLockingConfig, VersionedModel};
use optilock_model::{Entity, Schema};
use optilock_store::{MemoryBackend, Model};
use optilock_types::{Key, Version};
use serde_json::json;
use std::sync::Arc;

pub const TABLE: &str = "BookCollection";

/// Installs test logging once; honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn book_schema() -> Schema {
    Schema::new(TABLE, "author")
}

/// Backend with the book table and a locked model over it.
pub fn make_books(config: OptimisticLockingConfig) -> (Arc<MemoryBackend>, VersionedModel) {
    init_tracing();
    let backend = Arc::new(MemoryBackend::new().with_table(&book_schema()));
    let locking = OptimisticLocking::new(config).unwrap();
    let model = locking
        .install(Model::new(book_schema(), backend.clone()))
        .unwrap();
    (backend, model)
}

pub fn fetching() -> OptimisticLockingConfig {
    OptimisticLockingConfig::default().with_fetch_on_conflict(true)
}

pub fn book(author: &str) -> Entity {
    Entity::from_value(json!({"author": author, "books": []})).unwrap()
}

pub fn key(author: &str) -> Key {
    Key::hash("author", author).unwrap()
}

/// Version persisted in the backend, read from the raw item.
pub async fn stored_version(backend: &MemoryBackend, author: &str) -> Option<Version> {
    let item = backend.raw_item(TABLE, &key(author)).await?;
    item.get("__version").map(|v| Version::try_from(v).unwrap())
}

pub fn books_len(entity: &Entity) -> usize {
    entity.get_array("/books").map_or(0, Vec::len)
}

// ── Hash + range key table ───────────────────────────────────────

pub const SHELF_TABLE: &str = "Shelves";

pub fn shelf_schema() -> Schema {
    Schema::new(SHELF_TABLE, "shelf").with_range_key("slot")
}

/// Backend with the shelf table and a locked model over it.
pub fn make_shelves(config: OptimisticLockingConfig) -> (Arc<MemoryBackend>, VersionedModel) {
    init_tracing();
    let backend = Arc::new(MemoryBackend::new().with_table(&shelf_schema()));
    let locking = OptimisticLocking::new(config).unwrap();
    let model = locking
        .install(Model::new(shelf_schema(), backend.clone()))
        .unwrap();
    (backend, model)
}

pub fn shelf_item(shelf: &str, slot: &str) -> Entity {
    Entity::from_value(json!({"shelf": shelf, "slot": slot, "books": []})).unwrap()
}

pub fn shelf_key(shelf: &str, slot: &str) -> Key {
    Key::hash("shelf", shelf)
        .unwrap()
        .with_range("slot", slot)
        .unwrap()
}

pub async fn stored_shelf_version(backend: &MemoryBackend, shelf: &str, slot: &str) -> Option<Version> {
    let item = backend.raw_item(SHELF_TABLE, &shelf_key(shelf, slot)).await?;
    item.get("__version").map(|v| Version::try_from(v).unwrap())
}

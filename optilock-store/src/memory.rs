//! In-memory storage backend.
//!
//! Tables are `BTreeMap`s keyed by [`Key::storage_id`] behind one tokio
//! `RwLock`. A conditional write evaluates its condition and applies the write
//! under the same write guard, so concurrent writers to one item serialize.

use crate::backend::StorageBackend;
use crate::error::{StoreError, StoreResult};
use crate::request::{
    BatchGetRequest, BatchWriteRequest, GetRequest, PutRequest, UpdateRequest, MAX_BATCH_GET_KEYS,
    MAX_BATCH_WRITE_ITEMS,
};
use async_trait::async_trait;
use optilock_model::Schema;
use optilock_types::{Attributes, Key};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Backend operations, for call counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    Get,
    BatchGet,
    Put,
    BatchWrite,
    Update,
}

impl BackendOp {
    const ALL: [BackendOp; 5] = [
        BackendOp::Get,
        BackendOp::BatchGet,
        BackendOp::Put,
        BackendOp::BatchWrite,
        BackendOp::Update,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

struct Table {
    schema: Schema,
    items: BTreeMap<String, Attributes>,
}

impl Table {
    fn key_of(&self, item: &Attributes) -> StoreResult<Key> {
        self.schema
            .key_of(item)
            .map_err(|e| StoreError::validation(e.to_string()))
    }
}

/// A [`StorageBackend`] held entirely in memory.
pub struct MemoryBackend {
    tables: RwLock<HashMap<String, Table>>,
    calls: [AtomicU64; 5],
    failures: Mutex<HashMap<BackendOp, VecDeque<StoreError>>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            calls: Default::default(),
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Adds a table using the key layout of `schema`.
    pub fn with_table(mut self, schema: &Schema) -> Self {
        self.tables
            .get_mut()
            .insert(schema.table().to_string(), Self::table_for(schema));
        self
    }

    /// Adds a table, keeping existing items if it already exists.
    pub async fn create_table(&self, schema: &Schema) {
        self.tables
            .write()
            .await
            .entry(schema.table().to_string())
            .or_insert_with(|| Self::table_for(schema));
    }

    fn table_for(schema: &Schema) -> Table {
        Table {
            schema: schema.clone(),
            items: BTreeMap::new(),
        }
    }

    /// Number of calls made for `op`, including failed ones.
    pub fn calls(&self, op: BackendOp) -> u64 {
        self.calls[op.index()].load(Ordering::SeqCst)
    }

    /// Total number of calls across all operations.
    pub fn total_calls(&self) -> u64 {
        BackendOp::ALL.iter().map(|op| self.calls(*op)).sum()
    }

    /// Makes the next call of `op` fail with `error`.
    ///
    /// Injected failures queue up and are consumed one per call.
    pub async fn inject_failure(&self, op: BackendOp, error: StoreError) {
        self.failures
            .lock()
            .await
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// Returns the raw stored item, hidden attributes included.
    pub async fn raw_item(&self, table: &str, key: &Key) -> Option<Attributes> {
        let tables = self.tables.read().await;
        tables.get(table)?.items.get(&key.storage_id()).cloned()
    }

    /// Stores an item unconditionally, bypassing counters.
    pub async fn insert_raw(&self, table: &str, item: Attributes) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::resource_not_found(table))?;
        let key = t.key_of(&item)?;
        t.items.insert(key.storage_id(), item);
        Ok(())
    }

    /// Number of items stored in `table`.
    pub async fn item_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map_or(0, |t| t.items.len())
    }

    async fn begin(&self, op: BackendOp) -> StoreResult<()> {
        self.calls[op.index()].fetch_add(1, Ordering::SeqCst);
        let injected = self
            .failures
            .lock()
            .await
            .get_mut(&op)
            .and_then(VecDeque::pop_front);
        match injected {
            Some(error) => {
                debug!(?op, error = %error, "Injected backend failure");
                Err(error)
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get_item(&self, request: &GetRequest) -> StoreResult<Option<Attributes>> {
        self.begin(BackendOp::Get).await?;
        let tables = self.tables.read().await;
        let table = tables
            .get(&request.table)
            .ok_or_else(|| StoreError::resource_not_found(&request.table))?;
        Ok(table.items.get(&request.key.storage_id()).cloned())
    }

    async fn batch_get_items(&self, request: &BatchGetRequest) -> StoreResult<Vec<Attributes>> {
        self.begin(BackendOp::BatchGet).await?;
        if request.keys.len() > MAX_BATCH_GET_KEYS {
            return Err(StoreError::validation(format!(
                "Too many items requested for the BatchGetItem call: {}",
                request.keys.len()
            )));
        }
        let tables = self.tables.read().await;
        let table = tables
            .get(&request.table)
            .ok_or_else(|| StoreError::resource_not_found(&request.table))?;
        Ok(request
            .keys
            .iter()
            .filter_map(|key| table.items.get(&key.storage_id()).cloned())
            .collect())
    }

    async fn put_item(&self, request: &PutRequest) -> StoreResult<()> {
        self.begin(BackendOp::Put).await?;
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(&request.table)
            .ok_or_else(|| StoreError::resource_not_found(&request.table))?;
        let id = table.key_of(&request.item)?.storage_id();
        if let Some(condition) = &request.condition {
            let holds = condition
                .evaluate(table.items.get(&id))
                .map_err(|e| StoreError::validation(e.to_string()))?;
            if !holds {
                debug!(table = %request.table, condition = %condition, "Conditional put rejected");
                return Err(StoreError::conditional_check_failed());
            }
        }
        table.items.insert(id, request.item.clone());
        Ok(())
    }

    async fn batch_write_items(&self, request: &BatchWriteRequest) -> StoreResult<Vec<Attributes>> {
        self.begin(BackendOp::BatchWrite).await?;
        if request.items.len() > MAX_BATCH_WRITE_ITEMS {
            return Err(StoreError::validation(format!(
                "Too many items in the BatchWriteItem call: {}",
                request.items.len()
            )));
        }
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(&request.table)
            .ok_or_else(|| StoreError::resource_not_found(&request.table))?;
        let mut staged = Vec::with_capacity(request.items.len());
        for item in &request.items {
            staged.push((table.key_of(item)?.storage_id(), item.clone()));
        }
        table.items.extend(staged);
        Ok(Vec::new())
    }

    async fn update_item(&self, request: &UpdateRequest) -> StoreResult<Attributes> {
        self.begin(BackendOp::Update).await?;
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(&request.table)
            .ok_or_else(|| StoreError::resource_not_found(&request.table))?;
        let id = request.key.storage_id();
        let existing = table.items.get(&id);
        if let Some(condition) = &request.condition {
            let holds = condition
                .evaluate(existing)
                .map_err(|e| StoreError::validation(e.to_string()))?;
            if !holds {
                return Err(StoreError::conditional_check_failed());
            }
        }
        let mut item = existing
            .cloned()
            .unwrap_or_else(|| request.key.to_attributes());
        request.expression.apply(&mut item)?;
        for (name, value) in request.key.to_attributes() {
            item.insert(name, value);
        }
        table.items.insert(id, item.clone());
        Ok(item)
    }
}

//! Optimistic locking for keyed stores.
//!
//! Installs into a [`Model`](optilock_store::Model) as a set of stage hooks:
//! - every write is stamped with the entity's next version and conditioned on
//!   the stored version being older
//! - a rejected write can be classified as a version conflict by fetching the
//!   stored entity ([`OptimisticLockError`])
//! - [`VersionedModel::put_next_version`] retries a read-modify-write against
//!   the stored copy until it wins or runs out of attempts
//!
//! ```no_run
//! use optilock::{OptimisticLocking, OptimisticLockingConfig, PutNextVersionOptions};
//! use optilock_model::{Entity, Schema};
//! use optilock_store::{MemoryBackend, Model};
//! use std::sync::Arc;
//!
//! # async fn run() -> optilock::LockResult<()> {
//! let schema = Schema::new("BookCollection", "author");
//! let backend = Arc::new(MemoryBackend::new().with_table(&schema));
//! let locking = OptimisticLocking::new(
//!     OptimisticLockingConfig::default().with_fetch_on_conflict(true),
//! )?;
//! let books = locking.install(Model::new(schema, backend))?;
//!
//! let entity = Entity::from_value(serde_json::json!({"author": "Eoin Colfer"}))?;
//! let result = books
//!     .put_next_version(
//!         entity,
//!         |e: &mut Entity| e.push("books", "Artemis Fowl"),
//!         PutNextVersionOptions::new().with_max_attempts(3),
//!     )
//!     .await?;
//! assert!(result.written);
//! # Ok(())
//! # }
//! ```

mod condition;
mod config;
mod error;
mod listeners;
mod plugin;
mod retry;
mod version;

pub use condition::{ConditionBuilder, NAME_PLACEHOLDER, VALUE_PLACEHOLDER};
pub use config::{DEFAULT_ATTRIBUTE_NAME, OptimisticLockingConfig};
pub use error::{CONFLICT_MESSAGE, LockError, LockResult, OptimisticLockError};
pub use plugin::{OptimisticLocking, VersionedModel};
pub use retry::{Mutator, PutNextVersionOptions, PutNextVersionResult};
pub use version::VersionStore;

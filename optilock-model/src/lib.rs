//! Entity model for optilock.
//!
//! Defines the types the host pipeline and the locking engine exchange:
//! - [`Entity`]: a stored record: visible attributes plus hidden slots
//! - [`Schema`]: a table's key layout and its hidden attribute declarations
//!
//! Hidden slots are how per-entity bookkeeping (such as the write version)
//! rides along with a record without ever appearing in its attribute set.

mod entity;
mod error;
mod schema;

pub use entity::Entity;
pub use error::{SchemaError, SchemaResult};
pub use schema::{HiddenAttribute, Schema};

//! Core type definitions for optilock.
//!
//! This crate defines the small, store-agnostic types shared by the model,
//! the host pipeline and the locking engine:
//! - [`Version`]: the per-entity write counter
//! - [`FieldHandle`]: an opaque handle naming a hidden per-entity slot
//! - [`Key`]: a primary key (hash key, optional range key)
//! - [`Attributes`]: the JSON attribute map of a stored item

mod field;
mod key;
mod version;

pub use field::FieldHandle;
pub use key::{Attributes, Key, KeyPart};
pub use version::Version;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid version value: {0}")]
    InvalidVersion(String),

    #[error("invalid key value for '{attribute}': expected string or number")]
    InvalidKeyValue { attribute: String },
}

//! Error types for the entity model.

use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while mapping between stored items and entities.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A key attribute is missing from an item.
    #[error("item for table '{table}' is missing key attribute '{attribute}'")]
    MissingKeyAttribute { table: String, attribute: String },

    /// A key attribute or hidden value has the wrong type.
    #[error(transparent)]
    InvalidValue(#[from] optilock_types::Error),

    /// A hidden attribute clashes with a key attribute or another declaration.
    #[error("hidden attribute '{0}' conflicts with an existing attribute declaration")]
    HiddenAttributeConflict(String),

    /// The JSON value is not an object.
    #[error("entity data must be a JSON object")]
    NotAnObject,
}

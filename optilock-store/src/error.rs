//! Error types for the store pipeline.

use optilock_model::SchemaError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for backend calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Message of a rejected conditional write.
pub const CONDITIONAL_CHECK_FAILED_MESSAGE: &str = "The conditional request failed";

/// Machine-readable category of a backend error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    ConditionalCheckFailed,
    ProvisionedThroughputExceeded,
    ResourceNotFound,
    Validation,
    Transport,
    Internal,
}

/// Everything about a backend error except its message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMetadata {
    pub code: ErrorCode,
    pub status_code: u16,
    pub request_id: Option<String>,
    pub retryable: bool,
}

impl ErrorMetadata {
    pub fn new(code: ErrorCode, status_code: u16, retryable: bool) -> Self {
        Self {
            code,
            status_code,
            request_id: None,
            retryable,
        }
    }
}

/// An error returned by a storage backend.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
    pub metadata: ErrorMetadata,
}

impl StoreError {
    pub fn new(message: impl Into<String>, metadata: ErrorMetadata) -> Self {
        Self {
            message: message.into(),
            metadata,
        }
    }

    /// A conditional write whose predicate evaluated false.
    pub fn conditional_check_failed() -> Self {
        Self::new(
            CONDITIONAL_CHECK_FAILED_MESSAGE,
            ErrorMetadata::new(ErrorCode::ConditionalCheckFailed, 400, false),
        )
    }

    pub fn throughput_exceeded() -> Self {
        Self::new(
            "The level of configured provisioned throughput for the table was exceeded",
            ErrorMetadata::new(ErrorCode::ProvisionedThroughputExceeded, 400, true),
        )
    }

    pub fn resource_not_found(table: &str) -> Self {
        Self::new(
            format!("Requested resource not found: table '{table}'"),
            ErrorMetadata::new(ErrorCode::ResourceNotFound, 400, false),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(
            message,
            ErrorMetadata::new(ErrorCode::Validation, 400, false),
        )
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(message, ErrorMetadata::new(ErrorCode::Transport, 503, true))
    }

    /// Attaches a request id to the metadata.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.metadata.request_id = Some(request_id.into());
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.metadata.code
    }

    pub fn is_conditional_check_failed(&self) -> bool {
        self.metadata.code == ErrorCode::ConditionalCheckFailed
    }
}

/// Errors in building or evaluating condition expressions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    /// An expression references a placeholder that has no binding.
    #[error("unknown placeholder '{0}'")]
    UnknownPlaceholder(String),

    /// Two conditions bind the same placeholder to different things.
    #[error("placeholder '{0}' is bound by both conditions")]
    PlaceholderCollision(String),
}

/// Errors surfaced by model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The backend rejected or failed the request.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A stored item could not be mapped to or from an entity.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A condition expression is malformed.
    #[error(transparent)]
    Condition(#[from] ConditionError),

    /// A hook rejected the operation or replaced its error.
    #[error("{0}")]
    Hook(Box<dyn std::error::Error + Send + Sync>),
}

impl ModelError {
    /// Wraps any error raised by a hook.
    pub fn hook(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Hook(error.into())
    }

    /// Returns the backend error, if this is one.
    pub fn as_store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_conditional_check_failed(&self) -> bool {
        self.as_store_error()
            .is_some_and(StoreError::is_conditional_check_failed)
    }
}

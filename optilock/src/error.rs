//! Error types for the locking engine.

use optilock_model::{Entity, SchemaError};
use optilock_store::{ErrorMetadata, ModelError};
use optilock_types::Version;
use thiserror::Error;

/// Result type for locking operations.
pub type LockResult<T> = Result<T, LockError>;

/// Message of a version conflict.
pub const CONFLICT_MESSAGE: &str = "Cannot overwrite newer version";

/// A write was rejected because the stored entity has a newer version.
///
/// Carries the stored entity as fetched after the rejection, the metadata of
/// the backend error it replaces, and the number of attempts once the retry
/// loop gives up.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct OptimisticLockError {
    message: String,
    stored: Entity,
    attempts: Option<u32>,
    metadata: Option<ErrorMetadata>,
}

impl OptimisticLockError {
    pub fn new(stored: Entity, metadata: Option<ErrorMetadata>) -> Self {
        Self {
            message: CONFLICT_MESSAGE.to_string(),
            stored,
            attempts: None,
            metadata,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The entity currently stored, hidden version included.
    pub fn stored(&self) -> &Entity {
        &self.stored
    }

    pub fn into_stored(self) -> Entity {
        self.stored
    }

    /// Write attempts made, when raised by the retry loop.
    pub fn attempts(&self) -> Option<u32> {
        self.attempts
    }

    /// Fields of the original backend error, except its message.
    pub fn metadata(&self) -> Option<&ErrorMetadata> {
        self.metadata.as_ref()
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }
}

/// Errors surfaced by the locking engine.
#[derive(Debug, Error)]
pub enum LockError {
    /// The retry loop needs the stored entity on conflict.
    #[error("retry-on-conflict requires fetch-on-conflict enabled")]
    FetchOnConflictRequired,

    /// A batch write was attempted without opting in.
    #[error("batch writes unsupported under optimistic locking")]
    BatchUnsupported,

    /// The submitted version is not newer than the stored one.
    #[error(transparent)]
    Conflict(OptimisticLockError),

    /// A non-conflict failure inside the retry loop.
    #[error("write failed after {attempts} attempt(s): {source}")]
    WriteFailed {
        attempts: u32,
        #[source]
        source: Box<LockError>,
    },

    /// A failure reported by the model pipeline or its backend.
    #[error(transparent)]
    Model(ModelError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The entity's version has no successor.
    #[error("version {0} cannot be incremented")]
    VersionOverflow(Version),

    /// A request stage ran without the version computed at `called`.
    #[error("no version context for {0}")]
    MissingVersionContext(&'static str),
}

impl LockError {
    /// Returns the conflict, looking through a retry annotation.
    pub fn conflict(&self) -> Option<&OptimisticLockError> {
        match self {
            Self::Conflict(conflict) => Some(conflict),
            Self::WriteFailed { source, .. } => source.conflict(),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.conflict().is_some()
    }

    /// Attempts made before the error, when raised by the retry loop.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Conflict(conflict) => conflict.attempts(),
            Self::WriteFailed { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// The stored entity carried by a conflict.
    pub fn stored_entity(&self) -> Option<&Entity> {
        self.conflict().map(OptimisticLockError::stored)
    }

    /// The error underneath any retry annotation.
    pub fn root(&self) -> &LockError {
        match self {
            Self::WriteFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns true for a raw conditional-check rejection from the backend.
    pub fn is_conditional_check_failed(&self) -> bool {
        matches!(self.root(), Self::Model(err) if err.is_conditional_check_failed())
    }
}

/// Hook errors travel through the model boxed; recover the typed ones.
impl From<ModelError> for LockError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Hook(boxed) => match boxed.downcast::<OptimisticLockError>() {
                Ok(conflict) => Self::Conflict(*conflict),
                Err(boxed) => match boxed.downcast::<LockError>() {
                    Ok(lock) => *lock,
                    Err(boxed) => Self::Model(ModelError::Hook(boxed)),
                },
            },
            ModelError::Schema(err) => Self::Schema(err),
            other => Self::Model(other),
        }
    }
}

impl From<OptimisticLockError> for LockError {
    fn from(err: OptimisticLockError) -> Self {
        Self::Conflict(err)
    }
}

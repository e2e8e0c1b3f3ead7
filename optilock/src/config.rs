//! Locking configuration.
//!
//! Configs can be built in code or loaded from TOML:
//!
//! ```toml
//! attribute_name = "version"
//! fetch_on_conflict = true
//! allow_unsupported_batch = false
//! ```

use crate::error::{LockError, LockResult};
use optilock_types::FieldHandle;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Default name of the persisted version attribute.
pub const DEFAULT_ATTRIBUTE_NAME: &str = "__version";

fn default_attribute_name() -> String {
    DEFAULT_ATTRIBUTE_NAME.to_string()
}

/// Settings of one optimistic-locking instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimisticLockingConfig {
    /// Name of the persisted version attribute.
    #[serde(default = "default_attribute_name")]
    pub attribute_name: String,

    /// Hidden slot holding the in-memory version. Fresh per config.
    #[serde(skip)]
    pub version_field: FieldHandle,

    /// Fetch the stored entity when a conditional write is rejected, so that
    /// version conflicts can be told apart from other rejections.
    #[serde(default, alias = "fetch_item_on_write_error")]
    pub fetch_on_conflict: bool,

    /// Permit batch writes, which are stamped but not conditioned.
    #[serde(default, alias = "allow_unsupported")]
    pub allow_unsupported_batch: bool,
}

impl Default for OptimisticLockingConfig {
    fn default() -> Self {
        Self {
            attribute_name: default_attribute_name(),
            version_field: FieldHandle::new(),
            fetch_on_conflict: false,
            allow_unsupported_batch: false,
        }
    }
}

impl OptimisticLockingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute_name(mut self, name: impl Into<String>) -> Self {
        self.attribute_name = name.into();
        self
    }

    pub fn with_version_field(mut self, field: FieldHandle) -> Self {
        self.version_field = field;
        self
    }

    pub fn with_fetch_on_conflict(mut self, enabled: bool) -> Self {
        self.fetch_on_conflict = enabled;
        self
    }

    pub fn with_allow_unsupported_batch(mut self, enabled: bool) -> Self {
        self.allow_unsupported_batch = enabled;
        self
    }

    /// Parses a config from TOML. Missing keys take their defaults.
    pub fn from_toml_str(contents: &str) -> LockResult<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config from a TOML file.
    pub fn load_from(path: impl AsRef<Path>) -> LockResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        info!(
            "Loaded optimistic locking config from {:?} (attribute '{}')",
            path, config.attribute_name
        );
        Ok(config)
    }

    /// Rejects attribute names that cannot be used in a condition.
    pub fn validate(&self) -> LockResult<()> {
        let name = self.attribute_name.as_str();
        if name.is_empty() {
            return Err(LockError::InvalidConfig(
                "attribute_name must not be empty".to_string(),
            ));
        }
        if name.starts_with('#') || name.starts_with(':') {
            return Err(LockError::InvalidConfig(format!(
                "attribute_name '{name}' must not start with a placeholder sigil"
            )));
        }
        Ok(())
    }
}

//! Primary keys and attribute maps.

use crate::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The attribute map of a stored item.
pub type Attributes = serde_json::Map<String, Value>;

/// One component of a primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPart {
    pub name: String,
    pub value: Value,
}

impl KeyPart {
    /// Creates a key part, rejecting values that cannot be key attributes.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Result<Self, Error> {
        let name = name.into();
        let value = value.into();
        match value {
            Value::String(_) | Value::Number(_) => Ok(Self { name, value }),
            _ => Err(Error::InvalidKeyValue { attribute: name }),
        }
    }
}

/// Primary key of an entity: a hash key and an optional range key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Key {
    hash: KeyPart,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    range: Option<KeyPart>,
}

impl Key {
    /// Creates a hash-only key.
    pub fn hash(name: impl Into<String>, value: impl Into<Value>) -> Result<Self, Error> {
        Ok(Self {
            hash: KeyPart::new(name, value)?,
            range: None,
        })
    }

    /// Adds a range key component.
    pub fn with_range(
        mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, Error> {
        self.range = Some(KeyPart::new(name, value)?);
        Ok(self)
    }

    /// Returns the hash key component.
    pub fn hash_part(&self) -> &KeyPart {
        &self.hash
    }

    /// Returns the range key component, if any.
    pub fn range_part(&self) -> Option<&KeyPart> {
        self.range.as_ref()
    }

    /// Returns the key as an attribute map.
    pub fn to_attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert(self.hash.name.clone(), self.hash.value.clone());
        if let Some(range) = &self.range {
            attrs.insert(range.name.clone(), range.value.clone());
        }
        attrs
    }

    /// Returns a canonical string identifying the key within one table.
    ///
    /// Values are JSON-encoded so that `1` and `"1"` stay distinct.
    pub fn storage_id(&self) -> String {
        match &self.range {
            Some(range) => format!("{}\u{1f}{}", self.hash.value, range.value),
            None => self.hash.value.to_string(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.hash.name, self.hash.value)?;
        if let Some(range) = &self.range {
            write!(f, ",{}={}", range.name, range.value)?;
        }
        Ok(())
    }
}

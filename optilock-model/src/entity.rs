use crate::error::{SchemaError, SchemaResult};
use optilock_types::{Attributes, FieldHandle, Version};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A record held by a model.
///
/// `attributes` is the caller-visible data and is what gets serialized.
/// Hidden slots are keyed by [`FieldHandle`] and are skipped by serde, so a
/// slot is only reachable through the handle that owns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity {
    attributes: Attributes,
    #[serde(skip)]
    hidden: HashMap<FieldHandle, Version>,
}

impl Entity {
    /// Creates an entity from an attribute map.
    pub fn new(attributes: Attributes) -> Self {
        Self {
            attributes,
            hidden: HashMap::new(),
        }
    }

    /// Creates an entity from a JSON object.
    pub fn from_value(value: Value) -> SchemaResult<Self> {
        match value {
            Value::Object(attributes) => Ok(Self::new(attributes)),
            _ => Err(SchemaError::NotAnObject),
        }
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    pub fn into_attributes(self) -> Attributes {
        self.attributes
    }

    /// Returns a top-level attribute.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Sets a top-level attribute, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.attributes.insert(name.into(), value.into())
    }

    /// Removes a top-level attribute.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    /// Resolves a JSON pointer (e.g. "/meta/author") against the attributes.
    ///
    /// The attributes are a bare map rather than a [`Value`], so the first
    /// segment is looked up here and the remainder goes to [`Value::pointer`].
    /// The empty pointer names the whole map and resolves to `None`.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        let rest = pointer.strip_prefix('/')?;
        let (head, tail) = match rest.find('/') {
            Some(ix) => (&rest[..ix], &rest[ix..]),
            None => (rest, ""),
        };
        let head = head.replace("~1", "/").replace("~0", "~");
        let value = self.attributes.get(&head)?;
        if tail.is_empty() {
            Some(value)
        } else {
            value.pointer(tail)
        }
    }

    /// Extract a string value using a JSON pointer.
    pub fn get_str(&self, pointer: &str) -> Option<&str> {
        self.pointer(pointer).and_then(|v| v.as_str())
    }

    /// Extract a numeric value using a JSON pointer.
    pub fn get_number(&self, pointer: &str) -> Option<f64> {
        self.pointer(pointer).and_then(|v| v.as_f64())
    }

    /// Extract an array value using a JSON pointer.
    pub fn get_array(&self, pointer: &str) -> Option<&Vec<Value>> {
        self.pointer(pointer).and_then(|v| v.as_array())
    }

    /// Appends to an array attribute, creating it when absent.
    ///
    /// Returns false if the attribute exists and is not an array.
    pub fn push(&mut self, name: &str, value: impl Into<Value>) -> bool {
        match self
            .attributes
            .entry(name.to_string())
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            Value::Array(items) => {
                items.push(value.into());
                true
            }
            _ => false,
        }
    }

    /// Reads a hidden version slot.
    pub fn hidden_version(&self, field: FieldHandle) -> Option<Version> {
        self.hidden.get(&field).copied()
    }

    /// Writes a hidden version slot.
    pub fn set_hidden_version(&mut self, field: FieldHandle, version: Version) {
        self.hidden.insert(field, version);
    }

    /// Clears a hidden version slot.
    pub fn clear_hidden_version(&mut self, field: FieldHandle) -> Option<Version> {
        self.hidden.remove(&field)
    }
}

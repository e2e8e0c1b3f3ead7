use crate::entity::Entity;
use crate::error::{SchemaError, SchemaResult};
use optilock_types::{Attributes, FieldHandle, Key, Version};

/// A persisted attribute that maps onto a hidden entity slot.
///
/// On read the attribute is moved out of the visible set into the slot named
/// by `field`; on write it is never encoded from the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiddenAttribute {
    pub attribute_name: String,
    pub field: FieldHandle,
}

/// Describes a table: its name, key layout and hidden attributes.
#[derive(Debug, Clone)]
pub struct Schema {
    table: String,
    hash_key: String,
    range_key: Option<String>,
    hidden: Vec<HiddenAttribute>,
}

impl Schema {
    /// Creates a schema with a hash key only.
    pub fn new(table: impl Into<String>, hash_key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            hash_key: hash_key.into(),
            range_key: None,
            hidden: Vec::new(),
        }
    }

    /// Adds a range key to the schema.
    pub fn with_range_key(mut self, range_key: impl Into<String>) -> Self {
        self.range_key = Some(range_key.into());
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn hash_key(&self) -> &str {
        &self.hash_key
    }

    pub fn range_key(&self) -> Option<&str> {
        self.range_key.as_deref()
    }

    pub fn hidden_attributes(&self) -> &[HiddenAttribute] {
        &self.hidden
    }

    /// Returns true if `name` is one of the key attributes.
    pub fn is_key_attribute(&self, name: &str) -> bool {
        self.hash_key == name || self.range_key.as_deref() == Some(name)
    }

    /// Declares a persisted attribute as hidden, bound to `field`.
    ///
    /// Declaring the same pair twice is a no-op. An attribute that is a key
    /// attribute, or that is already bound to a different handle, is rejected.
    pub fn declare_hidden(
        &mut self,
        attribute_name: impl Into<String>,
        field: FieldHandle,
    ) -> SchemaResult<()> {
        let attribute_name = attribute_name.into();
        if self.is_key_attribute(&attribute_name) {
            return Err(SchemaError::HiddenAttributeConflict(attribute_name));
        }
        if let Some(existing) = self
            .hidden
            .iter()
            .find(|h| h.attribute_name == attribute_name || h.field == field)
        {
            if existing.attribute_name == attribute_name && existing.field == field {
                return Ok(());
            }
            return Err(SchemaError::HiddenAttributeConflict(attribute_name));
        }
        self.hidden.push(HiddenAttribute {
            attribute_name,
            field,
        });
        Ok(())
    }

    /// Extracts the primary key from an attribute map.
    pub fn key_of(&self, attributes: &Attributes) -> SchemaResult<Key> {
        let hash = attributes
            .get(&self.hash_key)
            .ok_or_else(|| self.missing(&self.hash_key))?;
        let key = Key::hash(self.hash_key.clone(), hash.clone())?;
        match &self.range_key {
            Some(range_key) => {
                let range = attributes
                    .get(range_key)
                    .ok_or_else(|| self.missing(range_key))?;
                Ok(key.with_range(range_key.clone(), range.clone())?)
            }
            None => Ok(key),
        }
    }

    /// Extracts the primary key of an entity.
    pub fn key_of_entity(&self, entity: &Entity) -> SchemaResult<Key> {
        self.key_of(entity.attributes())
    }

    /// Turns a stored item into an entity, filling hidden slots.
    pub fn decode(&self, mut item: Attributes) -> SchemaResult<Entity> {
        let mut slots = Vec::with_capacity(self.hidden.len());
        for hidden in &self.hidden {
            if let Some(raw) = item.remove(&hidden.attribute_name) {
                slots.push((hidden.field, Version::try_from(&raw)?));
            }
        }
        let mut entity = Entity::new(item);
        for (field, version) in slots {
            entity.set_hidden_version(field, version);
        }
        Ok(entity)
    }

    /// Encodes the visible attributes of an entity as an outgoing item.
    ///
    /// Hidden attribute names are stripped even if a caller set them as
    /// plain attributes.
    pub fn encode(&self, entity: &Entity) -> Attributes {
        let mut item = entity.attributes().clone();
        for hidden in &self.hidden {
            item.remove(&hidden.attribute_name);
        }
        item
    }

    fn missing(&self, attribute: &str) -> SchemaError {
        SchemaError::MissingKeyAttribute {
            table: self.table.clone(),
            attribute: attribute.to_string(),
        }
    }
}

//! Version conditions for conditional writes.

use optilock_store::{Comparator, Condition, ConditionError, Operand, Predicate};
use optilock_types::{Attributes, Version};

/// Name placeholder of the version attribute.
pub const NAME_PLACEHOLDER: &str = "#optimisticlockingversion";

/// Value placeholder of the submitted version.
pub const VALUE_PLACEHOLDER: &str = ":optimisticlockingversion";

/// Builds the predicate that admits a write only over an older version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionBuilder {
    attribute_name: String,
}

impl ConditionBuilder {
    pub fn new(attribute_name: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
        }
    }

    pub fn attribute_name(&self) -> &str {
        &self.attribute_name
    }

    /// Picks a placeholder pair that `caller` does not bind.
    ///
    /// The plain pair is used when free; otherwise the first numbered suffix
    /// whose name and value are both free.
    pub fn placeholders(&self, caller: Option<&Condition>) -> (String, String) {
        let taken = |name: &str, value: &str| {
            caller.is_some_and(|c| c.uses_name(name) || c.uses_value(value))
        };
        if !taken(NAME_PLACEHOLDER, VALUE_PLACEHOLDER) {
            return (NAME_PLACEHOLDER.to_string(), VALUE_PLACEHOLDER.to_string());
        }
        let mut suffix = 1u32;
        loop {
            let name = format!("{NAME_PLACEHOLDER}{suffix}");
            let value = format!("{VALUE_PLACEHOLDER}{suffix}");
            if !taken(&name, &value) {
                return (name, value);
            }
            suffix += 1;
        }
    }

    /// `attribute_not_exists(#v) OR #v < :v`, with `:v` bound to `next`.
    pub fn version_condition(&self, next: Version, caller: Option<&Condition>) -> Condition {
        let (name, value) = self.placeholders(caller);
        let predicate = Predicate::AttributeNotExists(name.clone()).or(Predicate::Compare(
            Operand::Path(name.clone()),
            Comparator::Lt,
            Operand::Value(value.clone()),
        ));
        Condition::new(predicate)
            .with_name(name, self.attribute_name.clone())
            .with_value(value, next.to_value())
    }

    /// ANDs the version condition onto the caller's condition, if any.
    pub fn merge(
        &self,
        caller: Option<Condition>,
        next: Version,
    ) -> Result<Condition, ConditionError> {
        let version = self.version_condition(next, caller.as_ref());
        match caller {
            Some(caller) => caller.and(version),
            None => Ok(version),
        }
    }

    /// Writes `next` as the persisted version attribute of an outgoing item.
    pub fn stamp_item(&self, item: &mut Attributes, next: Version) {
        item.insert(self.attribute_name.clone(), next.to_value());
    }
}

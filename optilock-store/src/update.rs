//! Partial-update expressions.

use crate::error::{StoreError, StoreResult};
use optilock_types::Attributes;
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A set of attribute actions applied to one stored item.
///
/// `ADD` on a number increments it, on an array appends the given elements,
/// and on a missing attribute stores the given value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateExpression {
    set: BTreeMap<String, Value>,
    add: BTreeMap<String, Value>,
    remove: Vec<String>,
}

impl UpdateExpression {
    pub fn new() -> Self {
        Self::default()
    }

    /// `SET name = value`
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(name.into(), value.into());
        self
    }

    /// `ADD name value`
    pub fn add(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add.insert(name.into(), value.into());
        self
    }

    /// `REMOVE name`
    pub fn remove(mut self, name: impl Into<String>) -> Self {
        self.remove.push(name.into());
        self
    }

    /// Drops every action targeting `name`.
    pub fn without(mut self, name: &str) -> Self {
        self.set.remove(name);
        self.add.remove(name);
        self.remove.retain(|n| n != name);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.add.is_empty() && self.remove.is_empty()
    }

    pub fn set_actions(&self) -> &BTreeMap<String, Value> {
        &self.set
    }

    pub fn add_actions(&self) -> &BTreeMap<String, Value> {
        &self.add
    }

    pub fn remove_actions(&self) -> &[String] {
        &self.remove
    }

    /// Returns true if any action targets `name`.
    pub fn touches(&self, name: &str) -> bool {
        self.set.contains_key(name)
            || self.add.contains_key(name)
            || self.remove.iter().any(|n| n == name)
    }

    /// Applies the expression to an item in place.
    pub fn apply(&self, item: &mut Attributes) -> StoreResult<()> {
        for (name, value) in &self.set {
            item.insert(name.clone(), value.clone());
        }
        for name in &self.remove {
            item.remove(name);
        }
        for (name, delta) in &self.add {
            let merged = match item.remove(name) {
                None => delta.clone(),
                Some(Value::Number(current)) => match delta {
                    Value::Number(delta) => add_numbers(&current, delta)
                        .map(Value::Number)
                        .ok_or_else(|| StoreError::validation(format!("ADD overflows attribute '{name}'")))?,
                    _ => return Err(mismatch(name)),
                },
                Some(Value::Array(mut current)) => match delta {
                    Value::Array(extra) => {
                        current.extend(extra.iter().cloned());
                        Value::Array(current)
                    }
                    _ => return Err(mismatch(name)),
                },
                Some(_) => return Err(mismatch(name)),
            };
            item.insert(name.clone(), merged);
        }
        Ok(())
    }
}

fn mismatch(name: &str) -> StoreError {
    StoreError::validation(format!(
        "An operand in the update expression has an incorrect data type: '{name}'"
    ))
}

fn add_numbers(left: &Number, right: &Number) -> Option<Number> {
    if let (Some(l), Some(r)) = (left.as_u64(), right.as_u64()) {
        return l.checked_add(r).map(Number::from);
    }
    if let (Some(l), Some(r)) = (left.as_i64(), right.as_i64()) {
        return l.checked_add(r).map(Number::from);
    }
    Number::from_f64(left.as_f64()? + right.as_f64()?)
}

impl fmt::Display for UpdateExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut clauses = Vec::new();
        if !self.set.is_empty() {
            let parts: Vec<_> = self.set.iter().map(|(n, v)| format!("{n} = {v}")).collect();
            clauses.push(format!("SET {}", parts.join(", ")));
        }
        if !self.remove.is_empty() {
            clauses.push(format!("REMOVE {}", self.remove.join(", ")));
        }
        if !self.add.is_empty() {
            let parts: Vec<_> = self.add.iter().map(|(n, v)| format!("{n} {v}")).collect();
            clauses.push(format!("ADD {}", parts.join(", ")));
        }
        f.write_str(&clauses.join(" "))
    }
}

//! Condition expressions for conditional writes.
//!
//! A [`Condition`] is a predicate tree plus the placeholder bindings it uses:
//! `#name` placeholders map to attribute names, `:value` placeholders map to
//! attribute values. Backends evaluate a condition against the currently
//! stored item (or its absence) atomically with the write.

use crate::error::ConditionError;
use optilock_types::Attributes;
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Either side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// An attribute path: a `#placeholder` or a literal attribute name.
    Path(String),
    /// A `:placeholder` bound to a value.
    Value(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparator {
    fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
        }
    }
}

/// A predicate tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    AttributeExists(String),
    AttributeNotExists(String),
    Compare(Operand, Comparator, Operand),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn and(self, other: Predicate) -> Predicate {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Predicate {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }

    fn is_compound(&self) -> bool {
        matches!(self, Predicate::And(..) | Predicate::Or(..))
    }
}

/// A predicate with its placeholder bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    predicate: Predicate,
    names: BTreeMap<String, String>,
    values: BTreeMap<String, Value>,
}

impl Condition {
    /// Creates a condition with no bindings.
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            names: BTreeMap::new(),
            values: BTreeMap::new(),
        }
    }

    /// Binds a `#name` placeholder to an attribute name.
    pub fn with_name(mut self, placeholder: impl Into<String>, attribute: impl Into<String>) -> Self {
        self.names.insert(placeholder.into(), attribute.into());
        self
    }

    /// Binds a `:value` placeholder to a value.
    pub fn with_value(mut self, placeholder: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(placeholder.into(), value.into());
        self
    }

    /// `#attr = :attr`
    pub fn equals(attribute: &str, value: impl Into<Value>) -> Self {
        Self::compare(attribute, Comparator::Eq, value)
    }

    /// `#attr <op> :attr`
    pub fn compare(attribute: &str, comparator: Comparator, value: impl Into<Value>) -> Self {
        let name = format!("#{attribute}");
        let placeholder = format!(":{attribute}");
        Self::new(Predicate::Compare(
            Operand::Path(name.clone()),
            comparator,
            Operand::Value(placeholder.clone()),
        ))
        .with_name(name, attribute)
        .with_value(placeholder, value)
    }

    /// `attribute_exists(#attr)`
    pub fn attribute_exists(attribute: &str) -> Self {
        let name = format!("#{attribute}");
        Self::new(Predicate::AttributeExists(name.clone())).with_name(name, attribute)
    }

    /// `attribute_not_exists(#attr)`
    pub fn attribute_not_exists(attribute: &str) -> Self {
        let name = format!("#{attribute}");
        Self::new(Predicate::AttributeNotExists(name.clone())).with_name(name, attribute)
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn names(&self) -> &BTreeMap<String, String> {
        &self.names
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Returns true if `placeholder` is bound as a name.
    pub fn uses_name(&self, placeholder: &str) -> bool {
        self.names.contains_key(placeholder)
    }

    /// Returns true if `placeholder` is bound as a value.
    pub fn uses_value(&self, placeholder: &str) -> bool {
        self.values.contains_key(placeholder)
    }

    /// Combines two conditions with AND, merging their bindings.
    ///
    /// A placeholder bound by both sides must be bound identically.
    pub fn and(self, other: Condition) -> Result<Condition, ConditionError> {
        self.combine(other, Predicate::and)
    }

    /// Combines two conditions with OR, merging their bindings.
    pub fn or(self, other: Condition) -> Result<Condition, ConditionError> {
        self.combine(other, Predicate::or)
    }

    fn combine(
        mut self,
        other: Condition,
        join: fn(Predicate, Predicate) -> Predicate,
    ) -> Result<Condition, ConditionError> {
        for (placeholder, attribute) in other.names {
            match self.names.get(&placeholder) {
                Some(existing) if *existing != attribute => {
                    return Err(ConditionError::PlaceholderCollision(placeholder));
                }
                _ => {
                    self.names.insert(placeholder, attribute);
                }
            }
        }
        for (placeholder, value) in other.values {
            match self.values.get(&placeholder) {
                Some(existing) if *existing != value => {
                    return Err(ConditionError::PlaceholderCollision(placeholder));
                }
                _ => {
                    self.values.insert(placeholder, value);
                }
            }
        }
        Ok(Condition {
            predicate: join(self.predicate, other.predicate),
            names: self.names,
            values: self.values,
        })
    }

    /// Evaluates the condition against the stored item, if any.
    ///
    /// Comparisons involving a missing attribute are false; values of
    /// different types are never ordered.
    pub fn evaluate(&self, item: Option<&Attributes>) -> Result<bool, ConditionError> {
        self.eval(&self.predicate, item)
    }

    fn eval(&self, predicate: &Predicate, item: Option<&Attributes>) -> Result<bool, ConditionError> {
        Ok(match predicate {
            Predicate::AttributeExists(path) => self.lookup(path, item)?.is_some(),
            Predicate::AttributeNotExists(path) => self.lookup(path, item)?.is_none(),
            Predicate::Compare(left, comparator, right) => {
                let left = self.operand(left, item)?;
                let right = self.operand(right, item)?;
                match (left, right) {
                    (Some(l), Some(r)) => match order(l, r) {
                        Some(ordering) => comparator.holds(ordering),
                        None => *comparator == Comparator::Ne,
                    },
                    _ => false,
                }
            }
            Predicate::And(l, r) => self.eval(l, item)? && self.eval(r, item)?,
            Predicate::Or(l, r) => self.eval(l, item)? || self.eval(r, item)?,
            Predicate::Not(inner) => !self.eval(inner, item)?,
        })
    }

    fn operand<'a>(
        &'a self,
        operand: &Operand,
        item: Option<&'a Attributes>,
    ) -> Result<Option<&'a Value>, ConditionError> {
        match operand {
            Operand::Path(path) => self.lookup(path, item),
            Operand::Value(placeholder) => self
                .values
                .get(placeholder)
                .map(Some)
                .ok_or_else(|| ConditionError::UnknownPlaceholder(placeholder.clone())),
        }
    }

    fn lookup<'a>(
        &self,
        path: &str,
        item: Option<&'a Attributes>,
    ) -> Result<Option<&'a Value>, ConditionError> {
        let attribute = if path.starts_with('#') {
            self.names
                .get(path)
                .ok_or_else(|| ConditionError::UnknownPlaceholder(path.to_string()))?
                .as_str()
        } else {
            path
        };
        Ok(item.and_then(|item| item.get(attribute)))
    }
}

fn order(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => order_numbers(l, r),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (l, r) if l == r => Some(Ordering::Equal),
        _ => None,
    }
}

fn order_numbers(left: &Number, right: &Number) -> Option<Ordering> {
    if let (Some(l), Some(r)) = (left.as_u64(), right.as_u64()) {
        return Some(l.cmp(&r));
    }
    if let (Some(l), Some(r)) = (left.as_i64(), right.as_i64()) {
        return Some(l.cmp(&r));
    }
    left.as_f64()?.partial_cmp(&right.as_f64()?)
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Path(path) => f.write_str(path),
            Operand::Value(placeholder) => f.write_str(placeholder),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::AttributeExists(path) => write!(f, "attribute_exists({path})"),
            Predicate::AttributeNotExists(path) => write!(f, "attribute_not_exists({path})"),
            Predicate::Compare(l, op, r) => write!(f, "{l} {} {r}", op.symbol()),
            Predicate::And(l, r) => write!(f, "({l}) AND ({r})"),
            Predicate::Or(l, r) => {
                write_operand(f, l)?;
                f.write_str(" OR ")?;
                write_operand(f, r)
            }
            Predicate::Not(inner) => write!(f, "NOT ({inner})"),
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, predicate: &Predicate) -> fmt::Result {
    if predicate.is_compound() {
        write!(f, "({predicate})")
    } else {
        write!(f, "{predicate}")
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.predicate.fmt(f)
    }
}

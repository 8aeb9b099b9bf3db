//! Kit attributes.
//!
//! Every configurable kit setting is a member of the closed [`Attribute`]
//! enumeration. Each member owns a storage path (used by kit definition
//! documents), a value type, and a default that applies while the attribute
//! is undefined.
//!
//! Values live in an [`AttributeTable`], which only ever stores values of the
//! declared type. A mismatched assignment is rejected and leaves the previous
//! value in place.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// The type of value an attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Boolean,
    Integer,
    Decimal,
    Text,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Decimal => "decimal",
            ValueKind::Text => "text",
        };
        f.write_str(name)
    }
}

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl AttributeValue {
    /// The kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            AttributeValue::Boolean(_) => ValueKind::Boolean,
            AttributeValue::Integer(_) => ValueKind::Integer,
            AttributeValue::Decimal(_) => ValueKind::Decimal,
            AttributeValue::Text(_) => ValueKind::Text,
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Boolean(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Integer(i64::from(value))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Decimal(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

/// A kit attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Attribute {
    /// Name of the parent kit.
    Parent,
    /// Alternate lookup key (e.g. the text printed on a kit sign).
    Identifier,
    /// Cooldown in seconds. `-1` marks a single-use kit.
    Timeout,
    /// Cooldown is shared by every principal instead of tracked per principal.
    GlobalTimeout,
    /// Price withdrawn from the principal.
    Cost,
    /// Payout deposited to the principal.
    Cash,
    /// Full reset before granting.
    ClearAll,
    ClearInventory,
    ClearEffects,
    ClearPermissions,
    /// Parent access rights widen this kit's verdict.
    InheritParentPerms,
    /// Lacking access to the parent denies this kit.
    RequireParentPerms,
    /// Effects are re-applied periodically while the kit is in history.
    InfiniteEffects,
    /// Once taken, no further kits may be taken.
    RestrictKits,
    /// Items merge into what the principal already carries.
    Upgrade,
    /// Do not log when the kit is loaded.
    SuppressLoadNotification,
}

impl Attribute {
    /// Every attribute, in declaration order.
    pub const ALL: [Attribute; 16] = [
        Attribute::Parent,
        Attribute::Identifier,
        Attribute::Timeout,
        Attribute::GlobalTimeout,
        Attribute::Cost,
        Attribute::Cash,
        Attribute::ClearAll,
        Attribute::ClearInventory,
        Attribute::ClearEffects,
        Attribute::ClearPermissions,
        Attribute::InheritParentPerms,
        Attribute::RequireParentPerms,
        Attribute::InfiniteEffects,
        Attribute::RestrictKits,
        Attribute::Upgrade,
        Attribute::SuppressLoadNotification,
    ];

    /// Storage path in a kit definition document. Dots denote nesting.
    pub const fn path(self) -> &'static str {
        match self {
            Attribute::Parent => "parent",
            Attribute::Identifier => "identifier",
            Attribute::Timeout => "timeout",
            Attribute::GlobalTimeout => "globalTimeout",
            Attribute::Cost => "cost",
            Attribute::Cash => "cash",
            Attribute::ClearAll => "clear.all",
            Attribute::ClearInventory => "clear.inventory",
            Attribute::ClearEffects => "clear.effects",
            Attribute::ClearPermissions => "clear.permissions",
            Attribute::InheritParentPerms => "inherit.permissions",
            Attribute::RequireParentPerms => "require.permissions",
            Attribute::InfiniteEffects => "infiniteEffects",
            Attribute::RestrictKits => "restrictKits",
            Attribute::Upgrade => "upgrade",
            Attribute::SuppressLoadNotification => "suppressLoadNotification",
        }
    }

    /// The declared value type.
    pub const fn kind(self) -> ValueKind {
        match self {
            Attribute::Parent | Attribute::Identifier => ValueKind::Text,
            Attribute::Timeout => ValueKind::Integer,
            Attribute::Cost | Attribute::Cash => ValueKind::Decimal,
            _ => ValueKind::Boolean,
        }
    }

    /// Value used while the attribute is undefined.
    pub fn default_value(self) -> AttributeValue {
        match self.kind() {
            ValueKind::Boolean => AttributeValue::Boolean(false),
            ValueKind::Integer => AttributeValue::Integer(0),
            ValueKind::Decimal => AttributeValue::Decimal(0.0),
            ValueKind::Text => AttributeValue::Text(String::new()),
        }
    }

    /// Look up an attribute by its storage path.
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.path() == path)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Sparse, type-checked attribute storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeTable {
    values: BTreeMap<Attribute, AttributeValue>,
}

impl AttributeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) an attribute.
    ///
    /// Integers are widened when the attribute is decimal. Any other type
    /// disagreement fails and leaves the previous value untouched.
    pub fn set(&mut self, attribute: Attribute, value: impl Into<AttributeValue>) -> Result<()> {
        let value = match (attribute.kind(), value.into()) {
            (ValueKind::Decimal, AttributeValue::Integer(i)) => AttributeValue::Decimal(i as f64),
            (expected, value) if value.kind() != expected => {
                return Err(CoreError::AttributeTypeMismatch {
                    attribute,
                    expected,
                    found: value.kind(),
                });
            }
            (_, value) => value,
        };
        self.values.insert(attribute, value);
        Ok(())
    }

    /// Remove an attribute definition, returning it to its default.
    pub fn unset(&mut self, attribute: Attribute) -> Option<AttributeValue> {
        self.values.remove(&attribute)
    }

    /// The explicitly defined value, if any.
    pub fn get(&self, attribute: Attribute) -> Option<&AttributeValue> {
        self.values.get(&attribute)
    }

    /// The defined value, or the attribute's default.
    pub fn value(&self, attribute: Attribute) -> AttributeValue {
        self.get(attribute)
            .cloned()
            .unwrap_or_else(|| attribute.default_value())
    }

    /// Whether the attribute has been explicitly defined.
    pub fn is_defined(&self, attribute: Attribute) -> bool {
        self.values.contains_key(&attribute)
    }

    pub fn flag(&self, attribute: Attribute) -> bool {
        matches!(self.get(attribute), Some(AttributeValue::Boolean(true)))
    }

    pub fn integer(&self, attribute: Attribute) -> i64 {
        match self.get(attribute) {
            Some(AttributeValue::Integer(i)) => *i,
            _ => 0,
        }
    }

    pub fn decimal(&self, attribute: Attribute) -> f64 {
        match self.get(attribute) {
            Some(AttributeValue::Decimal(d)) => *d,
            _ => 0.0,
        }
    }

    pub fn text(&self, attribute: Attribute) -> &str {
        match self.get(attribute) {
            Some(AttributeValue::Text(s)) => s,
            _ => "",
        }
    }

    /// Copy every attribute defined in `other` but undefined here.
    ///
    /// Values already defined on `self` are never overwritten.
    pub fn fill_from(&mut self, other: &AttributeTable) {
        for (attribute, value) in &other.values {
            self.values
                .entry(*attribute)
                .or_insert_with(|| value.clone());
        }
    }

    /// Iterate over the defined attributes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Attribute, &AttributeValue)> {
        self.values.iter().map(|(a, v)| (*a, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_undefined() {
        let table = AttributeTable::new();
        assert!(!table.flag(Attribute::ClearAll));
        assert_eq!(table.integer(Attribute::Timeout), 0);
        assert_eq!(table.decimal(Attribute::Cost), 0.0);
        assert_eq!(table.text(Attribute::Parent), "");
        assert_eq!(table.value(Attribute::Cash), AttributeValue::Decimal(0.0));
    }

    #[test]
    fn test_type_mismatch_keeps_prior_value() {
        let mut table = AttributeTable::new();
        table.set(Attribute::Timeout, 60).unwrap();

        let err = table.set(Attribute::Timeout, "soon").unwrap_err();
        assert!(matches!(
            err,
            CoreError::AttributeTypeMismatch {
                attribute: Attribute::Timeout,
                expected: ValueKind::Integer,
                found: ValueKind::Text,
            }
        ));
        assert_eq!(table.integer(Attribute::Timeout), 60);
    }

    #[test]
    fn test_integer_widens_to_decimal() {
        let mut table = AttributeTable::new();
        table.set(Attribute::Cost, 100i64).unwrap();
        assert_eq!(table.decimal(Attribute::Cost), 100.0);

        // The reverse is not a widening
        assert!(table.set(Attribute::Timeout, 1.5).is_err());
    }

    #[test]
    fn test_fill_from_never_overwrites() {
        let mut child = AttributeTable::new();
        child.set(Attribute::Cost, 5.0).unwrap();

        let mut parent = AttributeTable::new();
        parent.set(Attribute::Cost, 50.0).unwrap();
        parent.set(Attribute::Timeout, 30).unwrap();

        child.fill_from(&parent);
        assert_eq!(child.decimal(Attribute::Cost), 5.0);
        assert_eq!(child.integer(Attribute::Timeout), 30);
    }

    #[test]
    fn test_paths_are_unique_and_reversible() {
        for attribute in Attribute::ALL {
            assert_eq!(Attribute::from_path(attribute.path()), Some(attribute));
        }
        assert_eq!(Attribute::from_path("nope"), None);
    }
}

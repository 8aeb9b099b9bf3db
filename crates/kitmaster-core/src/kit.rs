//! The kit entity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attribute::{Attribute, AttributeTable, AttributeValue};
use crate::error::Result;
use crate::item::{Effect, Item};

/// A named bundle of items, effects, permission nodes and attributes.
///
/// Kits are values. The registry hands out clones, and anything that wants
/// to modify a kit (the grant pipeline, hook interceptors) works on its own
/// copy.
///
/// Two kits are equal when their names match exactly. Registry lookups are
/// case-insensitive, see [`KitRegistry`](crate::KitRegistry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kit {
    /// The kit's name.
    pub name: String,

    /// Items handed out, in order.
    pub items: Vec<Item>,

    /// Status effects applied, in order.
    pub effects: Vec<Effect>,

    /// Permission nodes granted while the kit is held.
    pub permissions: Vec<String>,

    /// Attribute values defined for this kit.
    pub attributes: AttributeTable,
}

impl Kit {
    /// Create an empty kit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
            effects: Vec::new(),
            permissions: Vec::new(),
            attributes: AttributeTable::new(),
        }
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_permission(mut self, node: impl Into<String>) -> Self {
        self.permissions.push(node.into());
        self
    }

    /// Define an attribute, failing on a type mismatch.
    pub fn with_attribute(
        mut self,
        attribute: Attribute,
        value: impl Into<AttributeValue>,
    ) -> Result<Self> {
        self.attributes.set(attribute, value)?;
        Ok(self)
    }

    /// The boolean value of an attribute.
    pub fn flag(&self, attribute: Attribute) -> bool {
        self.attributes.flag(attribute)
    }

    /// Name of the parent kit, if one is declared.
    pub fn parent_name(&self) -> Option<&str> {
        Some(self.attributes.text(Attribute::Parent)).filter(|name| !name.is_empty())
    }

    pub fn identifier(&self) -> &str {
        self.attributes.text(Attribute::Identifier)
    }

    pub fn cost(&self) -> f64 {
        self.attributes.decimal(Attribute::Cost)
    }

    pub fn cash(&self) -> f64 {
        self.attributes.decimal(Attribute::Cash)
    }

    /// Cooldown in seconds; negative means single use.
    pub fn timeout(&self) -> i64 {
        self.attributes.integer(Attribute::Timeout)
    }

    /// Whether the kit hands out an item of the same material.
    pub fn contains_item(&self, item: &Item) -> bool {
        self.items.iter().any(|i| i.material == item.material)
    }

    /// Whether the kit applies an effect of the same kind.
    pub fn contains_effect(&self, effect: &Effect) -> bool {
        self.effects.iter().any(|e| e.kind == effect.kind)
    }
}

impl PartialEq for Kit {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Kit {}

impl fmt::Display for Kit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

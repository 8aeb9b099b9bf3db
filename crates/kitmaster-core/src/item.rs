//! Items and status effects carried by kits.
//!
//! The in-game representation of items and effects belongs to the host. Kits
//! only carry these lightweight descriptors, and the host's inventory
//! collaborator turns them into the real thing.
//!
//! Definition documents describe items and effects as strings. The codec
//! traits convert between the two forms. [`SimpleCodec`] understands:
//!
//! - items: `material[:amount]`, amount defaults to 1
//! - effects: `kind[:potency[:duration_ticks]]`, defaults 0 and 600

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Default effect duration, in game ticks (30 seconds).
pub const DEFAULT_EFFECT_TICKS: u32 = 600;

/// An item stack descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    /// Material identifier, e.g. `diamond_sword`.
    pub material: String,
    /// Stack size.
    pub amount: u32,
}

impl Item {
    pub fn new(material: impl Into<String>, amount: u32) -> Self {
        Self {
            material: material.into(),
            amount,
        }
    }
}

/// A status effect descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Effect {
    /// Effect kind, e.g. `speed`.
    pub kind: String,
    /// Zero-based strength level.
    pub potency: u32,
    /// How long the effect lasts, in game ticks.
    pub duration_ticks: u32,
}

impl Effect {
    pub fn new(kind: impl Into<String>, potency: u32, duration_ticks: u32) -> Self {
        Self {
            kind: kind.into(),
            potency,
            duration_ticks,
        }
    }
}

/// Converts item description strings to and from [`Item`]s.
pub trait ItemCodec: Send + Sync {
    fn parse_item(&self, input: &str) -> Result<Item>;
    fn format_item(&self, item: &Item) -> String;
}

/// Converts effect description strings to and from [`Effect`]s.
pub trait EffectCodec: Send + Sync {
    fn parse_effect(&self, input: &str) -> Result<Effect>;
    fn format_effect(&self, effect: &Effect) -> String;
}

/// Colon-separated codec for items and effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleCodec;

impl ItemCodec for SimpleCodec {
    fn parse_item(&self, input: &str) -> Result<Item> {
        let mut parts = input.trim().split(':');
        let material = identifier(input, parts.next())?;
        let amount = match parts.next() {
            Some(s) => number(input, s, "amount")?,
            None => 1,
        };
        if amount == 0 {
            return Err(CoreError::parse(input, "amount must be positive"));
        }
        if parts.next().is_some() {
            return Err(CoreError::parse(input, "too many fields"));
        }
        Ok(Item { material, amount })
    }

    fn format_item(&self, item: &Item) -> String {
        format!("{}:{}", item.material, item.amount)
    }
}

impl EffectCodec for SimpleCodec {
    fn parse_effect(&self, input: &str) -> Result<Effect> {
        let mut parts = input.trim().split(':');
        let kind = identifier(input, parts.next())?;
        let potency = match parts.next() {
            Some(s) => number(input, s, "potency")?,
            None => 0,
        };
        let duration_ticks = match parts.next() {
            Some(s) => number(input, s, "duration")?,
            None => DEFAULT_EFFECT_TICKS,
        };
        if parts.next().is_some() {
            return Err(CoreError::parse(input, "too many fields"));
        }
        Ok(Effect {
            kind,
            potency,
            duration_ticks,
        })
    }

    fn format_effect(&self, effect: &Effect) -> String {
        format!("{}:{}:{}", effect.kind, effect.potency, effect.duration_ticks)
    }
}

fn identifier(input: &str, field: Option<&str>) -> Result<String> {
    let field = field.map(str::trim).unwrap_or_default();
    if field.is_empty() {
        return Err(CoreError::parse(input, "missing name"));
    }
    if !field
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(CoreError::parse(input, "name may only hold letters, digits and '_'"));
    }
    Ok(field.to_ascii_lowercase())
}

fn number(input: &str, field: &str, what: &str) -> Result<u32> {
    field
        .trim()
        .parse()
        .map_err(|_| CoreError::parse(input, format!("invalid {}", what)))
}

//! Proptest generators for kits and permission scenarios.

use std::collections::BTreeSet;

use kitmaster_core::{Attribute, AttributeTable, AttributeValue, Effect, Item, Kit, KitRegistry, ValueKind};
use kitmaster_perms::PermissionNodes;
use proptest::prelude::*;

/// Generate a kit name.
pub fn kit_name() -> impl Strategy<Value = String> {
    "[A-Z][a-zA-Z]{0,11}".prop_map(String::from)
}

/// Generate an item the default codec can write and read back.
pub fn item() -> impl Strategy<Value = Item> {
    ("[a-z][a-z_]{0,15}", 1u32..=64).prop_map(|(material, amount)| Item::new(material, amount))
}

/// Generate an effect the default codec can write and read back.
pub fn effect() -> impl Strategy<Value = Effect> {
    ("[a-z][a-z_]{0,15}", 0u32..=4, 1u32..=2400)
        .prop_map(|(kind, potency, ticks)| Effect::new(kind, potency, ticks))
}

/// Generate a permission node granted by a kit.
pub fn grant_node() -> impl Strategy<Value = String> {
    "[a-z]{1,8}(\\.[a-z]{1,8}){0,2}".prop_map(String::from)
}

/// Generate a value of the attribute's declared type.
pub fn attribute_value(attribute: Attribute) -> BoxedStrategy<AttributeValue> {
    match attribute.kind() {
        ValueKind::Boolean => any::<bool>().prop_map(AttributeValue::Boolean).boxed(),
        ValueKind::Integer => (-1i64..=86_400).prop_map(AttributeValue::Integer).boxed(),
        ValueKind::Decimal => (0u32..100_000)
            .prop_map(|cents| AttributeValue::Decimal(f64::from(cents) / 100.0))
            .boxed(),
        ValueKind::Text => kit_name().prop_map(AttributeValue::Text).boxed(),
    }
}

/// Generate a sparse attribute table. `Parent` is never set, so generated
/// kits stand alone.
pub fn attribute_table() -> impl Strategy<Value = AttributeTable> {
    let slots: Vec<_> = Attribute::ALL
        .into_iter()
        .filter(|attribute| *attribute != Attribute::Parent)
        .map(|attribute| prop::option::of(attribute_value(attribute)).prop_map(move |value| (attribute, value)))
        .collect();

    slots.prop_map(|slots| {
        let mut table = AttributeTable::new();
        for (attribute, value) in slots {
            if let Some(value) = value {
                // Values are generated with the declared type, so this cannot fail
                let _ = table.set(attribute, value);
            }
        }
        table
    })
}

/// Generate a standalone kit.
pub fn kit() -> impl Strategy<Value = Kit> {
    (
        kit_name(),
        prop::collection::vec(item(), 0..4),
        prop::collection::vec(effect(), 0..3),
        prop::collection::vec(grant_node(), 0..3),
        attribute_table(),
    )
        .prop_map(|(name, items, effects, permissions, attributes)| Kit {
            name,
            items,
            effects,
            permissions,
            attributes,
        })
}

/// A chain of kits, each the parent of the next, plus a principal's nodes.
///
/// With `cyclic` set, the first kit names the last as its parent.
#[derive(Debug, Clone)]
pub struct LatticeScenario {
    pub kits: Vec<Kit>,
    pub cyclic: bool,
    pub held: BTreeSet<String>,
    /// A node that may or may not already be held.
    pub extra: String,
}

/// Prefix used by generated permission nodes.
pub const SCENARIO_PREFIX: &str = "kit";

impl LatticeScenario {
    pub fn nodes() -> PermissionNodes {
        PermissionNodes::new(SCENARIO_PREFIX)
    }

    pub fn registry(&self) -> KitRegistry {
        let mut registry = KitRegistry::new();
        for kit in &self.kits {
            registry.register(kit.clone());
        }
        registry
    }

    /// The last kit in the chain, which has the longest ancestry.
    pub fn leaf(&self) -> &Kit {
        &self.kits[self.kits.len() - 1]
    }

    pub fn held_with_extra(&self) -> BTreeSet<String> {
        let mut held = self.held.clone();
        held.insert(self.extra.clone());
        held
    }
}

/// Every node the lattice could consult for `names`.
pub fn candidate_nodes(names: &[String], nodes: &PermissionNodes) -> Vec<String> {
    let mut candidates: Vec<String> = names
        .iter()
        .flat_map(|name| [nodes.sign(name), nodes.command(name), nodes.kit(name)])
        .collect();
    candidates.extend([nodes.sign("*"), nodes.command("*"), nodes.kit("*")]);
    candidates
}

impl Arbitrary for LatticeScenario {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (1usize..=4, any::<bool>())
            .prop_flat_map(|(len, cyclic)| {
                let names: Vec<String> = (0..len).map(|i| format!("K{i}")).collect();
                let candidates = candidate_nodes(&names, &Self::nodes());
                (
                    Just(names),
                    Just(cyclic),
                    prop::collection::vec((any::<bool>(), any::<bool>()), len),
                    prop::collection::vec(any::<bool>(), candidates.len()),
                    prop::sample::select(candidates.clone()),
                    Just(candidates),
                )
            })
            .prop_map(|(names, cyclic, flags, mask, extra, candidates)| {
                let kits = names
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        let mut kit = Kit::new(name.clone());
                        let parent = match i {
                            0 if cyclic => names.last(),
                            0 => None,
                            _ => names.get(i - 1),
                        };
                        if let Some(parent) = parent {
                            let _ = kit.attributes.set(Attribute::Parent, parent.as_str());
                        }
                        let _ = kit.attributes.set(Attribute::InheritParentPerms, flags[i].0);
                        let _ = kit.attributes.set(Attribute::RequireParentPerms, flags[i].1);
                        kit
                    })
                    .collect();
                let held = candidates
                    .into_iter()
                    .zip(mask)
                    .filter_map(|(node, keep)| keep.then_some(node))
                    .collect();
                LatticeScenario {
                    kits,
                    cyclic,
                    held,
                    extra,
                }
            })
            .boxed()
    }
}

//! The kit registry and parent resolution.
//!
//! The registry is an ordered list of uniquely named kits. Lookups are
//! case-insensitive and fall back to prefix matching, so `war` finds
//! `Warrior` when no kit is called exactly `war`.
//!
//! Lookups never hand out the stored kit. They return a *resolved* copy in
//! which every attribute the kit leaves undefined is filled in from its
//! parent, recursively. Item, effect and permission lists are not inherited.
//!
//! Parent links are names, resolved again on every access. A missing parent
//! means "no parent". A parent chain that loops back on itself is cut at the
//! first repeated kit and logged.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::attribute::Attribute;
use crate::kit::Kit;

/// Ordered collection of kits.
#[derive(Debug, Clone, Default)]
pub struct KitRegistry {
    kits: Vec<Kit>,
}

/// The kits already visited while walking a parent chain.
///
/// Names are compared case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct Lineage {
    visited: HashSet<String>,
}

impl Lineage {
    /// A lineage that has visited only `kit`.
    pub fn of(kit: &Kit) -> Self {
        let mut lineage = Self::default();
        lineage.enter(&kit.name);
        lineage
    }

    /// Record a visit. Returns `false` if the kit was already visited.
    pub fn enter(&mut self, name: &str) -> bool {
        self.visited.insert(name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.visited.contains(&name.to_lowercase())
    }
}

impl KitRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a kit, replacing every existing kit with the same name.
    pub fn register(&mut self, kit: Kit) {
        self.kits.retain(|existing| existing != &kit);
        if !kit.flag(Attribute::SuppressLoadNotification) {
            info!("Successfully loaded the {} kit", kit.name);
        }
        self.kits.push(kit);
    }

    /// Find a kit by name and return its resolved view.
    pub fn get(&self, name: &str) -> Option<Kit> {
        self.find(name).map(|kit| self.resolve(kit))
    }

    /// Find a kit by its identifier attribute and return its resolved view.
    pub fn get_by_identifier(&self, identifier: &str) -> Option<Kit> {
        lookup(&self.kits, identifier, Kit::identifier).map(|kit| self.resolve(kit))
    }

    /// Whether any kit matches `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Every stored kit, unresolved, in insertion order.
    pub fn list(&self) -> &[Kit] {
        &self.kits
    }

    /// Remove every kit.
    pub fn clear(&mut self) {
        self.kits.clear();
    }

    pub fn len(&self) -> usize {
        self.kits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kits.is_empty()
    }

    /// Return a copy of `kit` with undefined attributes filled in from its
    /// parent chain.
    pub fn resolve(&self, kit: &Kit) -> Kit {
        self.resolve_in(kit, &Lineage::of(kit))
    }

    /// The resolved parent of `kit`, if it has one.
    pub fn parent_of(&self, kit: &Kit) -> Option<Kit> {
        self.parent_in(kit, &Lineage::of(kit))
    }

    /// The resolved parent of `kit`, unless it was already visited in
    /// `lineage`.
    pub fn parent_in(&self, kit: &Kit, lineage: &Lineage) -> Option<Kit> {
        let parent = self.find(kit.parent_name()?)?;
        if lineage.contains(&parent.name) {
            warn!(
                "Kit {} names {} as its parent, which is already in its parent chain; ignoring the parent",
                kit.name, parent.name
            );
            return None;
        }

        let mut inner = lineage.clone();
        inner.enter(&parent.name);
        Some(self.resolve_in(parent, &inner))
    }

    fn resolve_in(&self, kit: &Kit, lineage: &Lineage) -> Kit {
        let mut resolved = kit.clone();
        if let Some(parent) = self.parent_in(kit, lineage) {
            resolved.attributes.fill_from(&parent.attributes);
        }
        resolved
    }

    fn find(&self, name: &str) -> Option<&Kit> {
        lookup(&self.kits, name, |kit| kit.name.as_str())
    }
}

/// Exact case-insensitive match first, then the first prefix match.
fn lookup<'a>(kits: &'a [Kit], query: &str, key: impl Fn(&Kit) -> &str) -> Option<&'a Kit> {
    if query.is_empty() {
        return None;
    }
    let query = query.to_lowercase();

    kits.iter()
        .find(|kit| key(kit).to_lowercase() == query)
        .or_else(|| {
            kits.iter()
                .find(|kit| key(kit).to_lowercase().starts_with(&query))
        })
}

//! The permission lattice evaluator.
//!
//! Evaluation runs in three layers, from lowest to highest priority:
//!
//! 1. Direct nodes for the kit (`sign.<kit>`, `cmd.<kit>`, `kit.<kit>`)
//! 2. Wildcard nodes (`sign.*`, `cmd.*`, `kit.*`), which only widen
//! 3. The parent kit's own verdict, when the kit opts into it

use kitmaster_core::{Attribute, Kit, KitRegistry, Lineage};
use tracing::debug;

use crate::nodes::{PermissionHolder, PermissionNodes};
use crate::verdict::PermsResult;

/// Computes [`PermsResult`] verdicts against a registry.
pub struct PermsEvaluator<'a> {
    registry: &'a KitRegistry,
    nodes: &'a PermissionNodes,
}

impl<'a> PermsEvaluator<'a> {
    pub fn new(registry: &'a KitRegistry, nodes: &'a PermissionNodes) -> Self {
        Self { registry, nodes }
    }

    /// The verdict for `holder` taking `kit`.
    ///
    /// `kit` should already be resolved (see [`KitRegistry::resolve`]) so that
    /// inherited `InheritParentPerms` / `RequireParentPerms` flags apply.
    pub fn evaluate<H>(&self, holder: &H, kit: Option<&Kit>) -> PermsResult
    where
        H: PermissionHolder + ?Sized,
    {
        match kit {
            Some(kit) => self.evaluate_in(holder, kit, &Lineage::of(kit)),
            None => PermsResult::NullKit,
        }
    }

    fn evaluate_in<H>(&self, holder: &H, kit: &Kit, lineage: &Lineage) -> PermsResult
    where
        H: PermissionHolder + ?Sized,
    {
        let mut result = self.direct(holder, kit);
        result = self.widen(holder, result);

        if let Some(parent) = self.registry.parent_in(kit, lineage) {
            let mut inner = lineage.clone();
            inner.enter(&parent.name);
            let parent_result = self.evaluate_in(holder, &parent, &inner);
            result = inherit(kit, result, parent_result);
        }

        debug!(kit = %kit.name, verdict = %result, "performed permissions check");
        result
    }

    fn direct<H>(&self, holder: &H, kit: &Kit) -> PermsResult
    where
        H: PermissionHolder + ?Sized,
    {
        let any = holder.has_permission(&self.nodes.kit(&kit.name));
        let sign = any || holder.has_permission(&self.nodes.sign(&kit.name));
        let command = any || holder.has_permission(&self.nodes.command(&kit.name));

        match (sign, command) {
            (true, true) => PermsResult::All,
            (true, false) => PermsResult::SignOnly,
            (false, true) => PermsResult::CommandOnly,
            (false, false) => PermsResult::None,
        }
    }

    fn widen<H>(&self, holder: &H, mut result: PermsResult) -> PermsResult
    where
        H: PermissionHolder + ?Sized,
    {
        if holder.has_permission(&self.nodes.sign("*")) {
            result = match result {
                PermsResult::CommandOnly => PermsResult::All,
                PermsResult::All => PermsResult::All,
                _ => PermsResult::SignOnly,
            };
        }
        if holder.has_permission(&self.nodes.command("*")) {
            result = match result {
                PermsResult::SignOnly => PermsResult::All,
                PermsResult::All => PermsResult::All,
                _ => PermsResult::CommandOnly,
            };
        }
        if holder.has_permission(&self.nodes.kit("*")) {
            result = PermsResult::All;
        }
        result
    }
}

/// Fold the parent's verdict into the child's.
fn inherit(kit: &Kit, child: PermsResult, parent: PermsResult) -> PermsResult {
    let inherits = kit.flag(Attribute::InheritParentPerms);
    let requires = kit.flag(Attribute::RequireParentPerms);

    match parent.family() {
        PermsResult::SignOnly if inherits => match child {
            PermsResult::CommandOnly => PermsResult::InheritAll,
            PermsResult::All => PermsResult::All,
            _ => PermsResult::InheritSignOnly,
        },
        PermsResult::CommandOnly if inherits => match child {
            PermsResult::SignOnly => PermsResult::InheritAll,
            PermsResult::All => PermsResult::All,
            _ => PermsResult::InheritCommandOnly,
        },
        PermsResult::All if inherits => PermsResult::InheritAll,
        PermsResult::None if requires => PermsResult::InheritNone,
        _ => child,
    }
}

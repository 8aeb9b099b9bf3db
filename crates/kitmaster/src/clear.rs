//! What gets wiped before a kit is given.
//!
//! A kit asks for clears through its `Clear*` attributes. Asking for all
//! three scopes is the same as `ClearAll`: a single full clear that also
//! forgets the principal's history. Otherwise each scope is cleared on its
//! own, and interceptors see one event per scope.

use kitmaster_core::{Attribute, Kit, PrincipalId};
use tracing::debug;

use crate::context::ClearContext;
use crate::hooks::ClearKitsEvent;
use crate::master::KitMaster;

/// The clears a kit asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearPlan {
    /// Every scope, plus the principal's history.
    Full,
    /// The listed scopes, each on its own.
    Partial {
        inventory: bool,
        effects: bool,
        permissions: bool,
    },
}

impl ClearPlan {
    pub fn for_kit(kit: &Kit) -> Self {
        let inventory = kit.flag(Attribute::ClearInventory);
        let effects = kit.flag(Attribute::ClearEffects);
        let permissions = kit.flag(Attribute::ClearPermissions);

        if kit.flag(Attribute::ClearAll) || (inventory && effects && permissions) {
            ClearPlan::Full
        } else {
            ClearPlan::Partial {
                inventory,
                effects,
                permissions,
            }
        }
    }

    /// Whether the plan clears nothing.
    pub fn is_empty(&self) -> bool {
        matches!(
            self,
            ClearPlan::Partial {
                inventory: false,
                effects: false,
                permissions: false,
            }
        )
    }
}

impl KitMaster {
    /// Run the clears `kit` asks for.
    pub(crate) fn apply_clears(&self, principal: &PrincipalId, kit: &Kit) {
        let plan = ClearPlan::for_kit(kit);
        debug!(kit = %kit.name, ?plan, "applying kit clears");

        match plan {
            ClearPlan::Full => self.clear_all(principal, ClearContext::KitAttribute),
            ClearPlan::Partial {
                inventory,
                effects,
                permissions,
            } => {
                let context = ClearContext::KitAttribute;
                if inventory {
                    self.clear_scoped(ClearKitsEvent::scoped(principal.clone(), true, false, false, context));
                }
                if effects {
                    self.clear_scoped(ClearKitsEvent::scoped(principal.clone(), false, true, false, context));
                }
                if permissions && self.permissions.is_some() {
                    self.clear_scoped(ClearKitsEvent::scoped(principal.clone(), false, false, true, context));
                }
            }
        }
    }

    /// Clear every scope the interceptors leave requested, then forget the
    /// principal's history. The history is forgotten even when an
    /// interceptor cancels the clear.
    pub(crate) fn clear_all(&self, principal: &PrincipalId, context: ClearContext) {
        self.clear_scoped(ClearKitsEvent::all(principal.clone(), context));
        self.history.reset_history(principal);
    }

    fn clear_scoped(&self, mut event: ClearKitsEvent) {
        self.hooks.dispatch_clear(&mut event);
        if event.is_cancelled() {
            return;
        }

        let principal = event.principal();
        if event.clears_inventory() {
            self.inventory.clear_inventory(principal);
        }
        if event.clears_effects() {
            self.inventory.clear_effects(principal);
        }
        if event.clears_permissions() {
            self.revoke_history_permissions(principal);
        }
    }

    /// Revoke every node any kit in the principal's history granted.
    fn revoke_history_permissions(&self, principal: &PrincipalId) {
        let Some(provider) = &self.permissions else {
            return;
        };
        for kit in self.history.history(principal) {
            for node in &kit.permissions {
                provider.revoke(principal, node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::PermissionProvider;
    use crate::testing::{InventoryOp, MockPermissions, RecordingInventory, ScriptedInterceptor};
    use std::sync::Arc;

    fn flags(flags: &[Attribute]) -> Kit {
        flags
            .iter()
            .fold(Kit::new("Clearer"), |kit, flag| kit.with_attribute(*flag, true).unwrap())
    }

    #[test]
    fn test_plan_for_kit() {
        assert_eq!(ClearPlan::for_kit(&flags(&[Attribute::ClearAll])), ClearPlan::Full);
        assert_eq!(
            ClearPlan::for_kit(&flags(&[
                Attribute::ClearInventory,
                Attribute::ClearEffects,
                Attribute::ClearPermissions
            ])),
            ClearPlan::Full
        );
        assert_eq!(
            ClearPlan::for_kit(&flags(&[Attribute::ClearEffects])),
            ClearPlan::Partial {
                inventory: false,
                effects: true,
                permissions: false
            }
        );
        assert!(ClearPlan::for_kit(&Kit::new("Plain")).is_empty());
    }

    #[test]
    fn test_full_clear_revokes_history_permissions() {
        let inventory = Arc::new(RecordingInventory::new());
        let perms = Arc::new(MockPermissions::new());
        let master = KitMaster::builder(inventory.clone()).permissions(perms.clone()).build();
        let steve = PrincipalId::new("Steve");

        perms.grant(&steve, "warrior.rage");
        perms.grant(&steve, "unrelated");
        master
            .history()
            .add_to_history(&steve, &Kit::new("Warrior").with_permission("warrior.rage"));

        master.clear_kits(&steve);

        assert!(!perms.has(&steve, "warrior.rage"));
        assert!(perms.has(&steve, "unrelated"));
        assert!(master.history().history(&steve).is_empty());
        assert_eq!(
            inventory.ops(),
            vec![
                InventoryOp::ClearInventory(steve.clone()),
                InventoryOp::ClearEffects(steve.clone()),
            ]
        );
    }

    #[test]
    fn test_cancelled_full_clear_still_resets_history() {
        let inventory = Arc::new(RecordingInventory::new());
        let master = KitMaster::builder(inventory.clone())
            .interceptor(Box::new(ScriptedInterceptor::new("guard").cancel_clears()))
            .build();
        let steve = PrincipalId::new("Steve");
        master.history().add_to_history(&steve, &Kit::new("Warrior"));

        master.clear_kits(&steve);

        assert!(inventory.ops().is_empty());
        assert!(master.history().history(&steve).is_empty());
    }

    #[test]
    fn test_partial_clears_dispatch_one_event_per_scope() {
        let inventory = Arc::new(RecordingInventory::new());
        let interceptor = ScriptedInterceptor::new("keeper").keep_inventory();
        let master = KitMaster::builder(inventory.clone())
            .interceptor(Box::new(interceptor.clone()))
            .build();
        let steve = PrincipalId::new("Steve");
        master.history().add_to_history(&steve, &Kit::new("Warrior"));

        master.apply_clears(&steve, &flags(&[Attribute::ClearInventory, Attribute::ClearEffects]));

        assert_eq!(interceptor.clears().len(), 2);
        assert_eq!(inventory.ops(), vec![InventoryOp::ClearEffects(steve.clone())]);
        // Partial clears leave the history alone
        assert_eq!(master.history().history(&steve).len(), 1);
    }

    #[test]
    fn test_permission_scope_needs_a_provider() {
        let inventory = Arc::new(RecordingInventory::new());
        let interceptor = ScriptedInterceptor::new("observer");
        let master = KitMaster::builder(inventory.clone())
            .interceptor(Box::new(interceptor.clone()))
            .build();

        master.apply_clears(&PrincipalId::new("Steve"), &flags(&[Attribute::ClearPermissions]));
        assert!(interceptor.clears().is_empty());
    }
}

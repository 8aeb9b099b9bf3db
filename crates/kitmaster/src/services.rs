//! Collaborators KitMaster delegates to.
//!
//! The host owns the real principals, inventories, permission system and
//! economy. KitMaster only talks to them through these traits. The
//! permission and economy providers are optional: a KitMaster built without
//! one simply skips the features that need it.

use kitmaster_core::{Effect, Item, PrincipalId};
use kitmaster_perms::PermissionHolder;

/// The recipient of a kit.
pub trait Principal: Send + Sync {
    fn id(&self) -> &PrincipalId;

    /// Whether the principal holds `node` in the host's own permission system.
    fn has_permission(&self, node: &str) -> bool;

    fn send_message(&self, text: &str);
}

/// External permission system used to grant and revoke kit permissions.
pub trait PermissionProvider: Send + Sync {
    fn has(&self, principal: &PrincipalId, node: &str) -> bool;
    fn grant(&self, principal: &PrincipalId, node: &str);
    fn revoke(&self, principal: &PrincipalId, node: &str);
}

/// External economy used for kit costs and cash rewards.
pub trait EconomyProvider: Send + Sync {
    fn balance(&self, principal: &PrincipalId) -> f64;
    fn withdraw(&self, principal: &PrincipalId, amount: f64);
    fn deposit(&self, principal: &PrincipalId, amount: f64);

    /// Singular currency name, used in messages.
    fn currency_name(&self) -> String;
}

/// Applies kit contents to the host's principals.
pub trait InventoryApplier: Send + Sync {
    /// Add items. In upgrade mode, items replace lesser items of the same
    /// slot instead of stacking beside them.
    fn add_items(&self, principal: &PrincipalId, items: &[Item], upgrade: bool);
    fn apply_effects(&self, principal: &PrincipalId, effects: &[Effect]);
    fn clear_inventory(&self, principal: &PrincipalId);
    fn clear_effects(&self, principal: &PrincipalId);
    fn active_effects(&self, principal: &PrincipalId) -> Vec<Effect>;
    fn remove_effect(&self, principal: &PrincipalId, kind: &str);
}

/// Lists the principals currently connected.
pub trait OnlinePrincipals: Send + Sync {
    fn online(&self) -> Vec<PrincipalId>;
}

impl OnlinePrincipals for Vec<PrincipalId> {
    fn online(&self) -> Vec<PrincipalId> {
        self.clone()
    }
}

/// A principal's permissions as seen by the lattice: its own nodes plus
/// whatever the permission provider reports.
pub(crate) struct Holder<'a> {
    pub principal: &'a dyn Principal,
    pub provider: Option<&'a dyn PermissionProvider>,
}

impl PermissionHolder for Holder<'_> {
    fn has_permission(&self, node: &str) -> bool {
        self.principal.has_permission(node)
            || self
                .provider
                .is_some_and(|provider| provider.has(self.principal.id(), node))
    }
}

//! The KitMaster facade.
//!
//! Owns the kit registry and the collaborators, and exposes the kit grant
//! pipeline plus the administrative operations around it.

use std::path::Path;
use std::sync::Arc;

use kitmaster_core::{Kit, KitRegistry, PrincipalId, SimpleCodec};
use kitmaster_perms::{PermissionNodes, PermsEvaluator, PermsResult};
use kitmaster_store::{HistoryStore, MemoryHistoryStore, MemoryTimestampStore, TimestampStore};
use tracing::info;

use crate::config::KitMasterConfig;
use crate::context::ClearContext;
use crate::error::Result;
use crate::hooks::{HookBus, Interceptor};
use crate::loader::{self, KitCodec};
use crate::services::{EconomyProvider, Holder, InventoryApplier, OnlinePrincipals, PermissionProvider, Principal};

/// Kit registry, collaborators, and the grant pipeline.
///
/// Registry mutation takes `&mut self`; grants and clears take `&self`.
/// Hosts that share one instance between tasks wrap it in a
/// [`SharedKitMaster`](crate::SharedKitMaster).
pub struct KitMaster {
    pub(crate) config: KitMasterConfig,
    pub(crate) nodes: PermissionNodes,
    pub(crate) registry: KitRegistry,
    pub(crate) hooks: HookBus,
    pub(crate) codec: Arc<dyn KitCodec>,
    pub(crate) inventory: Arc<dyn InventoryApplier>,
    pub(crate) history: Arc<dyn HistoryStore>,
    pub(crate) timestamps: Arc<dyn TimestampStore>,
    pub(crate) permissions: Option<Arc<dyn PermissionProvider>>,
    pub(crate) economy: Option<Arc<dyn EconomyProvider>>,
}

/// Builder for [`KitMaster`].
///
/// Only the inventory applier is required. History and timestamps default to
/// the in-memory stores, the codec to [`SimpleCodec`], and the permission
/// and economy providers to none.
pub struct KitMasterBuilder {
    config: KitMasterConfig,
    codec: Arc<dyn KitCodec>,
    inventory: Arc<dyn InventoryApplier>,
    history: Option<Arc<dyn HistoryStore>>,
    timestamps: Option<Arc<dyn TimestampStore>>,
    permissions: Option<Arc<dyn PermissionProvider>>,
    economy: Option<Arc<dyn EconomyProvider>>,
    interceptors: Vec<Box<dyn Interceptor>>,
}

impl KitMasterBuilder {
    pub fn config(mut self, config: KitMasterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn codec(mut self, codec: Arc<dyn KitCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn timestamps(mut self, timestamps: Arc<dyn TimestampStore>) -> Self {
        self.timestamps = Some(timestamps);
        self
    }

    pub fn permissions(mut self, permissions: Arc<dyn PermissionProvider>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn economy(mut self, economy: Arc<dyn EconomyProvider>) -> Self {
        self.economy = Some(economy);
        self
    }

    pub fn interceptor(mut self, interceptor: Box<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn build(self) -> KitMaster {
        let mut hooks = HookBus::new();
        for interceptor in self.interceptors {
            hooks.register(interceptor);
        }

        KitMaster {
            nodes: self.config.nodes(),
            config: self.config,
            registry: KitRegistry::new(),
            hooks,
            codec: self.codec,
            inventory: self.inventory,
            history: self
                .history
                .unwrap_or_else(|| Arc::new(MemoryHistoryStore::new())),
            timestamps: self
                .timestamps
                .unwrap_or_else(|| Arc::new(MemoryTimestampStore::new())),
            permissions: self.permissions,
            economy: self.economy,
        }
    }
}

impl KitMaster {
    /// Start building a KitMaster around the host's inventory applier.
    pub fn builder(inventory: Arc<dyn InventoryApplier>) -> KitMasterBuilder {
        KitMasterBuilder {
            config: KitMasterConfig::default(),
            codec: Arc::new(SimpleCodec),
            inventory,
            history: None,
            timestamps: None,
            permissions: None,
            economy: None,
            interceptors: Vec::new(),
        }
    }

    pub fn config(&self) -> &KitMasterConfig {
        &self.config
    }

    pub fn nodes(&self) -> &PermissionNodes {
        &self.nodes
    }

    pub fn history(&self) -> &dyn HistoryStore {
        self.history.as_ref()
    }

    pub fn timestamps(&self) -> &dyn TimestampStore {
        self.timestamps.as_ref()
    }

    pub fn register_interceptor(&mut self, interceptor: Box<dyn Interceptor>) {
        self.hooks.register(interceptor);
    }

    pub fn unregister_interceptor(&mut self, id: &str) -> bool {
        self.hooks.unregister(id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registry
    // ─────────────────────────────────────────────────────────────────────────

    pub fn registry(&self) -> &KitRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut KitRegistry {
        &mut self.registry
    }

    /// Add a kit, replacing any kit with the same name.
    pub fn register_kit(&mut self, kit: Kit) {
        self.registry.register(kit);
    }

    /// Look up a kit by name or name prefix.
    pub fn get_kit(&self, name: &str) -> Option<Kit> {
        self.registry.get(name)
    }

    /// Look up a kit by identifier or identifier prefix.
    pub fn get_kit_by_identifier(&self, identifier: &str) -> Option<Kit> {
        self.registry.get_by_identifier(identifier)
    }

    /// Load kits from the combined document, then from the kit directory.
    ///
    /// Loaded kits replace same-named kits. Kits that are no longer defined
    /// stay registered; call [`KitRegistry::clear`] first to drop them.
    /// Returns the number of kits loaded.
    pub fn reload_kits(&mut self, kits_file: impl AsRef<Path>, kits_dir: impl AsRef<Path>) -> Result<usize> {
        let kits_file = kits_file.as_ref();
        let mut kits = Vec::new();
        if kits_file.is_file() {
            kits.extend(loader::load_kits_document(kits_file, self.codec.as_ref())?);
        }
        kits.extend(loader::load_path(kits_dir, self.codec.as_ref())?);

        let count = kits.len();
        for kit in kits {
            self.registry.register(kit);
        }
        info!("Loaded {} kits", count);
        Ok(count)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Permissions
    // ─────────────────────────────────────────────────────────────────────────

    /// The lattice verdict for `principal` taking `kit`.
    pub fn kit_perms(&self, principal: &dyn Principal, kit: Option<&Kit>) -> PermsResult {
        let kit = kit.map(|kit| self.registry.resolve(kit));
        let holder = self.holder(principal);
        PermsEvaluator::new(&self.registry, &self.nodes).evaluate(&holder, kit.as_ref())
    }

    pub(crate) fn holder<'a>(&'a self, principal: &'a dyn Principal) -> Holder<'a> {
        Holder {
            principal,
            provider: self.permissions.as_deref(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Administration
    // ─────────────────────────────────────────────────────────────────────────

    /// Strip a principal of everything their kits gave them and forget their
    /// history.
    pub fn clear_kits(&self, principal: &PrincipalId) {
        self.clear_all(principal, ClearContext::PluginOrder);
    }

    /// Clear the kits of every online principal with a history, if the
    /// configuration asks for it. Returns the number of principals cleared.
    pub fn shutdown(&self, online: &dyn OnlinePrincipals) -> usize {
        if !self.config.clear_kits_on_disable {
            return 0;
        }
        let online = online.online();
        let mut cleared = 0;
        for principal in self.history.tracked_principals() {
            if online.contains(&principal) {
                self.clear_all(&principal, ClearContext::PluginDisable);
                cleared += 1;
            }
        }
        cleared
    }
}

impl std::fmt::Debug for KitMaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KitMaster")
            .field("config", &self.config)
            .field("kits", &self.registry.len())
            .field("hooks", &self.hooks)
            .field("permissions", &self.permissions.is_some())
            .field("economy", &self.economy.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingInventory, TestPrincipal};
    use kitmaster_core::{Attribute, Item};
    use std::fs;

    fn master() -> (KitMaster, Arc<RecordingInventory>) {
        let inventory = Arc::new(RecordingInventory::new());
        let master = KitMaster::builder(inventory.clone())
            .config(KitMasterConfig {
                permission_prefix: "kit".into(),
                ..KitMasterConfig::default()
            })
            .build();
        (master, inventory)
    }

    #[test]
    fn test_reload_kits_loads_document_then_directory() {
        let dir = tempfile::tempdir().unwrap();
        let kits_file = dir.path().join("kits.yml");
        let kits_dir = dir.path().join("kits");
        fs::create_dir(&kits_dir).unwrap();
        fs::write(&kits_file, "Warrior:\n  items: [stone_sword]\n").unwrap();
        fs::write(kits_dir.join("Warrior.kit"), "items: [iron_sword]\n").unwrap();

        let (mut master, _) = master();
        assert_eq!(master.reload_kits(&kits_file, &kits_dir).unwrap(), 2);
        assert_eq!(master.registry().len(), 1);
        assert_eq!(master.get_kit("war").unwrap().items[0].material, "iron_sword");
    }

    #[test]
    fn test_kit_perms_uses_prefix_and_resolves() {
        let (mut master, _) = master();
        master.register_kit(Kit::new("Warrior"));
        master.register_kit(
            Kit::new("EliteWarrior")
                .with_attribute(Attribute::Parent, "Warrior")
                .unwrap()
                .with_attribute(Attribute::InheritParentPerms, true)
                .unwrap(),
        );

        let steve = TestPrincipal::new("Steve").with_permission("kit.cmd.Warrior");
        let raw = master.registry().list()[1].clone();
        assert_eq!(master.kit_perms(&steve, Some(&raw)), PermsResult::InheritCommandOnly);
        assert_eq!(master.kit_perms(&steve, None), PermsResult::NullKit);
    }

    #[test]
    fn test_shutdown_clears_only_online_principals() {
        let (mut master, inventory) = master();
        master.register_kit(Kit::new("Warrior").with_item(Item::new("iron_sword", 1)));
        let warrior = master.get_kit("Warrior").unwrap();

        let steve = PrincipalId::new("Steve");
        let alex = PrincipalId::new("Alex");
        master.history().add_to_history(&steve, &warrior);
        master.history().add_to_history(&alex, &warrior);

        let cleared = master.shutdown(&vec![steve.clone()]);
        assert_eq!(cleared, 1);
        assert!(master.history().history(&steve).is_empty());
        assert_eq!(master.history().history(&alex).len(), 1);
        assert_eq!(inventory.clear_count(&steve), 1);
        assert_eq!(inventory.clear_count(&alex), 0);
    }

    #[test]
    fn test_shutdown_respects_config() {
        let inventory = Arc::new(RecordingInventory::new());
        let master = KitMaster::builder(inventory.clone())
            .config(KitMasterConfig {
                clear_kits_on_disable: false,
                ..KitMasterConfig::default()
            })
            .build();
        let steve = PrincipalId::new("Steve");
        master.history().add_to_history(&steve, &Kit::new("Warrior"));

        assert_eq!(master.shutdown(&vec![steve.clone()]), 0);
        assert_eq!(master.history().history(&steve).len(), 1);
    }
}

//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;
use std::time::Duration;

use kitmaster::testing::{MockEconomy, MockPermissions, RecordingInventory, TestPrincipal};
use kitmaster::{GrantContext, GrantResult, KitMaster, KitMasterConfig};
use kitmaster_core::{Attribute, Effect, Item, Kit};
use kitmaster_store::{ManualClock, MemoryHistoryStore, MemoryTimestampStore};

/// Prefix used for permission nodes in fixtures.
pub const FIXTURE_PREFIX: &str = "kit";

/// A KitMaster wired to recording collaborators and a manual clock.
pub struct TestFixture {
    pub master: KitMaster,
    pub inventory: Arc<RecordingInventory>,
    pub permissions: Arc<MockPermissions>,
    pub economy: Arc<MockEconomy>,
    pub history: Arc<MemoryHistoryStore>,
    pub timestamps: Arc<MemoryTimestampStore>,
    pub clock: Arc<ManualClock>,
}

impl TestFixture {
    /// Create a fixture with an economy and a permission provider.
    pub fn new() -> Self {
        Self::with_config(KitMasterConfig {
            permission_prefix: FIXTURE_PREFIX.to_string(),
            ..KitMasterConfig::default()
        })
    }

    pub fn with_config(config: KitMasterConfig) -> Self {
        let inventory = Arc::new(RecordingInventory::new());
        let permissions = Arc::new(MockPermissions::new());
        let economy = Arc::new(MockEconomy::new());
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let history = Arc::new(MemoryHistoryStore::new());
        let timestamps = Arc::new(MemoryTimestampStore::with_clock(clock.clone()));

        let master = KitMaster::builder(inventory.clone())
            .config(config)
            .permissions(permissions.clone())
            .economy(economy.clone())
            .history(history.clone())
            .timestamps(timestamps.clone())
            .build();

        Self {
            master,
            inventory,
            permissions,
            economy,
            history,
            timestamps,
            clock,
        }
    }

    /// Register kits.
    pub fn with_kits(mut self, kits: impl IntoIterator<Item = Kit>) -> Self {
        for kit in kits {
            self.master.register_kit(kit);
        }
        self
    }

    /// A principal holding `nodes`.
    pub fn principal(&self, name: &str, nodes: &[&str]) -> TestPrincipal {
        nodes
            .iter()
            .fold(TestPrincipal::new(name), |principal, node| principal.with_permission(node))
    }

    /// Look a kit up by name and give it.
    pub fn give(&self, principal: &TestPrincipal, kit: &str, context: GrantContext) -> GrantResult {
        let kit = self.master.get_kit(kit);
        self.master.give_kit(principal, kit.as_ref(), context)
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A small kit family: `Warrior`, its child `EliteWarrior` (inherits
/// permissions), and a standalone `Archer`.
pub fn warrior_family() -> Vec<Kit> {
    vec![
        Kit::new("Warrior")
            .with_item(Item::new("iron_sword", 1))
            .with_effect(Effect::new("strength", 0, 600))
            .with_permission("warrior.rage"),
        Kit::new("EliteWarrior")
            .with_item(Item::new("diamond_sword", 1))
            .with_attribute(Attribute::Parent, "Warrior")
            .and_then(|kit| kit.with_attribute(Attribute::InheritParentPerms, true))
            .expect("attribute types match"),
        Kit::new("Archer")
            .with_item(Item::new("bow", 1))
            .with_item(Item::new("arrow", 32)),
    ]
}

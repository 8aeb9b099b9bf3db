//! The kit grant pipeline.
//!
//! A grant runs a fixed sequence of gates, then commits:
//!
//! 1. permissions (skipped by overriding contexts)
//! 2. cooldowns, parent first (skipped by overriding contexts and `notimeout`)
//! 3. affordability (needs an economy; skipped by `nocharge`)
//! 4. history restrictions
//! 5. interceptors, which may cancel unless the context overrides
//!
//! The first failing gate ends the grant with no side effects. Committing
//! runs the kit's clears, gives the parent kit, applies items, effects,
//! permissions and money, and records the grant.

use kitmaster_core::{Attribute, Kit, Lineage};
use kitmaster_perms::{PermissionHolder, PermsResult};
use kitmaster_store::TimeoutStatus;
use tracing::debug;

use crate::context::{GrantContext, GrantResult};
use crate::hooks::GiveKitEvent;
use crate::master::KitMaster;
use crate::services::Principal;

impl KitMaster {
    /// Give `kit` to `principal`.
    ///
    /// The principal is told why when the grant fails.
    pub fn give_kit(&self, principal: &dyn Principal, kit: Option<&Kit>, context: GrantContext) -> GrantResult {
        let Some(kit) = kit else {
            principal.send_message("That kit does not exist");
            return GrantResult::NullKit;
        };
        self.grant(principal, kit, context, &Lineage::of(kit))
    }

    fn grant(&self, principal: &dyn Principal, kit: &Kit, context: GrantContext, lineage: &Lineage) -> GrantResult {
        debug!(principal = %principal.id(), kit = %kit.name, ?context, "attempting to give kit");

        let kit = self.registry.resolve(kit);
        let parent = self.registry.parent_in(&kit, lineage);
        let holder = self.holder(principal);

        if !context.overrides() {
            if let Err(message) = self.check_permissions(principal, &kit, parent.as_ref(), context) {
                principal.send_message(&message);
                return GrantResult::NoPermission;
            }
        }

        if !context.overrides() && !holder.has_permission(&self.nodes.no_timeout()) {
            if let Some(parent) = &parent {
                if let Err(result) = self.check_cooldown(principal, parent, true) {
                    return result;
                }
            }
            if let Err(result) = self.check_cooldown(principal, &kit, false) {
                return result;
            }
        }

        let charged = !holder.has_permission(&self.nodes.no_charge());
        if let Some(economy) = self.economy.as_deref().filter(|_| charged) {
            if economy.balance(principal.id()) < kit.cost() {
                principal.send_message(&format!(
                    "You need {} {} to take the {} kit",
                    kit.cost(),
                    economy.currency_name(),
                    kit.name
                ));
                return GrantResult::InsufficientFunds;
            }
        }

        let history = self.history.history(principal.id());
        if history.iter().any(|taken| taken.flag(Attribute::RestrictKits)) {
            principal.send_message("You've already taken a kit that doesn't allow you to take further kits");
            return GrantResult::Restricted;
        }

        let mut event = GiveKitEvent::new(principal.id().clone(), kit, context);
        self.hooks.dispatch_give(&mut event);
        if event.is_cancelled() && !context.overrides() {
            principal.send_message(&format!("Something prevented you from taking the {} kit", event.kit().name));
            return GrantResult::Cancelled;
        }
        let kit = event.into_kit();

        // Commit
        if context != GrantContext::ParentGiven {
            self.apply_clears(principal.id(), &kit);
        }

        if let Some(parent) = &parent {
            let mut inner = lineage.clone();
            inner.enter(&parent.name);
            let result = self.grant(principal, parent, GrantContext::ParentGiven, &inner);
            debug!(kit = %kit.name, parent = %parent.name, %result, "gave parent kit");
        }

        let upgrade = parent.is_some() && kit.flag(Attribute::Upgrade);
        self.inventory.add_items(principal.id(), &kit.items, upgrade);
        self.inventory.apply_effects(principal.id(), &kit.effects);

        if let Some(permissions) = &self.permissions {
            for node in &kit.permissions {
                permissions.grant(principal.id(), node);
            }
        }

        if let Some(economy) = self.economy.as_deref().filter(|_| charged) {
            economy.withdraw(principal.id(), kit.cost());
            economy.deposit(principal.id(), kit.cash());
        }

        let stamped = if kit.flag(Attribute::GlobalTimeout) {
            None
        } else {
            Some(principal.id())
        };
        self.timestamps.set_timestamp(stamped, &kit);
        self.history.add_to_history(principal.id(), &kit);

        if context.is_taken() {
            principal.send_message(&format!("{} kit taken", kit.name));
        } else if context != GrantContext::ParentGiven {
            principal.send_message(&format!("You were given the {} kit", kit.name));
        }

        GrantResult::Success
    }

    /// The refusal message if the lattice denies `context`'s channel.
    fn check_permissions(
        &self,
        principal: &dyn Principal,
        kit: &Kit,
        parent: Option<&Kit>,
        context: GrantContext,
    ) -> Result<(), String> {
        let verdict = self.kit_perms(principal, Some(kit));
        if verdict.allows(context.channel()) {
            return Ok(());
        }

        let subject = match parent.filter(|_| verdict.is_inherited()) {
            Some(parent) => format!("{} kits", parent.name),
            None => format!("the {} kit", kit.name),
        };
        let message = match verdict.family() {
            PermsResult::CommandOnly => format!("You can't take {subject} from signs"),
            PermsResult::SignOnly => format!("You can't take {subject} by command"),
            _ => format!("You can't take {subject}"),
        };
        Err(message)
    }

    fn check_cooldown(&self, principal: &dyn Principal, kit: &Kit, is_parent: bool) -> Result<(), GrantResult> {
        let article = if is_parent { "a" } else { "the" };

        match self.timestamps.timeout_check(principal.id(), kit) {
            TimeoutStatus::Ok => Ok(()),
            TimeoutStatus::StillCooling => {
                principal.send_message(&format!(
                    "You need to wait {} more seconds before using {} {} kit",
                    self.timestamps.seconds_remaining(principal.id(), kit),
                    article,
                    kit.name
                ));
                Err(GrantResult::Timeout)
            }
            TimeoutStatus::SingleUseExhausted => {
                principal.send_message(&format!("You can only use {} {} kit once", article, kit.name));
                Err(GrantResult::SingleUse)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::PermissionProvider;
    use crate::testing::{InventoryOp, MockEconomy, MockPermissions, RecordingInventory, ScriptedInterceptor, TestPrincipal};
    use crate::KitMasterConfig;
    use kitmaster_core::{Effect, Item, PrincipalId};
    use kitmaster_store::{ManualClock, MemoryTimestampStore};
    use std::sync::Arc;
    use std::time::Duration;

    struct Setup {
        master: KitMaster,
        inventory: Arc<RecordingInventory>,
        economy: Arc<MockEconomy>,
        perms: Arc<MockPermissions>,
        clock: Arc<ManualClock>,
    }

    fn setup(kits: Vec<Kit>) -> Setup {
        let inventory = Arc::new(RecordingInventory::new());
        let economy = Arc::new(MockEconomy::new());
        let perms = Arc::new(MockPermissions::new());
        let clock = Arc::new(ManualClock::new(0));
        let mut master = KitMaster::builder(inventory.clone())
            .config(KitMasterConfig {
                permission_prefix: "kit".into(),
                ..KitMasterConfig::default()
            })
            .economy(economy.clone())
            .permissions(perms.clone())
            .timestamps(Arc::new(MemoryTimestampStore::with_clock(clock.clone())))
            .build();
        for kit in kits {
            master.register_kit(kit);
        }
        Setup {
            master,
            inventory,
            economy,
            perms,
            clock,
        }
    }

    fn warrior() -> Kit {
        Kit::new("Warrior")
            .with_item(Item::new("iron_sword", 1))
            .with_effect(Effect::new("strength", 0, 600))
            .with_permission("warrior.rage")
    }

    fn steve() -> TestPrincipal {
        TestPrincipal::new("Steve").with_permission("kit.kit.*")
    }

    #[test]
    fn test_null_kit() {
        let s = setup(vec![]);
        let principal = steve();
        assert_eq!(s.master.give_kit(&principal, None, GrantContext::CommandTaken), GrantResult::NullKit);
        assert!(s.inventory.ops().is_empty());
    }

    #[test]
    fn test_successful_grant_applies_everything() {
        let s = setup(vec![warrior()
            .with_attribute(Attribute::Cost, 10)
            .unwrap()
            .with_attribute(Attribute::Cash, 3)
            .unwrap()]);
        let principal = steve();
        let id = principal.id().clone();
        s.economy.set_balance(&id, 50.0);

        let kit = s.master.get_kit("Warrior");
        assert_eq!(s.master.give_kit(&principal, kit.as_ref(), GrantContext::CommandTaken), GrantResult::Success);

        assert_eq!(s.inventory.items(&id), vec![Item::new("iron_sword", 1)]);
        assert_eq!(s.inventory.effects(&id).len(), 1);
        assert!(s.perms.nodes(&id).contains("warrior.rage"));
        assert_eq!(s.economy.balance_of(&id), 43.0);
        assert_eq!(s.master.history().history(&id).len(), 1);
        assert_eq!(principal.last_message().as_deref(), Some("Warrior kit taken"));
    }

    #[test]
    fn test_channel_denials() {
        let s = setup(vec![warrior()]);
        let kit = s.master.get_kit("Warrior");

        let commander = TestPrincipal::new("Commander").with_permission("kit.cmd.Warrior");
        assert_eq!(
            s.master.give_kit(&commander, kit.as_ref(), GrantContext::SignTaken),
            GrantResult::NoPermission
        );
        assert_eq!(
            commander.last_message().as_deref(),
            Some("You can't take the Warrior kit from signs")
        );
        assert_eq!(
            s.master.give_kit(&commander, kit.as_ref(), GrantContext::CommandTaken),
            GrantResult::Success
        );

        let nobody = TestPrincipal::new("Nobody");
        assert_eq!(
            s.master.give_kit(&nobody, kit.as_ref(), GrantContext::PluginGiven),
            GrantResult::NoPermission
        );
        assert_eq!(nobody.last_message().as_deref(), Some("You can't take the Warrior kit"));

        // Overriding contexts skip the check
        assert_eq!(
            s.master.give_kit(&nobody, kit.as_ref(), GrantContext::CommandGiven),
            GrantResult::Success
        );
        assert_eq!(nobody.last_message().as_deref(), Some("You were given the Warrior kit"));
    }

    #[test]
    fn test_inherited_denial_names_parent() {
        let elite = Kit::new("EliteWarrior")
            .with_attribute(Attribute::Parent, "Warrior")
            .unwrap()
            .with_attribute(Attribute::InheritParentPerms, true)
            .unwrap();
        let s = setup(vec![warrior(), elite]);
        let principal = TestPrincipal::new("Steve").with_permission("kit.cmd.Warrior");

        let kit = s.master.get_kit("EliteWarrior");
        assert_eq!(
            s.master.give_kit(&principal, kit.as_ref(), GrantContext::SignTaken),
            GrantResult::NoPermission
        );
        assert_eq!(
            principal.last_message().as_deref(),
            Some("You can't take Warrior kits from signs")
        );
    }

    #[test]
    fn test_required_parent_denial_names_parent() {
        let recruit = Kit::new("Recruit")
            .with_item(Item::new("stick", 1))
            .with_attribute(Attribute::Parent, "Warrior")
            .unwrap()
            .with_attribute(Attribute::RequireParentPerms, true)
            .unwrap();
        let s = setup(vec![warrior(), recruit]);
        let principal = TestPrincipal::new("Steve").with_permission("kit.kit.Recruit");

        let kit = s.master.get_kit("Recruit");
        assert_eq!(
            s.master.kit_perms(&principal, kit.as_ref()),
            PermsResult::InheritNone
        );
        assert_eq!(
            s.master.give_kit(&principal, kit.as_ref(), GrantContext::CommandTaken),
            GrantResult::NoPermission
        );
        assert_eq!(principal.last_message().as_deref(), Some("You can't take Warrior kits"));
        assert!(s.inventory.ops().is_empty());
    }

    #[test]
    fn test_provider_permissions_count() {
        let s = setup(vec![warrior()]);
        let principal = TestPrincipal::new("Steve");
        s.perms.grant(principal.id(), "kit.sign.Warrior");

        let kit = s.master.get_kit("Warrior");
        assert_eq!(s.master.give_kit(&principal, kit.as_ref(), GrantContext::SignTaken), GrantResult::Success);
    }

    #[test]
    fn test_cooldown_and_notimeout() {
        let s = setup(vec![warrior().with_attribute(Attribute::Timeout, 60).unwrap()]);
        let principal = steve();
        let kit = s.master.get_kit("Warrior");

        assert!(s.master.give_kit(&principal, kit.as_ref(), GrantContext::CommandTaken).is_success());
        s.clock.advance(Duration::from_secs(15));
        assert_eq!(
            s.master.give_kit(&principal, kit.as_ref(), GrantContext::CommandTaken),
            GrantResult::Timeout
        );
        assert_eq!(
            principal.last_message().as_deref(),
            Some("You need to wait 45 more seconds before using the Warrior kit")
        );

        principal.grant("kit.notimeout");
        assert!(s.master.give_kit(&principal, kit.as_ref(), GrantContext::CommandTaken).is_success());
    }

    #[test]
    fn test_parent_cooldown_blocks_child() {
        let base = Kit::new("Base").with_attribute(Attribute::Timeout, -1).unwrap();
        let child = Kit::new("Child").with_attribute(Attribute::Parent, "Base").unwrap();
        let s = setup(vec![base, child]);
        let principal = steve();

        let base = s.master.get_kit("Base");
        assert!(s.master.give_kit(&principal, base.as_ref(), GrantContext::CommandTaken).is_success());

        let child = s.master.get_kit("Child");
        assert_eq!(
            s.master.give_kit(&principal, child.as_ref(), GrantContext::CommandTaken),
            GrantResult::SingleUse
        );
        assert_eq!(principal.last_message().as_deref(), Some("You can only use a Base kit once"));
    }

    #[test]
    fn test_restricted_by_history() {
        let s = setup(vec![
            Kit::new("Hardcore").with_attribute(Attribute::RestrictKits, true).unwrap(),
            warrior(),
        ]);
        let principal = steve();

        let hardcore = s.master.get_kit("Hardcore");
        assert!(s.master.give_kit(&principal, hardcore.as_ref(), GrantContext::CommandTaken).is_success());

        let kit = s.master.get_kit("Warrior");
        assert_eq!(
            s.master.give_kit(&principal, kit.as_ref(), GrantContext::CommandGiven),
            GrantResult::Restricted
        );
    }

    #[test]
    fn test_interceptor_cancel_and_override() {
        let s = setup(vec![warrior()]);
        let mut master = s.master;
        master.register_interceptor(Box::new(ScriptedInterceptor::new("veto").cancel_gives()));
        let principal = steve();
        let kit = master.get_kit("Warrior");

        assert_eq!(
            master.give_kit(&principal, kit.as_ref(), GrantContext::CommandTaken),
            GrantResult::Cancelled
        );
        assert!(s.inventory.ops().is_empty());

        assert_eq!(
            master.give_kit(&principal, kit.as_ref(), GrantContext::PluginGivenOverride),
            GrantResult::Success
        );
    }

    #[test]
    fn test_interceptor_replaces_kit() {
        let s = setup(vec![warrior()]);
        let mut master = s.master;
        let replacement = Kit::new("Warrior").with_item(Item::new("golden_sword", 1));
        master.register_interceptor(Box::new(ScriptedInterceptor::new("swap").replace_kit(replacement)));
        let principal = steve();

        let kit = master.get_kit("Warrior");
        assert!(master.give_kit(&principal, kit.as_ref(), GrantContext::CommandTaken).is_success());
        assert_eq!(s.inventory.items(principal.id()), vec![Item::new("golden_sword", 1)]);
        assert!(s.perms.nodes(principal.id()).is_empty());
    }

    #[test]
    fn test_interceptors_run_in_priority_order() {
        let s = setup(vec![warrior()]);
        let mut master = s.master;
        let archer = Kit::new("Archer").with_item(Item::new("bow", 1));
        let early = ScriptedInterceptor::new("early").with_priority(10).replace_kit(archer);
        let late = ScriptedInterceptor::new("late").with_priority(200);
        master.register_interceptor(Box::new(late.clone()));
        master.register_interceptor(Box::new(early.clone()));
        let principal = steve();

        let kit = master.get_kit("Warrior");
        assert!(master.give_kit(&principal, kit.as_ref(), GrantContext::CommandTaken).is_success());

        let id = principal.id().clone();
        assert_eq!(early.gives(), vec![(id.clone(), "Warrior".to_string(), GrantContext::CommandTaken)]);
        // The later interceptor sees the replacement
        assert_eq!(late.gives(), vec![(id.clone(), "Archer".to_string(), GrantContext::CommandTaken)]);
        assert_eq!(s.inventory.items(&id), vec![Item::new("bow", 1)]);
        assert_eq!(principal.last_message().as_deref(), Some("Archer kit taken"));
    }

    #[test]
    fn test_upgrade_only_with_parent() {
        let base = Kit::new("Base").with_item(Item::new("wooden_sword", 1));
        let upgraded = Kit::new("Upgraded")
            .with_attribute(Attribute::Parent, "Base")
            .unwrap()
            .with_attribute(Attribute::Upgrade, true)
            .unwrap()
            .with_item(Item::new("iron_sword", 1));
        let s = setup(vec![base, upgraded]);
        let principal = steve();
        let id = PrincipalId::new("Steve");

        let kit = s.master.get_kit("Upgraded");
        assert!(s.master.give_kit(&principal, kit.as_ref(), GrantContext::CommandTaken).is_success());

        let adds: Vec<_> = s
            .inventory
            .ops()
            .into_iter()
            .filter_map(|op| match op {
                InventoryOp::AddItems { items, upgrade, .. } => Some((items[0].material.clone(), upgrade)),
                _ => None,
            })
            .collect();
        assert_eq!(
            adds,
            vec![("wooden_sword".to_string(), false), ("iron_sword".to_string(), true)]
        );
        let names: Vec<_> = s.master.history().history(&id).into_iter().map(|k| k.name).collect();
        assert_eq!(names, vec!["Base", "Upgraded"]);
    }

    #[test]
    fn test_global_timeout_blocks_everyone() {
        let s = setup(vec![Kit::new("Airdrop")
            .with_attribute(Attribute::Timeout, 300)
            .unwrap()
            .with_attribute(Attribute::GlobalTimeout, true)
            .unwrap()]);
        let kit = s.master.get_kit("Airdrop");

        assert!(s.master.give_kit(&steve(), kit.as_ref(), GrantContext::CommandTaken).is_success());
        let alex = TestPrincipal::new("Alex").with_permission("kit.kit.*");
        assert_eq!(
            s.master.give_kit(&alex, kit.as_ref(), GrantContext::CommandTaken),
            GrantResult::Timeout
        );
    }
}

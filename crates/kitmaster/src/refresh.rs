//! Keeps infinite effects topped up.
//!
//! Kits with `InfiniteEffects` want their effects to last as long as the
//! principal holds the kit. A periodic pass re-applies those effects for
//! every online principal, first removing any active instance that has
//! decayed below the kit's potency.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use kitmaster_core::Attribute;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use crate::master::KitMaster;
use crate::services::OnlinePrincipals;

/// Shortest period the refresher runs at.
pub const MIN_REFRESH_PERIOD: Duration = Duration::from_millis(1);

/// A KitMaster shared between the host and background tasks.
pub type SharedKitMaster = Arc<Mutex<KitMaster>>;

impl KitMaster {
    /// Re-apply the effects of every infinite-effects kit in the history of
    /// each online principal. Returns the number of effects applied.
    pub fn refresh_infinite_effects(&self, online: &dyn OnlinePrincipals) -> usize {
        let mut applied = 0;

        for principal in online.online() {
            for kit in self.history.history(&principal) {
                if !kit.flag(Attribute::InfiniteEffects) {
                    continue;
                }
                for effect in &kit.effects {
                    let decayed = self
                        .inventory
                        .active_effects(&principal)
                        .iter()
                        .any(|active| active.kind == effect.kind && active.potency < effect.potency);
                    if decayed {
                        self.inventory.remove_effect(&principal, &effect.kind);
                    }
                    self.inventory.apply_effects(&principal, std::slice::from_ref(effect));
                    applied += 1;
                }
            }
        }

        applied
    }
}

/// Run [`KitMaster::refresh_infinite_effects`] every `period` until the
/// returned task is aborted.
///
/// The first pass runs one period after spawning. Each pass holds the lock
/// for its whole duration. A zero period is raised to one millisecond. Must
/// be called from within a tokio runtime.
pub fn spawn_effect_refresher(
    shared: SharedKitMaster,
    online: Arc<dyn OnlinePrincipals>,
    period: Duration,
) -> JoinHandle<()> {
    let period = period.max(MIN_REFRESH_PERIOD);
    tokio::spawn(async move {
        let mut interval = time::interval_at(time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let applied = {
                let master = shared.lock().unwrap_or_else(PoisonError::into_inner);
                master.refresh_infinite_effects(online.as_ref())
            };
            debug!(applied, "refreshed infinite effects");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingInventory;
    use kitmaster_core::{Effect, Kit, PrincipalId};

    fn infinite() -> Kit {
        Kit::new("Speedster")
            .with_effect(Effect::new("speed", 2, 600))
            .with_attribute(Attribute::InfiniteEffects, true)
            .unwrap()
    }

    #[test]
    fn test_refresh_replaces_decayed_effects() {
        let inventory = Arc::new(RecordingInventory::new());
        let master = KitMaster::builder(inventory.clone()).build();
        let steve = PrincipalId::new("Steve");
        master.history().add_to_history(&steve, &infinite());
        inventory.set_effects(&steve, vec![Effect::new("speed", 1, 20)]);

        assert_eq!(master.refresh_infinite_effects(&vec![steve.clone()]), 1);
        assert_eq!(inventory.effects(&steve), vec![Effect::new("speed", 2, 600)]);
    }

    #[test]
    fn test_refresh_keeps_stronger_effects() {
        let inventory = Arc::new(RecordingInventory::new());
        let master = KitMaster::builder(inventory.clone()).build();
        let steve = PrincipalId::new("Steve");
        master.history().add_to_history(&steve, &infinite());
        inventory.set_effects(&steve, vec![Effect::new("speed", 4, 100)]);

        master.refresh_infinite_effects(&vec![steve.clone()]);
        assert_eq!(inventory.effects(&steve), vec![Effect::new("speed", 4, 100)]);
    }

    #[test]
    fn test_refresh_skips_offline_and_plain_kits() {
        let inventory = Arc::new(RecordingInventory::new());
        let master = KitMaster::builder(inventory.clone()).build();
        let steve = PrincipalId::new("Steve");
        let alex = PrincipalId::new("Alex");
        master.history().add_to_history(&steve, &infinite());
        master
            .history()
            .add_to_history(&alex, &Kit::new("Plain").with_effect(Effect::new("speed", 1, 20)));

        assert_eq!(master.refresh_infinite_effects(&vec![alex.clone()]), 0);
        assert!(inventory.effects(&steve).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_refresher_ticks() {
        let inventory = Arc::new(RecordingInventory::new());
        let master = KitMaster::builder(inventory.clone()).build();
        let steve = PrincipalId::new("Steve");
        master.history().add_to_history(&steve, &infinite());

        let shared: SharedKitMaster = Arc::new(Mutex::new(master));
        let online: Arc<dyn OnlinePrincipals> = Arc::new(vec![steve.clone()]);
        let handle = spawn_effect_refresher(shared, online, Duration::from_millis(750));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(inventory.apply_count(&steve), 0);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(inventory.apply_count(&steve), 2);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_does_not_kill_the_refresher() {
        let inventory = Arc::new(RecordingInventory::new());
        let master = KitMaster::builder(inventory.clone()).build();
        let steve = PrincipalId::new("Steve");
        master.history().add_to_history(&steve, &infinite());

        let shared: SharedKitMaster = Arc::new(Mutex::new(master));
        let online: Arc<dyn OnlinePrincipals> = Arc::new(vec![steve.clone()]);
        let handle = spawn_effect_refresher(shared, online, Duration::ZERO);

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(!handle.is_finished());
        assert!(inventory.apply_count(&steve) >= 1);

        handle.abort();
    }
}

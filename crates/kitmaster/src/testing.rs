//! In-memory collaborators for tests.
//!
//! Available to this crate's tests, and to other crates through the
//! `test-utils` feature.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use kitmaster_core::{Effect, Item, Kit, PrincipalId};

use crate::context::{ClearContext, GrantContext};
use crate::hooks::{ClearKitsEvent, GiveKitEvent, Interceptor};
use crate::services::{EconomyProvider, InventoryApplier, PermissionProvider, Principal};

/// A principal with a fixed set of nodes that keeps every message it receives.
#[derive(Debug)]
pub struct TestPrincipal {
    id: PrincipalId,
    nodes: Mutex<HashSet<String>>,
    messages: Mutex<Vec<String>>,
}

impl TestPrincipal {
    pub fn new(name: &str) -> Self {
        Self {
            id: PrincipalId::new(name),
            nodes: Mutex::new(HashSet::new()),
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn with_permission(self, node: &str) -> Self {
        self.grant(node);
        self
    }

    pub fn grant(&self, node: &str) {
        self.nodes.lock().unwrap().insert(node.to_string());
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn last_message(&self) -> Option<String> {
        self.messages.lock().unwrap().last().cloned()
    }
}

impl Principal for TestPrincipal {
    fn id(&self) -> &PrincipalId {
        &self.id
    }

    fn has_permission(&self, node: &str) -> bool {
        self.nodes.lock().unwrap().contains(node)
    }

    fn send_message(&self, text: &str) {
        self.messages.lock().unwrap().push(text.to_string());
    }
}

/// One call made to a [`RecordingInventory`].
#[derive(Debug, Clone, PartialEq)]
pub enum InventoryOp {
    AddItems {
        principal: PrincipalId,
        items: Vec<Item>,
        upgrade: bool,
    },
    ApplyEffects {
        principal: PrincipalId,
        effects: Vec<Effect>,
    },
    ClearInventory(PrincipalId),
    ClearEffects(PrincipalId),
    RemoveEffect(PrincipalId, String),
}

/// Inventory applier that records every call and tracks items and effects.
///
/// Applying an effect replaces an active effect of the same kind only if the
/// new one is at least as strong.
#[derive(Debug, Default)]
pub struct RecordingInventory {
    ops: Mutex<Vec<InventoryOp>>,
    items: Mutex<HashMap<PrincipalId, Vec<Item>>>,
    effects: Mutex<HashMap<PrincipalId, Vec<Effect>>>,
}

impl RecordingInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<InventoryOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn items(&self, principal: &PrincipalId) -> Vec<Item> {
        self.items.lock().unwrap().get(principal).cloned().unwrap_or_default()
    }

    pub fn effects(&self, principal: &PrincipalId) -> Vec<Effect> {
        self.effects.lock().unwrap().get(principal).cloned().unwrap_or_default()
    }

    /// Overwrite a principal's active effects, e.g. to simulate decay.
    pub fn set_effects(&self, principal: &PrincipalId, effects: Vec<Effect>) {
        self.effects.lock().unwrap().insert(principal.clone(), effects);
    }

    /// Number of inventory clears for `principal`.
    pub fn clear_count(&self, principal: &PrincipalId) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, InventoryOp::ClearInventory(p) if p == principal))
            .count()
    }

    /// Number of effect applications for `principal`.
    pub fn apply_count(&self, principal: &PrincipalId) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, InventoryOp::ApplyEffects { principal: p, .. } if p == principal))
            .count()
    }

    fn record(&self, op: InventoryOp) {
        self.ops.lock().unwrap().push(op);
    }
}

impl InventoryApplier for RecordingInventory {
    fn add_items(&self, principal: &PrincipalId, items: &[Item], upgrade: bool) {
        self.record(InventoryOp::AddItems {
            principal: principal.clone(),
            items: items.to_vec(),
            upgrade,
        });
        self.items
            .lock()
            .unwrap()
            .entry(principal.clone())
            .or_default()
            .extend(items.iter().cloned());
    }

    fn apply_effects(&self, principal: &PrincipalId, effects: &[Effect]) {
        self.record(InventoryOp::ApplyEffects {
            principal: principal.clone(),
            effects: effects.to_vec(),
        });
        let mut all = self.effects.lock().unwrap();
        let active = all.entry(principal.clone()).or_default();
        for effect in effects {
            match active.iter_mut().find(|a| a.kind == effect.kind) {
                Some(existing) if existing.potency <= effect.potency => *existing = effect.clone(),
                Some(_) => {}
                None => active.push(effect.clone()),
            }
        }
    }

    fn clear_inventory(&self, principal: &PrincipalId) {
        self.record(InventoryOp::ClearInventory(principal.clone()));
        self.items.lock().unwrap().remove(principal);
    }

    fn clear_effects(&self, principal: &PrincipalId) {
        self.record(InventoryOp::ClearEffects(principal.clone()));
        self.effects.lock().unwrap().remove(principal);
    }

    fn active_effects(&self, principal: &PrincipalId) -> Vec<Effect> {
        self.effects(principal)
    }

    fn remove_effect(&self, principal: &PrincipalId, kind: &str) {
        self.record(InventoryOp::RemoveEffect(principal.clone(), kind.to_string()));
        if let Some(active) = self.effects.lock().unwrap().get_mut(principal) {
            active.retain(|effect| effect.kind != kind);
        }
    }
}

/// Permission provider backed by a map.
#[derive(Debug, Default)]
pub struct MockPermissions {
    nodes: Mutex<HashMap<PrincipalId, BTreeSet<String>>>,
}

impl MockPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self, principal: &PrincipalId) -> BTreeSet<String> {
        self.nodes.lock().unwrap().get(principal).cloned().unwrap_or_default()
    }
}

impl PermissionProvider for MockPermissions {
    fn has(&self, principal: &PrincipalId, node: &str) -> bool {
        self.nodes
            .lock()
            .unwrap()
            .get(principal)
            .is_some_and(|nodes| nodes.contains(node))
    }

    fn grant(&self, principal: &PrincipalId, node: &str) {
        self.nodes
            .lock()
            .unwrap()
            .entry(principal.clone())
            .or_default()
            .insert(node.to_string());
    }

    fn revoke(&self, principal: &PrincipalId, node: &str) {
        if let Some(nodes) = self.nodes.lock().unwrap().get_mut(principal) {
            nodes.remove(node);
        }
    }
}

/// Economy backed by a map. Unknown principals have a zero balance.
#[derive(Debug, Default)]
pub struct MockEconomy {
    balances: Mutex<HashMap<PrincipalId, f64>>,
}

impl MockEconomy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, principal: &PrincipalId, amount: f64) {
        self.balances.lock().unwrap().insert(principal.clone(), amount);
    }

    pub fn balance_of(&self, principal: &PrincipalId) -> f64 {
        self.balances.lock().unwrap().get(principal).copied().unwrap_or_default()
    }
}

impl EconomyProvider for MockEconomy {
    fn balance(&self, principal: &PrincipalId) -> f64 {
        self.balance_of(principal)
    }

    fn withdraw(&self, principal: &PrincipalId, amount: f64) {
        *self.balances.lock().unwrap().entry(principal.clone()).or_default() -= amount;
    }

    fn deposit(&self, principal: &PrincipalId, amount: f64) {
        *self.balances.lock().unwrap().entry(principal.clone()).or_default() += amount;
    }

    fn currency_name(&self) -> String {
        "coin".to_string()
    }
}

/// What a [`ScriptedInterceptor`] saw.
#[derive(Debug, Default)]
pub struct InterceptorLog {
    pub gives: Mutex<Vec<(PrincipalId, String, GrantContext)>>,
    pub clears: Mutex<Vec<(ClearContext, bool, bool, bool)>>,
}

/// Interceptor with canned behaviour that records what it sees.
///
/// Clones share one log, so a test can keep a clone after registering.
#[derive(Debug, Clone)]
pub struct ScriptedInterceptor {
    id: String,
    priority: i32,
    cancel_gives: bool,
    cancel_clears: bool,
    keep_inventory: bool,
    replacement: Option<Kit>,
    log: Arc<InterceptorLog>,
}

impl ScriptedInterceptor {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            priority: 100,
            cancel_gives: false,
            cancel_clears: false,
            keep_inventory: false,
            replacement: None,
            log: Arc::default(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn cancel_gives(mut self) -> Self {
        self.cancel_gives = true;
        self
    }

    pub fn cancel_clears(mut self) -> Self {
        self.cancel_clears = true;
        self
    }

    /// Drop the inventory scope from every clear.
    pub fn keep_inventory(mut self) -> Self {
        self.keep_inventory = true;
        self
    }

    /// Swap every given kit for `kit`.
    pub fn replace_kit(mut self, kit: Kit) -> Self {
        self.replacement = Some(kit);
        self
    }

    pub fn gives(&self) -> Vec<(PrincipalId, String, GrantContext)> {
        self.log.gives.lock().unwrap().clone()
    }

    pub fn clears(&self) -> Vec<(ClearContext, bool, bool, bool)> {
        self.log.clears.lock().unwrap().clone()
    }
}

impl Interceptor for ScriptedInterceptor {
    fn id(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn on_give(&self, event: &mut GiveKitEvent) {
        self.log.gives.lock().unwrap().push((
            event.principal().clone(),
            event.kit().name.clone(),
            event.context(),
        ));
        if let Some(kit) = &self.replacement {
            event.set_kit(kit.clone());
        }
        if self.cancel_gives {
            event.set_cancelled(true);
        }
    }

    fn on_clear(&self, event: &mut ClearKitsEvent) {
        self.log.clears.lock().unwrap().push((
            event.context(),
            event.clears_inventory(),
            event.clears_effects(),
            event.clears_permissions(),
        ));
        if self.keep_inventory {
            event.set_clears_inventory(false);
        }
        if self.cancel_clears {
            event.set_cancelled(true);
        }
    }
}

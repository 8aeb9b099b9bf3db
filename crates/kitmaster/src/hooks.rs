//! Grant and clear interceptors.
//!
//! Interceptors observe every grant just before it commits, and every clear
//! just before it runs. They may cancel the operation, swap the kit being
//! given, or narrow what a clear touches.
//!
//! Interceptors run in ascending [`priority`](Interceptor::priority) order.
//! Interceptors with equal priority run in registration order. Every
//! interceptor sees the event, including after an earlier one cancelled it,
//! and a later interceptor may un-cancel.

use kitmaster_core::{Kit, PrincipalId};
use tracing::debug;

use crate::context::{ClearContext, GrantContext};

/// Fired before a kit is given.
#[derive(Debug, Clone)]
pub struct GiveKitEvent {
    principal: PrincipalId,
    kit: Kit,
    context: GrantContext,
    cancelled: bool,
}

impl GiveKitEvent {
    pub fn new(principal: PrincipalId, kit: Kit, context: GrantContext) -> Self {
        Self {
            principal,
            kit,
            context,
            cancelled: false,
        }
    }

    pub fn principal(&self) -> &PrincipalId {
        &self.principal
    }

    pub fn context(&self) -> GrantContext {
        self.context
    }

    /// The kit that will be given.
    pub fn kit(&self) -> &Kit {
        &self.kit
    }

    /// Replace the kit that will be given.
    pub fn set_kit(&mut self, kit: Kit) {
        self.kit = kit;
    }

    pub fn kit_mut(&mut self) -> &mut Kit {
        &mut self.kit
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Cancel (or un-cancel) the grant. Overriding contexts ignore this.
    pub fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }

    pub(crate) fn into_kit(self) -> Kit {
        self.kit
    }
}

/// Fired before a principal's kits are cleared.
#[derive(Debug, Clone)]
pub struct ClearKitsEvent {
    principal: PrincipalId,
    context: ClearContext,
    inventory: bool,
    effects: bool,
    permissions: bool,
    cancelled: bool,
}

impl ClearKitsEvent {
    /// A clear of every scope.
    pub fn all(principal: PrincipalId, context: ClearContext) -> Self {
        Self::scoped(principal, true, true, true, context)
    }

    pub fn scoped(
        principal: PrincipalId,
        inventory: bool,
        effects: bool,
        permissions: bool,
        context: ClearContext,
    ) -> Self {
        Self {
            principal,
            context,
            inventory,
            effects,
            permissions,
            cancelled: false,
        }
    }

    pub fn principal(&self) -> &PrincipalId {
        &self.principal
    }

    pub fn context(&self) -> ClearContext {
        self.context
    }

    pub fn clears_inventory(&self) -> bool {
        self.inventory
    }

    pub fn clears_effects(&self) -> bool {
        self.effects
    }

    pub fn clears_permissions(&self) -> bool {
        self.permissions
    }

    pub fn set_clears_inventory(&mut self, clear: bool) {
        self.inventory = clear;
    }

    pub fn set_clears_effects(&mut self, clear: bool) {
        self.effects = clear;
    }

    pub fn set_clears_permissions(&mut self, clear: bool) {
        self.permissions = clear;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }
}

/// Observes and may alter grants and clears.
///
/// Both callbacks default to doing nothing, so an interceptor only needs to
/// implement the events it cares about.
pub trait Interceptor: Send + Sync {
    /// Unique identifier, used to unregister.
    fn id(&self) -> &str;

    /// Lower runs first. Default: 100.
    fn priority(&self) -> i32 {
        100
    }

    fn on_give(&self, _event: &mut GiveKitEvent) {}

    fn on_clear(&self, _event: &mut ClearKitsEvent) {}
}

/// Ordered set of interceptors.
#[derive(Default)]
pub struct HookBus {
    interceptors: Vec<Box<dyn Interceptor>>,
}

impl HookBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an interceptor in priority order.
    pub fn register(&mut self, interceptor: Box<dyn Interceptor>) {
        let priority = interceptor.priority();
        let pos = self
            .interceptors
            .iter()
            .position(|i| i.priority() > priority)
            .unwrap_or(self.interceptors.len());
        self.interceptors.insert(pos, interceptor);
    }

    /// Remove every interceptor with the given id. Returns `true` if any
    /// were removed.
    pub fn unregister(&mut self, id: &str) -> bool {
        let before = self.interceptors.len();
        self.interceptors.retain(|i| i.id() != id);
        self.interceptors.len() < before
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub fn dispatch_give(&self, event: &mut GiveKitEvent) {
        for interceptor in &self.interceptors {
            interceptor.on_give(event);
        }
        if event.is_cancelled() {
            debug!(kit = %event.kit().name, principal = %event.principal(), "give cancelled by interceptor");
        }
    }

    pub fn dispatch_clear(&self, event: &mut ClearKitsEvent) {
        for interceptor in &self.interceptors {
            interceptor.on_clear(event);
        }
        if event.is_cancelled() {
            debug!(principal = %event.principal(), context = ?event.context(), "clear cancelled by interceptor");
        }
    }
}

impl std::fmt::Debug for HookBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.interceptors.iter().map(|i| i.id()))
            .finish()
    }
}

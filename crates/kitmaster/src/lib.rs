//! # KitMaster
//!
//! Grants kits (bundles of items, effects and temporary permission nodes) to
//! principals, subject to permissions, cooldowns, costs and parent kits.
//!
//! ## Overview
//!
//! - **Registry**: kits are loaded from YAML definitions and looked up by
//!   name or identifier, with undefined attributes filled in from the parent
//!   chain
//! - **Permissions**: a lattice of direct, wildcard and inherited grants
//!   decides which channels a principal may take a kit through
//! - **Grant pipeline**: permission, cooldown, cost and restriction gates,
//!   a cancellable interceptor hook, then the kit's clears, its parent, and
//!   finally its contents
//! - **Administration**: clearing a principal's kits, shutdown, and the
//!   periodic refresh of infinite effects
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kitmaster::{GrantContext, KitMaster, KitMasterConfig};
//! # use kitmaster::{InventoryApplier, Principal};
//! # fn example(inventory: Arc<dyn InventoryApplier>, player: &dyn Principal) -> kitmaster::Result<()> {
//! let config = KitMasterConfig::load("config.yml")?;
//! let mut master = KitMaster::builder(inventory).config(config).build();
//! master.reload_kits("kits.yml", "kits")?;
//!
//! let kit = master.get_kit("warrior");
//! let result = master.give_kit(player, kit.as_ref(), GrantContext::CommandTaken);
//! println!("{result}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Re-exports
//!
//! - `kitmaster::core` - Attributes, kits and the registry
//! - `kitmaster::perms` - The permission lattice
//! - `kitmaster::store` - History and cooldown storage

pub mod clear;
pub mod config;
pub mod context;
pub mod error;
pub mod hooks;
pub mod loader;
pub mod master;
pub mod pipeline;
pub mod refresh;
pub mod services;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export component crates
pub use kitmaster_core as core;
pub use kitmaster_perms as perms;
pub use kitmaster_store as store;

pub use clear::ClearPlan;
pub use config::KitMasterConfig;
pub use context::{ClearContext, GrantContext, GrantResult};
pub use error::{KitMasterError, Result};
pub use hooks::{ClearKitsEvent, GiveKitEvent, HookBus, Interceptor};
pub use loader::KitCodec;
pub use master::{KitMaster, KitMasterBuilder};
pub use refresh::{spawn_effect_refresher, SharedKitMaster};
pub use services::{EconomyProvider, InventoryApplier, OnlinePrincipals, PermissionProvider, Principal};

// Re-export commonly used types
pub use kitmaster_core::{Attribute, Effect, Item, Kit, KitRegistry, PrincipalId};
pub use kitmaster_perms::{Channel, PermsResult};

//! # KitMaster Permissions
//!
//! Computes whether a principal may take a kit, and through which channel.
//!
//! ## Overview
//!
//! Access to a kit is expressed with permission nodes built from a
//! configurable prefix (see [`PermissionNodes`]):
//!
//! - `<prefix>.sign.<kit>` - take the kit from a sign
//! - `<prefix>.cmd.<kit>` - take the kit by command
//! - `<prefix>.kit.<kit>` - both of the above
//! - `<prefix>.sign.*`, `<prefix>.cmd.*`, `<prefix>.kit.*` - the same, for every kit
//!
//! The [`PermsEvaluator`] folds these into one of nine [`PermsResult`]
//! verdicts. Grants only ever stack: a wildcard can widen a verdict but
//! never narrow it.
//!
//! ## Inheritance
//!
//! A kit with a parent may opt into the parent's verdict:
//!
//! - `InheritParentPerms` - access to the parent grants access to the child
//! - `RequireParentPerms` - no access to the parent denies the child
//!
//! Verdicts reached this way are reported as the `Inherit*` variants so callers
//! can name the parent kit when refusing a request.

pub mod lattice;
pub mod nodes;
pub mod verdict;

pub use lattice::PermsEvaluator;
pub use nodes::{PermissionHolder, PermissionNodes, DEFAULT_PREFIX};
pub use verdict::{Channel, PermsResult};

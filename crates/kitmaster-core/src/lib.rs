//! # KitMaster Core
//!
//! Pure primitives for KitMaster: attributes, kits, and the kit registry.
//!
//! This crate contains no I/O and no collaborators. It is pure computation
//! over kit definitions.
//!
//! ## Key Types
//!
//! - [`Attribute`] - Closed enumeration of kit settings, each with a path, type and default
//! - [`AttributeTable`] - Sparse, type-checked attribute storage
//! - [`Kit`] - A named bundle of items, effects, permission nodes and attributes
//! - [`KitRegistry`] - Ordered kit collection with exact/prefix lookup and parent resolution
//!
//! ## Parents
//!
//! A kit names its parent through the [`Attribute::Parent`] attribute. The link
//! is resolved by name through the registry on every access, so reloading a
//! parent is immediately visible to its children. See [`registry`].

pub mod attribute;
pub mod error;
pub mod item;
pub mod kit;
pub mod registry;
pub mod types;

pub use attribute::{Attribute, AttributeTable, AttributeValue, ValueKind};
pub use error::{CoreError, Result};
pub use item::{Effect, EffectCodec, Item, ItemCodec, SimpleCodec};
pub use kit::Kit;
pub use registry::{KitRegistry, Lineage};
pub use types::PrincipalId;

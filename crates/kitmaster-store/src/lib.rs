//! # KitMaster Store
//!
//! Storage abstraction for the per-principal records a kit grant leaves
//! behind: which kits a principal has taken (history) and when (timestamps).
//!
//! ## Overview
//!
//! The grant pipeline talks to storage only through the [`HistoryStore`] and
//! [`TimestampStore`] traits, so hosts may keep these records wherever they
//! like. [`MemoryHistoryStore`] and [`MemoryTimestampStore`] keep them in
//! memory and can persist CBOR snapshots between restarts.
//!
//! ## Key Types
//!
//! - [`HistoryStore`] - Ordered record of kits taken per principal
//! - [`TimestampStore`] - Cooldown and single-use bookkeeping
//! - [`TimeoutStatus`] - Outcome of a cooldown check
//! - [`Clock`] - Time source, swappable in tests via [`ManualClock`]
//!
//! ## Design Notes
//!
//! - **Synchronous**: every call completes immediately; nothing blocks on I/O
//!   except explicit snapshot save/load.
//! - **Global cooldowns**: a kit with `GlobalTimeout` is stamped without a
//!   principal, so one grant starts the cooldown for everyone.
//! - **Single use**: a negative `Timeout` means the first stamp is final.

pub mod clock;
pub mod error;
pub mod memory;
pub mod traits;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, StoreError};
pub use memory::{MemoryHistoryStore, MemoryTimestampStore};
pub use traits::{HistoryStore, TimeoutStatus, TimestampStore};

//! Store traits: the abstract interface for grant bookkeeping.
//!
//! The grant pipeline is storage-agnostic. Implementations must tolerate
//! being shared behind an `Arc` and called from the thread that owns the
//! pipeline.

use std::collections::BTreeSet;

use kitmaster_core::{Kit, PrincipalId};

/// Result of a cooldown check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutStatus {
    /// The kit may be taken.
    Ok,
    /// The kit's cooldown has not elapsed yet.
    StillCooling,
    /// The kit is single-use and has been taken.
    SingleUseExhausted,
}

/// Ordered record of kits previously granted to each principal.
pub trait HistoryStore: Send + Sync {
    /// Append a kit to the principal's history.
    fn add_to_history(&self, principal: &PrincipalId, kit: &Kit);

    /// The principal's history, oldest first.
    fn history(&self, principal: &PrincipalId) -> Vec<Kit>;

    /// Forget every kit the principal has taken.
    fn reset_history(&self, principal: &PrincipalId);

    /// Every principal with a history entry.
    fn tracked_principals(&self) -> BTreeSet<PrincipalId>;
}

/// Cooldown and single-use bookkeeping.
pub trait TimestampStore: Send + Sync {
    /// Record that `kit` was taken now.
    ///
    /// `None` stamps the kit globally, for every principal at once.
    fn set_timestamp(&self, principal: Option<&PrincipalId>, kit: &Kit);

    /// Whether `principal` may take `kit` again.
    ///
    /// Kits with `GlobalTimeout` are checked against the global stamp.
    fn timeout_check(&self, principal: &PrincipalId, kit: &Kit) -> TimeoutStatus;

    /// Whole seconds until the cooldown ends, or 0 if it already has.
    fn seconds_remaining(&self, principal: &PrincipalId, kit: &Kit) -> i64;
}

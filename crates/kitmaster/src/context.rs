//! Grant and clear contexts, and grant outcomes.

use std::fmt;

use kitmaster_perms::Channel;
use serde::{Deserialize, Serialize};

/// Why a kit is being given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrantContext {
    /// An administrator gave the kit by command.
    CommandGiven,
    /// The principal took the kit by command.
    CommandTaken,
    /// The principal took the kit from a sign.
    SignTaken,
    /// Another plugin gave the kit, subject to the usual checks.
    PluginGiven,
    /// Another plugin gave the kit, bypassing the checks.
    PluginGivenOverride,
    /// The kit is being given as the parent of another kit.
    ParentGiven,
}

impl GrantContext {
    /// Whether this context bypasses the permission and cooldown gates and
    /// interceptor cancellation.
    pub fn overrides(self) -> bool {
        matches!(
            self,
            GrantContext::CommandGiven | GrantContext::PluginGivenOverride | GrantContext::ParentGiven
        )
    }

    /// The channel the request arrives through.
    pub fn channel(self) -> Channel {
        match self {
            GrantContext::SignTaken => Channel::Sign,
            GrantContext::CommandTaken => Channel::Command,
            _ => Channel::Programmatic,
        }
    }

    /// Whether the principal asked for the kit themselves.
    pub fn is_taken(self) -> bool {
        matches!(self, GrantContext::CommandTaken | GrantContext::SignTaken)
    }
}

/// Outcome of a grant attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrantResult {
    Success,
    /// There was no kit to give.
    NullKit,
    NoPermission,
    /// The kit (or its parent) is still cooling down.
    Timeout,
    /// The kit (or its parent) is single use and was already taken.
    SingleUse,
    InsufficientFunds,
    /// A kit in the principal's history forbids further kits.
    Restricted,
    /// An interceptor cancelled the grant.
    Cancelled,
}

impl GrantResult {
    pub fn is_success(self) -> bool {
        self == GrantResult::Success
    }
}

impl fmt::Display for GrantResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GrantResult::Success => "SUCCESS",
            GrantResult::NullKit => "FAIL_NULL_KIT",
            GrantResult::NoPermission => "FAIL_NO_PERMS",
            GrantResult::Timeout => "FAIL_TIMEOUT",
            GrantResult::SingleUse => "FAIL_SINGLE_USE",
            GrantResult::InsufficientFunds => "FAIL_COST",
            GrantResult::Restricted => "FAIL_RESTRICTED",
            GrantResult::Cancelled => "FAIL_CANCELLED",
        };
        f.write_str(name)
    }
}

/// Why a principal's kits are being cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClearContext {
    /// A kit being given asked for the clear.
    KitAttribute,
    /// An administrator or plugin ordered the clear.
    PluginOrder,
    /// KitMaster is shutting down.
    PluginDisable,
}

//! Permission verdicts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The channel through which a principal asks for a kit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// Clicking a kit sign.
    Sign,
    /// Running a command.
    Command,
    /// Another plugin or an administrator asked on the principal's behalf.
    Programmatic,
}

/// Combined access verdict for one principal and one kit.
///
/// The `Inherit*` variants mean the verdict was reached, wholly or in part,
/// through the kit's parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermsResult {
    /// There was no kit to check.
    NullKit,
    None,
    SignOnly,
    CommandOnly,
    All,
    InheritNone,
    InheritSignOnly,
    InheritCommandOnly,
    InheritAll,
}

impl PermsResult {
    /// Whether the parent kit contributed to this verdict.
    pub fn is_inherited(self) -> bool {
        matches!(
            self,
            PermsResult::InheritNone
                | PermsResult::InheritSignOnly
                | PermsResult::InheritCommandOnly
                | PermsResult::InheritAll
        )
    }

    /// The verdict with its inheritance marker removed.
    pub fn family(self) -> PermsResult {
        match self {
            PermsResult::InheritNone => PermsResult::None,
            PermsResult::InheritSignOnly => PermsResult::SignOnly,
            PermsResult::InheritCommandOnly => PermsResult::CommandOnly,
            PermsResult::InheritAll => PermsResult::All,
            other => other,
        }
    }

    /// Number of channels the verdict opens (0, 1 or 2).
    pub fn rank(self) -> u8 {
        match self.family() {
            PermsResult::All => 2,
            PermsResult::SignOnly | PermsResult::CommandOnly => 1,
            _ => 0,
        }
    }

    /// Whether the verdict lets the principal take the kit through `channel`.
    ///
    /// Programmatic requests only need some access at all.
    pub fn allows(self, channel: Channel) -> bool {
        match (self.family(), channel) {
            (PermsResult::NullKit | PermsResult::None, _) => false,
            (PermsResult::All, _) => true,
            (_, Channel::Programmatic) => true,
            (PermsResult::SignOnly, Channel::Sign) => true,
            (PermsResult::CommandOnly, Channel::Command) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PermsResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PermsResult::NullKit => "NULL_KIT",
            PermsResult::None => "NONE",
            PermsResult::SignOnly => "SIGN_ONLY",
            PermsResult::CommandOnly => "COMMAND_ONLY",
            PermsResult::All => "ALL",
            PermsResult::InheritNone => "INHERIT_NONE",
            PermsResult::InheritSignOnly => "INHERIT_SIGN_ONLY",
            PermsResult::InheritCommandOnly => "INHERIT_COMMAND_ONLY",
            PermsResult::InheritAll => "INHERIT_ALL",
        };
        f.write_str(name)
    }
}

//! Permission node names.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

/// Default node prefix.
pub const DEFAULT_PREFIX: &str = "kitmaster";

/// Anything that can answer "do you hold this permission node?".
pub trait PermissionHolder {
    fn has_permission(&self, node: &str) -> bool;
}

impl PermissionHolder for HashSet<String> {
    fn has_permission(&self, node: &str) -> bool {
        self.contains(node)
    }
}

impl PermissionHolder for BTreeSet<String> {
    fn has_permission(&self, node: &str) -> bool {
        self.contains(node)
    }
}

impl<T: PermissionHolder + ?Sized> PermissionHolder for &T {
    fn has_permission(&self, node: &str) -> bool {
        (**self).has_permission(node)
    }
}

/// Builds the permission node names KitMaster checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionNodes {
    prefix: String,
}

impl PermissionNodes {
    /// Nodes under a custom prefix, e.g. `kit` yields `kit.cmd.Warrior`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Take `kit` from signs.
    pub fn sign(&self, kit: &str) -> String {
        format!("{}.sign.{}", self.prefix, kit)
    }

    /// Take `kit` by command.
    pub fn command(&self, kit: &str) -> String {
        format!("{}.cmd.{}", self.prefix, kit)
    }

    /// Take `kit` through any channel.
    pub fn kit(&self, kit: &str) -> String {
        format!("{}.kit.{}", self.prefix, kit)
    }

    /// Skip cooldown and single-use checks.
    pub fn no_timeout(&self) -> String {
        format!("{}.notimeout", self.prefix)
    }

    /// Take kits without paying or being paid.
    pub fn no_charge(&self) -> String {
        format!("{}.nocharge", self.prefix)
    }
}

impl Default for PermissionNodes {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_nodes() {
        let nodes = PermissionNodes::default();
        assert_eq!(nodes.sign("Warrior"), "kitmaster.sign.Warrior");
        assert_eq!(nodes.command("*"), "kitmaster.cmd.*");
        assert_eq!(nodes.no_charge(), "kitmaster.nocharge");
    }

    #[test]
    fn test_custom_prefix() {
        let nodes = PermissionNodes::new("kit");
        assert_eq!(nodes.command("Warrior"), "kit.cmd.Warrior");
        assert_eq!(nodes.kit("*"), "kit.kit.*");
    }
}

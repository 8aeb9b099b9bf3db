//! KitMaster configuration.

use std::path::Path;
use std::time::Duration;

use kitmaster_perms::{PermissionNodes, DEFAULT_PREFIX};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{KitMasterError, Result};

/// Configuration for a [`KitMaster`](crate::KitMaster).
///
/// Every key is optional in the YAML form:
///
/// ```yaml
/// permission_prefix: kitmaster
/// refresh_interval_ms: 750
/// clear_kits_on_disable: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KitMasterConfig {
    /// Prefix of every permission node KitMaster checks.
    pub permission_prefix: String,
    /// How often infinite effects are refreshed. Must be at least 1.
    #[serde(deserialize_with = "positive_millis")]
    pub refresh_interval_ms: u64,
    /// Whether online principals lose their kits on shutdown.
    pub clear_kits_on_disable: bool,
}

impl Default for KitMasterConfig {
    fn default() -> Self {
        Self {
            permission_prefix: DEFAULT_PREFIX.to_string(),
            refresh_interval_ms: 750,
            clear_kits_on_disable: true,
        }
    }
}

fn positive_millis<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = u64::deserialize(deserializer)?;
    if millis == 0 {
        return Err(serde::de::Error::custom("refresh_interval_ms must be at least 1"));
    }
    Ok(millis)
}

impl KitMasterConfig {
    pub fn from_yaml_str(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit, not to a map
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    /// Read the configuration at `path`. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text).map_err(|e| KitMasterError::yaml(path, e))
    }

    pub fn nodes(&self) -> PermissionNodes {
        PermissionNodes::new(self.permission_prefix.clone())
    }

    /// The refresh period, never shorter than one millisecond.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(1))
    }
}

//! Error types for KitMaster.

use std::path::PathBuf;

use kitmaster_core::CoreError;
use kitmaster_store::StoreError;
use thiserror::Error;

/// Errors that can occur while loading kits, configuration or snapshots.
///
/// Grant failures are not errors; they are reported as
/// [`GrantResult`](crate::GrantResult) values.
#[derive(Debug, Error)]
pub enum KitMasterError {
    /// Kit or attribute construction error.
    #[error("kit error: {0}")]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML document could not be read.
    #[error("invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A document was valid YAML but not a valid kit definition.
    #[error("invalid kit definition: {0}")]
    InvalidDefinition(String),
}

impl KitMasterError {
    pub(crate) fn yaml(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
        KitMasterError::Yaml {
            path: path.into(),
            source,
        }
    }
}

/// Result type for KitMaster operations.
pub type Result<T> = std::result::Result<T, KitMasterError>;

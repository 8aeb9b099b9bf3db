//! Error types for KitMaster Core.

use thiserror::Error;

use crate::attribute::{Attribute, ValueKind};

/// Core errors that can occur while building kits.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("attribute {attribute} expects a {expected} value, got {found}")]
    AttributeTypeMismatch {
        attribute: Attribute,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("failed to parse {input:?}: {reason}")]
    Parse { input: String, reason: String },
}

impl CoreError {
    pub(crate) fn parse(input: &str, reason: impl Into<String>) -> Self {
        CoreError::Parse {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

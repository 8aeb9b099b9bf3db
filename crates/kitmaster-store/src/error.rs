//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur while persisting store snapshots.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Snapshot could not be encoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Snapshot bytes were malformed.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

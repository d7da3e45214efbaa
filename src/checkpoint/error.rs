//! Checkpoint error types.

use thiserror::Error;

/// Errors raised while encoding, decoding or validating a checkpoint.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckpointError {
    #[error("Checkpoint encoding failed: {0}")]
    SerializationFailed(String),

    #[error("Checkpoint decoding failed: {0}")]
    DeserializationFailed(String),

    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Decoded fine, but the contents contradict each other.
    #[error("Checkpoint is inconsistent: {0}")]
    ValidationFailed(String),
}

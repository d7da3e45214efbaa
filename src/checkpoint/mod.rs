//! Checkpoint and resume functionality for state machines.
//!
//! A checkpoint captures the committed state and history of a machine so
//! that a flow can survive a process restart. In-flight actions are not
//! captured; a resumed machine waits for the next event.

use crate::core::{State, StateHistory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable checkpoint of state machine state.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Checkpoint<S: State> {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: Uuid,

    /// Name of the machine the checkpoint was taken from
    pub machine: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Current state of the machine
    pub current_state: S,

    /// Retained transition history
    pub history: StateHistory<S>,
}

impl<S: State> Checkpoint<S> {
    pub fn new(machine: impl Into<String>, current_state: S, history: StateHistory<S>) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4(),
            machine: machine.into(),
            timestamp: Utc::now(),
            current_state,
            history,
        }
    }

    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.validate()
    }

    /// Compact binary encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.validate()
    }

    fn validate(self) -> Result<Self, CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        if let Some(last) = self.history.last() {
            if last.to != self.current_state {
                return Err(CheckpointError::ValidationFailed(format!(
                    "history ends in '{}' but current state is '{}'",
                    last.to.name(),
                    self.current_state.name()
                )));
            }
        }
        Ok(self)
    }
}

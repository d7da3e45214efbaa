//! Engine errors.

use std::fmt;
use thiserror::Error;

/// Errors returned by a running state machine handle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MachineError {
    #[error("State machine '{machine}' has stopped")]
    Stopped { machine: String },

    #[error("Listener of state machine '{machine}' was closed before a matching state")]
    ListenerClosed { machine: String },
}

/// Why an action ended without doing its job.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("{0}")]
    Failed(String),

    #[error("panicked: {0}")]
    Panicked(String),

    /// The runtime dropped the action's task before it finished.
    #[error("cancelled before completion")]
    Cancelled,
}

/// An action failure, as reported back to the machine that spawned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionFailure {
    /// `"<machine>:<action>"`
    pub action: String,
    pub error: ActionError,
}

impl fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Action '{}' {}", self.action, self.error)
    }
}

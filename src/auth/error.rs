//! Auth errors.
//!
//! These travel inside events and states, so they are plain data: cloneable,
//! comparable and serializable.

use crate::effects::MachineError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by the identity provider backend.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceError {
    /// The service answered with an error, e.g. `CodeMismatchException`.
    #[error("{code}: {message}")]
    Api { code: String, message: String },

    #[error("Transport failure: {0}")]
    Transport(String),
}

impl ServiceError {
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Why a flow ended up in an error state.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthError {
    #[error("Service call failed: {0}")]
    Service(#[from] ServiceError),

    /// The service answered but a required field was missing or unusable.
    #[error("Invalid response from {operation}: {message}")]
    InvalidResponse { operation: String, message: String },

    #[error("Software token verification failed: {0}")]
    VerificationFailed(String),

    #[error("Auth configuration error: {0}")]
    Configuration(String),

    /// An action failed or panicked before reporting an outcome.
    #[error("Action {action} did not complete: {message}")]
    ActionFailed { action: String, message: String },
}

impl AuthError {
    pub fn invalid_response(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Errors returned by [`AuthSession`](super::AuthSession) calls.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Machine(#[from] MachineError),

    /// The call does not apply to the state the sign-in is in.
    #[error("Cannot {operation} while sign-in is in state '{state}'")]
    InvalidState {
        operation: &'static str,
        state: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_convert_and_display() {
        let error: AuthError = ServiceError::api("CodeMismatchException", "bad code").into();

        assert_eq!(
            error.to_string(),
            "Service call failed: CodeMismatchException: bad code"
        );
    }

    #[test]
    fn errors_survive_serialization() {
        let error = AuthError::invalid_response("AssociateSoftwareToken", "missing secret code");
        let json = serde_json::to_string(&error).unwrap();

        assert_eq!(serde_json::from_str::<AuthError>(&json).unwrap(), error);
    }
}

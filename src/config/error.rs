//! Configuration errors.

use thiserror::Error;

/// A single problem found while validating a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigViolation {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("'{region}' is not a valid region")]
    MalformedRegion { region: String },

    #[error("pool id '{pool_id}' does not belong to region '{region}'")]
    PoolRegionMismatch { pool_id: String, region: String },
}

/// Errors raised while loading a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read configuration from {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Every violation found, not just the first.
    #[error("Invalid auth configuration: {}", join(.0))]
    Invalid(Vec<ConfigViolation>),
}

fn join(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

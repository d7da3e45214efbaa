//! Build errors for state machines.

use thiserror::Error;

/// Errors that can occur when building a state machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Resolver not specified. Call .resolver(resolver) before .build()")]
    MissingResolver,

    #[error("Environment not specified. Call .environment(env) before .build()")]
    MissingEnvironment,

    #[error("History limit must be greater than zero")]
    InvalidHistoryLimit,

    #[error("State machines must be built inside a tokio runtime")]
    NoRuntime,
}

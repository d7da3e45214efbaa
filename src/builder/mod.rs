//! Builder API for constructing and starting state machines.

pub mod error;
pub mod machine;

pub use error::BuildError;
pub use machine::{StateMachineBuilder, DEFAULT_HISTORY_LIMIT};

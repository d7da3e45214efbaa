//! Core state machine types and logic.
//!
//! This module contains the pure part of the engine:
//! - State definitions via the `State` trait
//! - Events and their timestamped envelopes
//! - Resolvers, the pure transition tables
//! - Transition history tracking
//!
//! Nothing in here performs I/O. Side effects live in [`crate::effects`].

mod event;
mod history;
mod resolver;
mod state;

pub use event::{EventEnvelope, StateMachineEvent};
pub use history::{StateHistory, StateTransition};
pub use resolver::{Resolution, Resolver, StateResolution};
pub use state::State;

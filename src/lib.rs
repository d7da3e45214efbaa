//! Authflow: an event-driven hierarchical state machine engine for
//! multi-step authentication flows.
//!
//! The engine keeps decisions pure and effects at the edge. A [`Resolver`]
//! maps `(state, event)` to the next state and a list of [`Action`]s; the
//! [`StateMachine`] commits the state, notifies listeners, and runs the
//! actions on their own tasks. Actions report back by sending events, so
//! every failure is data flowing through the same queue as success. An
//! action that errors or panics instead is handed to
//! [`Resolver::on_action_failure`].
//!
//! # Core Concepts
//!
//! - **State**: closed enum implementing the [`State`] trait
//! - **Event**: closed enum implementing [`StateMachineEvent`]
//! - **Resolver**: pure transition table; unknown events are no-ops
//! - **Action**: named stillwater effect ending in exactly one follow-up event
//! - **StateMachine**: serialized processing, listeners, checkpoints
//!
//! The [`auth`] module builds a sign-in flow with software token (TOTP) MFA
//! setup on top of this.
//!
//! # Example
//!
//! ```rust
//! use authflow::core::{Resolution, Resolver, State, StateMachineEvent, StateResolution};
//! use authflow::effects::{Action, StateMachine};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
//! enum Light {
//!     Off,
//!     On,
//! }
//!
//! impl State for Light {
//!     fn name(&self) -> &str {
//!         match self {
//!             Self::Off => "Off",
//!             Self::On => "On",
//!         }
//!     }
//! }
//!
//! #[derive(Clone, Debug)]
//! enum Switch {
//!     Flip,
//!     Settle,
//! }
//!
//! impl StateMachineEvent for Switch {
//!     fn event_type(&self) -> &str {
//!         match self {
//!             Self::Flip => "Flip",
//!             Self::Settle => "Settle",
//!         }
//!     }
//! }
//!
//! struct LightResolver;
//!
//! impl Resolver for LightResolver {
//!     type State = Light;
//!     type Event = Switch;
//!     type Environment = ();
//!
//!     fn default_state(&self) -> Light {
//!         Light::Off
//!     }
//!
//!     fn resolve(&self, state: &Light, event: &Switch) -> Resolution<Self> {
//!         match (state, event) {
//!             (Light::Off, Switch::Flip) => {
//!                 StateResolution::with_action(Light::On, Action::emit("Settle", Switch::Settle))
//!             }
//!             _ => StateResolution::new(state.clone()),
//!         }
//!     }
//! }
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
//! # rt.block_on(async {
//! let machine = StateMachine::new(LightResolver, ()).unwrap();
//! let state = machine.send_and_wait(Switch::Flip, |s| *s == Light::On).await.unwrap();
//! assert_eq!(state, Light::On);
//! # });
//! ```

pub mod auth;
pub mod builder;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod effects;

// Re-export commonly used types
pub use builder::{BuildError, StateMachineBuilder};
pub use checkpoint::{Checkpoint, CheckpointError};
pub use config::{AuthConfiguration, ConfigError, UserPoolConfiguration};
pub use core::{
    EventEnvelope, Resolution, Resolver, State, StateHistory, StateMachineEvent, StateResolution,
    StateTransition,
};
pub use effects::{Action, ActionContext, EventDispatcher, MachineError, StateMachine};

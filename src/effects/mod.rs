//! The imperative shell around the pure core.
//!
//! Resolvers decide; this module does. It holds the actions resolvers
//! return, the dispatchers actions report back through, and the
//! [`StateMachine`] engine that ties them together.
//!
//! # Key Concepts
//!
//! - **Actions**: named stillwater effects that end by sending a follow-up event
//! - **Dispatchers**: where those follow-up events go
//! - **State Machine**: serializes event processing and spawns actions
//! - **Listeners**: channel subscriptions to committed transitions

mod action;
mod dispatcher;
mod error;
mod listener;
mod machine;

pub use action::{Action, ActionContext, ActionEffect};
pub use dispatcher::{CollectingDispatcher, EventDispatcher};
pub use error::{ActionError, ActionFailure, MachineError};
pub use listener::{StateChange, Subscription, SubscriptionToken};
pub use machine::{MachineDispatcher, StateMachine};
pub(crate) use machine::MachineParts;

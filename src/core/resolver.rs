//! Pure transition functions.

use super::event::StateMachineEvent;
use super::state::State;
use crate::effects::{Action, ActionFailure};
use std::fmt;

/// Outcome of resolving one event against one state: the next state and
/// the actions the engine must run once that state is committed.
pub struct StateResolution<S, E, Env> {
    pub new_state: S,
    pub actions: Vec<Action<E, Env>>,
}

impl<S, E, Env> StateResolution<S, E, Env> {
    /// Resolution without side effects.
    pub fn new(new_state: S) -> Self {
        Self {
            new_state,
            actions: Vec::new(),
        }
    }

    pub fn with_actions(new_state: S, actions: Vec<Action<E, Env>>) -> Self {
        Self { new_state, actions }
    }

    pub fn with_action(new_state: S, action: Action<E, Env>) -> Self {
        Self {
            new_state,
            actions: vec![action],
        }
    }

    /// Names of the actions, in the order they were produced.
    pub fn action_names(&self) -> Vec<&str> {
        self.actions.iter().map(Action::name).collect()
    }

    /// Wrap the state while keeping the actions, for embedding a child
    /// machine's resolution into a parent state.
    pub fn map_state<T>(self, f: impl FnOnce(S) -> T) -> StateResolution<T, E, Env> {
        StateResolution {
            new_state: f(self.new_state),
            actions: self.actions,
        }
    }
}

impl<S: fmt::Debug, E, Env> fmt::Debug for StateResolution<S, E, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateResolution")
            .field("new_state", &self.new_state)
            .field("actions", &self.action_names())
            .finish()
    }
}

/// Transition table of one machine.
///
/// `resolve` must never fail: an event the current state does not handle
/// resolves to the unchanged state with no actions.
pub trait Resolver: Send + Sync + 'static {
    type State: State;
    type Event: StateMachineEvent;
    type Environment: Send + Sync + 'static;

    /// State a fresh machine starts in.
    fn default_state(&self) -> Self::State;

    fn resolve(
        &self,
        old_state: &Self::State,
        event: &Self::Event,
    ) -> StateResolution<Self::State, Self::Event, Self::Environment>;

    /// Event to resolve when an action failed or panicked instead of
    /// sending its follow-up. `None` only logs the failure.
    fn on_action_failure(
        &self,
        _state: &Self::State,
        _failure: &ActionFailure,
    ) -> Option<Self::Event> {
        None
    }
}

/// Resolution type produced by resolver `R`.
pub type Resolution<R> = StateResolution<
    <R as Resolver>::State,
    <R as Resolver>::Event,
    <R as Resolver>::Environment,
>;

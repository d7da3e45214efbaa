//! Builder for constructing state machines.

use crate::builder::error::BuildError;
use crate::checkpoint::Checkpoint;
use crate::core::{Resolver, StateHistory};
use crate::effects::{MachineParts, StateMachine};
use std::sync::Arc;

/// Number of transitions a machine remembers unless told otherwise.
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// Builder for constructing state machines with a fluent API.
pub struct StateMachineBuilder<R: Resolver> {
    name: Option<String>,
    resolver: Option<R>,
    environment: Option<Arc<R::Environment>>,
    initial: Option<R::State>,
    history: Option<StateHistory<R::State>>,
    history_limit: usize,
}

impl<R: Resolver> StateMachineBuilder<R> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            name: None,
            resolver: None,
            environment: None,
            initial: None,
            history: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Name used in logs and action ids. Defaults to the state type name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the transition table (required).
    pub fn resolver(mut self, resolver: R) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Set the environment actions run against (required).
    pub fn environment(self, environment: R::Environment) -> Self {
        self.shared_environment(Arc::new(environment))
    }

    /// Set an environment that is already shared with other machines.
    pub fn shared_environment(mut self, environment: Arc<R::Environment>) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Start somewhere other than the resolver's default state.
    pub fn initial(mut self, state: R::State) -> Self {
        self.initial = Some(state);
        self
    }

    /// Maximum number of transitions kept in the history.
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Continue from a checkpoint: its name, state and history.
    pub fn resume_from(mut self, checkpoint: Checkpoint<R::State>) -> Self {
        self.name = Some(checkpoint.machine);
        self.initial = Some(checkpoint.current_state);
        self.history = Some(checkpoint.history);
        self
    }

    /// Build and start the state machine.
    /// Returns an error if required fields are missing or no tokio runtime
    /// is running.
    pub fn build(self) -> Result<StateMachine<R>, BuildError> {
        let resolver = self.resolver.ok_or(BuildError::MissingResolver)?;
        let environment = self.environment.ok_or(BuildError::MissingEnvironment)?;

        if self.history_limit == 0 {
            return Err(BuildError::InvalidHistoryLimit);
        }

        let mut history = self.history.unwrap_or_default();
        history.set_limit(Some(self.history_limit));

        let initial = self.initial.unwrap_or_else(|| resolver.default_state());
        let name = self.name.unwrap_or_else(|| default_name::<R>());

        StateMachine::spawn(MachineParts {
            name,
            resolver,
            environment,
            initial,
            history,
        })
    }
}

impl<R: Resolver> Default for StateMachineBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn default_name<R: Resolver>() -> String {
    let full = std::any::type_name::<R::State>();
    full.rsplit("::").next().unwrap_or(full).to_string()
}

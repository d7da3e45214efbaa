//! State machine that serializes event processing and runs actions.

use super::action::{Action, ActionContext};
use super::dispatcher::EventDispatcher;
use super::error::{ActionError, ActionFailure, MachineError};
use super::listener::{StateChange, Subscription, SubscriptionToken};
use crate::builder::{BuildError, StateMachineBuilder};
use crate::checkpoint::Checkpoint;
use crate::core::{
    EventEnvelope, Resolver, State, StateHistory, StateMachineEvent, StateResolution,
    StateTransition,
};
use chrono::Utc;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinError;
use tracing::{debug, trace, warn};

enum Command<S: State, E> {
    Send(EventEnvelope<E>),
    ActionFailed(ActionFailure),
    Listen(SubscriptionToken, mpsc::UnboundedSender<StateChange<S, E>>),
    Cancel(SubscriptionToken),
    CurrentState(oneshot::Sender<S>),
    Snapshot(oneshot::Sender<(S, StateHistory<S>)>),
    Shutdown,
}

/// Dispatcher that feeds events into a machine's queue.
///
/// Hand one to another machine's environment to route events across
/// machine boundaries.
pub struct MachineDispatcher<S: State, E> {
    machine: Arc<str>,
    commands: mpsc::UnboundedSender<Command<S, E>>,
}

impl<S: State, E> Clone for MachineDispatcher<S, E> {
    fn clone(&self) -> Self {
        Self {
            machine: Arc::clone(&self.machine),
            commands: self.commands.clone(),
        }
    }
}

impl<S: State, E> fmt::Debug for MachineDispatcher<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineDispatcher")
            .field("machine", &self.machine)
            .finish()
    }
}

impl<S: State, E: StateMachineEvent> EventDispatcher<E> for MachineDispatcher<S, E> {
    fn send(&self, event: E) {
        let envelope = EventEnvelope::new(event);
        let event_type = envelope.event_type().to_string();
        trace!(machine = %self.machine, event = %event_type, "dispatching event");
        if self.commands.send(Command::Send(envelope)).is_err() {
            warn!(machine = %self.machine, event = %event_type, "dropping event for stopped machine");
        }
    }
}

/// Everything needed to start a machine.
pub(crate) struct MachineParts<R: Resolver> {
    pub name: String,
    pub resolver: R,
    pub environment: Arc<R::Environment>,
    pub initial: R::State,
    pub history: StateHistory<R::State>,
}

/// Handle to a running state machine.
///
/// Events are processed one at a time, in send order, by a single task.
/// Actions produced by a transition run on their own tasks and feed their
/// follow-up events back into the same queue. Handles are cheap to clone;
/// the processing task ends once every handle and in-flight action is gone
/// or [`shutdown`](Self::shutdown) is called.
pub struct StateMachine<R: Resolver> {
    name: Arc<str>,
    commands: mpsc::UnboundedSender<Command<R::State, R::Event>>,
    state: watch::Receiver<R::State>,
}

impl<R: Resolver> Clone for StateMachine<R> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            commands: self.commands.clone(),
            state: self.state.clone(),
        }
    }
}

impl<R: Resolver> fmt::Debug for StateMachine<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("name", &self.name)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl<R: Resolver> StateMachine<R> {
    /// Start a machine in the resolver's default state.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(resolver: R, environment: R::Environment) -> Result<Self, BuildError> {
        StateMachineBuilder::new()
            .resolver(resolver)
            .environment(environment)
            .build()
    }

    pub(crate) fn spawn(parts: MachineParts<R>) -> Result<Self, BuildError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| BuildError::NoRuntime)?;

        let name: Arc<str> = Arc::from(parts.name);
        let (commands, receiver) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(parts.initial.clone());

        debug!(machine = %name, state = parts.initial.name(), "starting state machine");

        let runner = Runner {
            name: Arc::clone(&name),
            resolver: parts.resolver,
            environment: parts.environment,
            current: parts.initial,
            history: parts.history,
            state_tx,
            listeners: HashMap::new(),
            commands: commands.downgrade(),
        };
        runtime.spawn(runner.run(receiver));

        Ok(Self {
            name,
            commands,
            state: state_rx,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue an event, stamped with the current time.
    pub fn send(&self, event: R::Event) -> Result<(), MachineError> {
        self.send_envelope(EventEnvelope::new(event))
    }

    /// Queue an already stamped event.
    pub fn send_envelope(&self, envelope: EventEnvelope<R::Event>) -> Result<(), MachineError> {
        trace!(machine = %self.name, event = envelope.event_type(), "queueing event");
        self.command(Command::Send(envelope))
    }

    /// Latest committed state. Never waits on the processing task.
    pub fn current_state(&self) -> R::State {
        self.state.borrow().clone()
    }

    /// State after every event queued before this call has been resolved.
    ///
    /// Follow-up events from actions that have not finished yet are not
    /// waited for.
    pub async fn get_current_state(&self) -> Result<R::State, MachineError> {
        let (reply, response) = oneshot::channel();
        self.command(Command::CurrentState(reply))?;
        response.await.map_err(|_| self.stopped())
    }

    /// Transition history, ordered after every previously queued event.
    pub async fn history(&self) -> Result<StateHistory<R::State>, MachineError> {
        let (_, history) = self.snapshot().await?;
        Ok(history)
    }

    /// Consistent snapshot of the current state and history.
    pub async fn checkpoint(&self) -> Result<Checkpoint<R::State>, MachineError> {
        let (state, history) = self.snapshot().await?;
        Ok(Checkpoint::new(self.name.to_string(), state, history))
    }

    async fn snapshot(&self) -> Result<(R::State, StateHistory<R::State>), MachineError> {
        let (reply, response) = oneshot::channel();
        self.command(Command::Snapshot(reply))?;
        response.await.map_err(|_| self.stopped())
    }

    /// Register a listener. Every transition committed after this call is
    /// delivered to the returned subscription.
    pub fn listen(&self) -> Result<Subscription<R::State, R::Event>, MachineError> {
        let token = SubscriptionToken::new();
        let (sender, receiver) = mpsc::unbounded_channel();
        self.command(Command::Listen(token, sender))?;
        Ok(Subscription::new(token, receiver))
    }

    pub fn cancel(&self, token: SubscriptionToken) -> Result<(), MachineError> {
        self.command(Command::Cancel(token))
    }

    /// Resolve with the first state matching `predicate`, starting with the
    /// current one.
    pub async fn wait_for<F>(&self, mut predicate: F) -> Result<R::State, MachineError>
    where
        F: FnMut(&R::State) -> bool,
    {
        let mut subscription = self.listen()?;
        let current = self.get_current_state().await?;
        let result = if predicate(&current) {
            Ok(current)
        } else {
            self.next_matching(&mut subscription, predicate).await
        };
        let _ = self.cancel(subscription.token());
        result
    }

    /// Send `event` and resolve with the first committed state, caused by it
    /// or by its follow-ups, that matches `predicate`.
    pub async fn send_and_wait<F>(
        &self,
        event: R::Event,
        predicate: F,
    ) -> Result<R::State, MachineError>
    where
        F: FnMut(&R::State) -> bool,
    {
        let mut subscription = self.listen()?;
        self.send(event)?;
        let result = self.next_matching(&mut subscription, predicate).await;
        let _ = self.cancel(subscription.token());
        result
    }

    async fn next_matching<F>(
        &self,
        subscription: &mut Subscription<R::State, R::Event>,
        mut predicate: F,
    ) -> Result<R::State, MachineError>
    where
        F: FnMut(&R::State) -> bool,
    {
        while let Some(change) = subscription.recv().await {
            if predicate(&change.to) {
                return Ok(change.to);
            }
        }
        Err(MachineError::ListenerClosed {
            machine: self.name.to_string(),
        })
    }

    /// Dispatcher feeding this machine, for use by other machines' actions.
    pub fn dispatcher(&self) -> MachineDispatcher<R::State, R::Event> {
        MachineDispatcher {
            machine: Arc::clone(&self.name),
            commands: self.commands.clone(),
        }
    }

    /// Stop processing. Events queued after this are rejected; events
    /// already queued behind the shutdown are dropped.
    pub fn shutdown(&self) -> Result<(), MachineError> {
        self.command(Command::Shutdown)
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    fn command(&self, command: Command<R::State, R::Event>) -> Result<(), MachineError> {
        self.commands.send(command).map_err(|_| self.stopped())
    }

    fn stopped(&self) -> MachineError {
        MachineError::Stopped {
            machine: self.name.to_string(),
        }
    }
}

/// Owner of the current state; the only writer.
struct Runner<R: Resolver> {
    name: Arc<str>,
    resolver: R,
    environment: Arc<R::Environment>,
    current: R::State,
    history: StateHistory<R::State>,
    state_tx: watch::Sender<R::State>,
    listeners: HashMap<SubscriptionToken, mpsc::UnboundedSender<StateChange<R::State, R::Event>>>,
    commands: mpsc::WeakUnboundedSender<Command<R::State, R::Event>>,
}

impl<R: Resolver> Runner<R> {
    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<Command<R::State, R::Event>>) {
        while let Some(command) = receiver.recv().await {
            match command {
                Command::Send(envelope) => self.process(envelope),
                Command::ActionFailed(failure) => self.action_failed(failure),
                Command::Listen(token, sender) => {
                    trace!(machine = %self.name, listener = %token, "listener registered");
                    self.listeners.insert(token, sender);
                }
                Command::Cancel(token) => {
                    if self.listeners.remove(&token).is_some() {
                        trace!(machine = %self.name, listener = %token, "listener cancelled");
                    }
                }
                Command::CurrentState(reply) => {
                    let _ = reply.send(self.current.clone());
                }
                Command::Snapshot(reply) => {
                    let _ = reply.send((self.current.clone(), self.history.clone()));
                }
                Command::Shutdown => break,
            }
        }
        debug!(machine = %self.name, state = self.current.name(), "state machine stopped");
    }

    fn process(&mut self, envelope: EventEnvelope<R::Event>) {
        let StateResolution { new_state, actions } =
            self.resolver.resolve(&self.current, &envelope.event);

        if new_state != self.current {
            debug!(
                machine = %self.name,
                event = envelope.event_type(),
                from = self.current.name(),
                to = new_state.name(),
                "state transition"
            );
            let from = std::mem::replace(&mut self.current, new_state);
            self.state_tx.send_replace(self.current.clone());
            self.history.record(StateTransition {
                from: from.clone(),
                to: self.current.clone(),
                event: envelope.event_type().to_string(),
                timestamp: Utc::now(),
            });
            self.notify(StateChange {
                from,
                event: envelope,
                to: self.current.clone(),
            });
        } else {
            trace!(
                machine = %self.name,
                event = envelope.event_type(),
                state = self.current.name(),
                "event left state unchanged"
            );
        }

        self.run_actions(actions);
    }

    fn action_failed(&mut self, failure: ActionFailure) {
        match self.resolver.on_action_failure(&self.current, &failure) {
            Some(event) => {
                debug!(
                    machine = %self.name,
                    action = %failure.action,
                    event = event.event_type(),
                    "recovering from action failure"
                );
                self.process(EventEnvelope::new(event));
            }
            None => {
                warn!(machine = %self.name, action = %failure.action, "action failure left unhandled")
            }
        }
    }

    fn notify(&mut self, change: StateChange<R::State, R::Event>) {
        let name = &self.name;
        self.listeners.retain(|token, sender| {
            let delivered = sender.send(change.clone()).is_ok();
            if !delivered {
                trace!(machine = %name, listener = %token, "dropping closed listener");
            }
            delivered
        });
    }

    fn run_actions(&self, actions: Vec<Action<R::Event, R::Environment>>) {
        if actions.is_empty() {
            return;
        }
        let Some(commands) = self.commands.upgrade() else {
            warn!(
                machine = %self.name,
                count = actions.len(),
                "no live handles left, skipping actions"
            );
            return;
        };
        let dispatcher: Arc<dyn EventDispatcher<R::Event>> = Arc::new(MachineDispatcher {
            machine: Arc::clone(&self.name),
            commands: commands.clone(),
        });

        for action in actions {
            let id = format!("{}:{}", self.name, action.name());
            trace!(action = %id, "spawning action");
            let ctx = ActionContext::new(
                id.clone(),
                Arc::clone(&dispatcher),
                Arc::clone(&self.environment),
            );
            tokio::spawn(supervise(id, action.execute(ctx), commands.clone()));
        }
    }
}

/// Run an action on its own task and report a failure or panic back to the
/// machine, which would otherwise wait forever for the follow-up event.
async fn supervise<S, E, F>(id: String, action: F, commands: mpsc::UnboundedSender<Command<S, E>>)
where
    S: State,
    E: Send + 'static,
    F: Future<Output = Result<(), ActionError>> + Send + 'static,
{
    let error = match tokio::spawn(action).await {
        Ok(Ok(())) => return,
        Ok(Err(error)) => error,
        Err(join) => join_failure(join),
    };
    warn!(action = %id, error = %error, "action failed");
    let failure = ActionFailure { action: id, error };
    if commands.send(Command::ActionFailed(failure)).is_err() {
        trace!("machine stopped before action failure was reported");
    }
}

fn join_failure(error: JoinError) -> ActionError {
    if !error.is_panic() {
        return ActionError::Cancelled;
    }
    let payload = error.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    ActionError::Panicked(message)
}

//! Channel-based listeners for committed transitions.

use crate::core::EventEnvelope;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Handle identifying one listener registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionToken(Uuid);

impl SubscriptionToken {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A committed transition, as seen by listeners.
#[derive(Clone, Debug, PartialEq)]
pub struct StateChange<S, E> {
    pub from: S,
    pub event: EventEnvelope<E>,
    pub to: S,
}

/// Receiving end of a listener registration.
///
/// Dropping a subscription is enough to stop receiving; the machine forgets
/// it the next time it tries to deliver a change. Use
/// [`StateMachine::cancel`](crate::effects::StateMachine::cancel) to
/// unregister eagerly.
#[derive(Debug)]
pub struct Subscription<S, E> {
    token: SubscriptionToken,
    receiver: mpsc::UnboundedReceiver<StateChange<S, E>>,
}

impl<S, E> Subscription<S, E> {
    pub(crate) fn new(
        token: SubscriptionToken,
        receiver: mpsc::UnboundedReceiver<StateChange<S, E>>,
    ) -> Self {
        Self { token, receiver }
    }

    pub fn token(&self) -> SubscriptionToken {
        self.token
    }

    /// Next committed transition, or `None` once the machine has stopped or
    /// this subscription was cancelled.
    pub async fn recv(&mut self) -> Option<StateChange<S, E>> {
        self.receiver.recv().await
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<StateChange<S, E>> {
        self.receiver.try_recv().ok()
    }
}

//! Sinks that actions send their follow-up events into.

use std::sync::{Arc, Mutex};

/// Destination for events emitted by actions.
///
/// Sending never fails from the caller's point of view: a dispatcher whose
/// machine has stopped drops the event and logs it.
pub trait EventDispatcher<E>: Send + Sync {
    fn send(&self, event: E);
}

impl<E, D: EventDispatcher<E> + ?Sized> EventDispatcher<E> for Arc<D> {
    fn send(&self, event: E) {
        (**self).send(event)
    }
}

/// Dispatcher that keeps every event it receives.
///
/// Useful for running a single action in isolation and asserting on what it
/// emitted.
#[derive(Debug)]
pub struct CollectingDispatcher<E> {
    events: Mutex<Vec<E>>,
}

impl<E> Default for CollectingDispatcher<E> {
    fn default() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }
}

impl<E: Clone> CollectingDispatcher<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, in send order.
    pub fn events(&self) -> Vec<E> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl<E: Send> EventDispatcher<E> for CollectingDispatcher<E> {
    fn send(&self, event: E) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_dispatcher_keeps_send_order() {
        let dispatcher = CollectingDispatcher::new();
        dispatcher.send(1);
        dispatcher.send(2);
        dispatcher.send(3);

        assert_eq!(dispatcher.events(), vec![1, 2, 3]);
    }

    #[test]
    fn arc_dispatcher_forwards() {
        let dispatcher = Arc::new(CollectingDispatcher::new());
        let shared: Arc<dyn EventDispatcher<&str>> = dispatcher.clone();

        shared.send("hello");

        assert_eq!(dispatcher.events(), vec!["hello"]);
    }
}

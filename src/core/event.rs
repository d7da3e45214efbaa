//! Events and their timestamped envelopes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use uuid::Uuid;

/// Something that happened and that a resolver may react to.
///
/// Events are plain data. The `event_type` is used for logging and for
/// the transition history; it names the variant, not the payload.
pub trait StateMachineEvent: Clone + Debug + Send + Sync + 'static {
    /// Variant name of this event.
    fn event_type(&self) -> &str;
}

/// An event stamped with an identity and a creation time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    pub id: Uuid,
    pub event: E,
    pub time: DateTime<Utc>,
}

impl<E: StateMachineEvent> EventEnvelope<E> {
    /// Wrap an event, stamping it with the current time.
    pub fn new(event: E) -> Self {
        Self::at(event, Utc::now())
    }

    /// Wrap an event with an explicit timestamp.
    pub fn at(event: E, time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event,
            time,
        }
    }

    pub fn event_type(&self) -> &str {
        self.event.event_type()
    }
}

impl<E: StateMachineEvent> From<E> for EventEnvelope<E> {
    fn from(event: E) -> Self {
        Self::new(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    enum Ping {
        Ping,
        Pong(u32),
    }

    impl StateMachineEvent for Ping {
        fn event_type(&self) -> &str {
            match self {
                Self::Ping => "Ping",
                Self::Pong(_) => "Pong",
            }
        }
    }

    #[test]
    fn new_envelope_is_stamped_now() {
        let before = Utc::now();
        let envelope = EventEnvelope::new(Ping::Ping);
        let after = Utc::now();

        assert!(envelope.time >= before && envelope.time <= after);
        assert_eq!(envelope.event_type(), "Ping");
    }

    #[test]
    fn explicit_timestamp_is_kept() {
        let time = Utc::now() - chrono::Duration::minutes(5);
        let envelope = EventEnvelope::at(Ping::Pong(3), time);

        assert_eq!(envelope.time, time);
        assert_eq!(envelope.event, Ping::Pong(3));
    }

    #[test]
    fn envelopes_get_distinct_ids() {
        let a: EventEnvelope<Ping> = Ping::Ping.into();
        let b: EventEnvelope<Ping> = Ping::Ping.into();

        assert_ne!(a.id, b.id);
        assert_eq!(a.event, b.event);
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::domain::access::Actor;

// ============================================================================
// Event Envelope - Event Metadata
// ============================================================================
//
// Wraps domain events with the metadata the event bus and audit trail need.
// GENERIC over the event type.
//
// ============================================================================

/// Generic Event Envelope - wraps any domain event with metadata
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EventEnvelope<E> {
    // Event Identity
    pub event_id: Uuid,
    pub aggregate_id: Uuid,
    pub sequence_number: i64,

    pub event_type: String,

    // Event Payload
    pub event_data: E,

    // Groups the events emitted by one command
    pub correlation_id: Uuid,

    // Who triggered this event
    pub actor: Option<Actor>,

    pub timestamp: DateTime<Utc>,
}

impl<E: DomainEvent> EventEnvelope<E> {
    pub fn new(
        aggregate_id: Uuid,
        sequence_number: i64,
        event_data: E,
        correlation_id: Uuid,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            aggregate_id,
            sequence_number,
            event_type: event_data.event_type().to_string(),
            event_data,
            correlation_id,
            actor: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Wrap the events emitted by one command; sequence numbers continue from
    /// the aggregate version the command was handled against.
    pub fn wrap_all(
        aggregate_id: Uuid,
        base_version: i64,
        events: Vec<E>,
        actor: Option<Actor>,
    ) -> Vec<Self> {
        let correlation_id = Uuid::new_v4();
        events
            .into_iter()
            .zip(1..)
            .map(|(event, offset)| {
                let envelope = Self::new(aggregate_id, base_version + offset, event, correlation_id);
                match actor {
                    Some(actor) => envelope.with_actor(actor),
                    None => envelope,
                }
            })
            .collect()
    }
}

// ============================================================================
// Domain Event Trait
// ============================================================================

/// All domain events implement this to be wrapped and published
pub trait DomainEvent: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync {
    fn event_type(&self) -> &'static str;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::{Actor, Role};

    #[derive(Serialize, Deserialize, Clone, Debug)]
    struct TestEvent {
        data: String,
    }

    impl DomainEvent for TestEvent {
        fn event_type(&self) -> &'static str { "TestEvent" }
    }

    #[test]
    fn test_event_envelope_creation() {
        let aggregate_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();

        let envelope = EventEnvelope::new(
            aggregate_id,
            1,
            TestEvent { data: "test".to_string() },
            correlation_id,
        );

        assert_eq!(envelope.aggregate_id, aggregate_id);
        assert_eq!(envelope.sequence_number, 1);
        assert_eq!(envelope.event_type, "TestEvent");
        assert_eq!(envelope.correlation_id, correlation_id);
        assert!(envelope.actor.is_none());
    }

    #[test]
    fn test_wrap_all_continues_sequence_and_shares_correlation() {
        let aggregate_id = Uuid::new_v4();
        let actor = Actor::new(Uuid::new_v4(), Role::Seller);

        let envelopes = EventEnvelope::wrap_all(
            aggregate_id,
            4,
            vec![
                TestEvent { data: "a".to_string() },
                TestEvent { data: "b".to_string() },
            ],
            Some(actor),
        );

        assert_eq!(envelopes.len(), 2);
        assert_eq!(envelopes[0].sequence_number, 5);
        assert_eq!(envelopes[1].sequence_number, 6);
        assert_eq!(envelopes[0].correlation_id, envelopes[1].correlation_id);
        assert_eq!(envelopes[1].actor, Some(actor));
    }
}

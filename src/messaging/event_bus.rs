use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::delivery::DeliveryEvent;
use crate::domain::order::OrderEvent;
use crate::domain::review::ReviewEvent;
use crate::domain::seller::SellerEvent;
use crate::lifecycle::{DomainEvent, EventEnvelope};

// ============================================================================
// In-Process Event Bus
// ============================================================================
//
// Committed lifecycle events fan out to every subscriber. Publishing never
// blocks the writer: a slow subscriber lags and is told how many messages
// it missed.
//
// ============================================================================

#[derive(Debug, Clone)]
pub enum LifecycleMessage {
    Order(EventEnvelope<OrderEvent>),
    Delivery(EventEnvelope<DeliveryEvent>),
    Review(EventEnvelope<ReviewEvent>),
    Seller(EventEnvelope<SellerEvent>),
}

impl LifecycleMessage {
    /// Topic-style name, e.g. `orders.OrderStatusChanged`
    pub fn topic(&self) -> String {
        match self {
            LifecycleMessage::Order(e) => format!("orders.{}", e.event_type),
            LifecycleMessage::Delivery(e) => format!("deliveries.{}", e.event_type),
            LifecycleMessage::Review(e) => format!("reviews.{}", e.event_type),
            LifecycleMessage::Seller(e) => format!("sellers.{}", e.event_type),
        }
    }

    pub fn aggregate_id(&self) -> Uuid {
        match self {
            LifecycleMessage::Order(e) => e.aggregate_id,
            LifecycleMessage::Delivery(e) => e.aggregate_id,
            LifecycleMessage::Review(e) => e.aggregate_id,
            LifecycleMessage::Seller(e) => e.aggregate_id,
        }
    }
}

impl From<EventEnvelope<OrderEvent>> for LifecycleMessage {
    fn from(envelope: EventEnvelope<OrderEvent>) -> Self {
        LifecycleMessage::Order(envelope)
    }
}

impl From<EventEnvelope<DeliveryEvent>> for LifecycleMessage {
    fn from(envelope: EventEnvelope<DeliveryEvent>) -> Self {
        LifecycleMessage::Delivery(envelope)
    }
}

impl From<EventEnvelope<ReviewEvent>> for LifecycleMessage {
    fn from(envelope: EventEnvelope<ReviewEvent>) -> Self {
        LifecycleMessage::Review(envelope)
    }
}

impl From<EventEnvelope<SellerEvent>> for LifecycleMessage {
    fn from(envelope: EventEnvelope<SellerEvent>) -> Self {
        LifecycleMessage::Seller(envelope)
    }
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LifecycleMessage>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleMessage> {
        self.sender.subscribe()
    }

    /// Publish one message; returns how many subscribers received it
    pub fn publish(&self, message: impl Into<LifecycleMessage>) -> usize {
        let message = message.into();
        let topic = message.topic();
        let key = message.aggregate_id();

        match self.sender.send(message) {
            Ok(receivers) => {
                tracing::debug!(
                    topic = %topic,
                    key = %key,
                    receivers = receivers,
                    "Published to event bus"
                );
                receivers
            }
            Err(_) => {
                tracing::trace!(topic = %topic, key = %key, "No subscribers for event");
                0
            }
        }
    }

    pub fn publish_all<E>(&self, envelopes: Vec<EventEnvelope<E>>)
    where
        E: DomainEvent,
        EventEnvelope<E>: Into<LifecycleMessage>,
    {
        for envelope in envelopes {
            self.publish(envelope);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::{Actor, Role};
    use crate::domain::review::{ReviewEvent, ReviewPublished};
    use chrono::Utc;

    fn published_envelope() -> EventEnvelope<ReviewEvent> {
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        EventEnvelope::new(
            Uuid::new_v4(),
            2,
            ReviewEvent::Published(ReviewPublished { published_by: admin, published_at: Utc::now() }),
            Uuid::new_v4(),
        )
    }

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let bus = EventBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        let envelope = published_envelope();
        let review_id = envelope.aggregate_id;
        assert_eq!(bus.publish(envelope), 2);

        for receiver in [&mut first, &mut second] {
            let message = receiver.recv().await.unwrap();
            assert_eq!(message.aggregate_id(), review_id);
            assert_eq!(message.topic(), "reviews.ReviewPublished");
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_not_an_error() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(published_envelope()), 0);
    }
}

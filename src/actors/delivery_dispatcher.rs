use std::sync::Arc;

use actix::prelude::*;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::domain::access::Actor as Caller;
use crate::domain::delivery::{Delivery, DeliveryCommandHandler, DeliveryError, OpenDelivery};
use crate::domain::order::{OrderEvent, OrderStatus, ShipmentDetails};
use crate::errors::ServiceError;
use crate::lifecycle::EventEnvelope;
use crate::messaging::{EventBus, LifecycleMessage};

// ============================================================================
// Delivery Dispatcher Actor
// ============================================================================
//
// Subscribes to the event bus and turns every `shipped` transition that
// carries shipment details into a pending delivery. Orders shipped without
// details are left to an explicit create_delivery call.
//
// ============================================================================

pub struct DeliveryDispatcher {
    deliveries: Arc<DeliveryCommandHandler>,
    // Subscribed at construction so no event published after `new` is missed
    receiver: Option<broadcast::Receiver<LifecycleMessage>>,
}

impl DeliveryDispatcher {
    pub fn new(deliveries: Arc<DeliveryCommandHandler>, bus: &EventBus) -> Self {
        Self {
            deliveries,
            receiver: Some(bus.subscribe()),
        }
    }
}

impl Actor for DeliveryDispatcher {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!("🚚 DeliveryDispatcher started - listening for shipped orders");

        let Some(mut receiver) = self.receiver.take() else {
            return;
        };
        let addr = ctx.address();

        actix::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(LifecycleMessage::Order(envelope)) => {
                        let Some(shipped) = OrderShipped::from_envelope(&envelope) else {
                            continue;
                        };
                        if addr.send(shipped).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed = missed, "DeliveryDispatcher lagged behind the event bus");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            tracing::info!("DeliveryDispatcher event stream closed");
        });
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        tracing::info!("🛑 DeliveryDispatcher stopped");
    }
}

// ============================================================================
// Messages
// ============================================================================

/// An order moved to `shipped` with shipment details attached
#[derive(Message, Debug, Clone)]
#[rtype(result = "Result<Option<Delivery>, ServiceError>")]
pub struct OrderShipped {
    pub order_id: Uuid,
    pub shipment: ShipmentDetails,
    pub note: Option<String>,
    pub shipped_by: Caller,
}

impl OrderShipped {
    pub fn from_envelope(envelope: &EventEnvelope<OrderEvent>) -> Option<Self> {
        match &envelope.event_data {
            OrderEvent::StatusChanged(change) if change.to == OrderStatus::Shipped => {
                change.shipment.as_ref().map(|shipment| OrderShipped {
                    order_id: envelope.aggregate_id,
                    shipment: shipment.clone(),
                    note: change.note.clone(),
                    shipped_by: change.changed_by,
                })
            }
            _ => None,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

impl Handler<OrderShipped> for DeliveryDispatcher {
    type Result = ResponseFuture<Result<Option<Delivery>, ServiceError>>;

    fn handle(&mut self, msg: OrderShipped, _: &mut Self::Context) -> Self::Result {
        let deliveries = self.deliveries.clone();

        Box::pin(async move {
            let command = OpenDelivery {
                order_id: msg.order_id,
                pickup: msg.shipment.pickup,
                dropoff: None,
                priority: msg.shipment.priority,
                estimated_time: msg.shipment.estimated_time,
                notes: msg.note,
            };

            match deliveries.create_delivery(msg.shipped_by, command).await {
                Ok(delivery) => Ok(Some(delivery)),
                Err(ServiceError::Delivery(DeliveryError::Duplicate(order_id))) => {
                    tracing::debug!(order_id = %order_id, "Delivery already open for shipped order");
                    Ok(None)
                }
                Err(e) => {
                    tracing::warn!(order_id = %msg.order_id, error = %e, "Could not open delivery for shipped order");
                    Err(e)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::Role;
    use crate::domain::delivery::{DeliveryPriority, DeliveryStatus, Location};
    use crate::domain::order::aggregate::tests::test_create_order;
    use crate::domain::order::{Order, OrderCommandHandler, PricingPolicy};
    use crate::metrics::Metrics;
    use crate::store::{MemoryHistoryStore, MemoryStore, MemoryUniqueKeys, RecordStore};
    use crate::utils::RetryConfig;
    use std::time::Duration;

    struct Fixture {
        orders: OrderCommandHandler,
        deliveries: Arc<DeliveryCommandHandler>,
        bus: EventBus,
    }

    fn fixture() -> Fixture {
        let bus = EventBus::default();
        let metrics = Arc::new(Metrics::new().unwrap());
        let order_store: Arc<dyn RecordStore<Order>> = Arc::new(MemoryStore::<Order>::new());

        Fixture {
            orders: OrderCommandHandler::new(
                order_store.clone(),
                Arc::new(MemoryHistoryStore::new()),
                bus.clone(),
                metrics.clone(),
                PricingPolicy::default(),
                RetryConfig::for_conflicts(3),
            ),
            deliveries: Arc::new(DeliveryCommandHandler::new(
                Arc::new(MemoryStore::<Delivery>::new()),
                order_store,
                Arc::new(MemoryUniqueKeys::new()),
                bus.clone(),
                metrics,
                RetryConfig::for_conflicts(3),
            )),
            bus,
        }
    }

    fn shipment() -> ShipmentDetails {
        ShipmentDetails {
            pickup: Location {
                address: "Ferry Fish Market, Dar es Salaam".to_string(),
                latitude: None,
                longitude: None,
            },
            priority: DeliveryPriority::Urgent,
            estimated_time: None,
        }
    }

    async fn ship(fx: &Fixture, details: Option<ShipmentDetails>) -> (Uuid, Caller) {
        let customer = Caller::new(Uuid::new_v4(), Role::Customer);
        let seller = Caller::new(Uuid::new_v4(), Role::Seller);
        let order = fx
            .orders
            .create_order(customer, test_create_order(customer.id, seller.id))
            .await
            .unwrap();

        for to in [OrderStatus::Confirmed, OrderStatus::Processing] {
            fx.orders.update_order_status(seller, order.id, to, None, None).await.unwrap();
        }
        fx.orders
            .update_order_status(seller, order.id, OrderStatus::Shipped, Some("2 cool boxes".to_string()), details)
            .await
            .unwrap();
        (order.id, seller)
    }

    async fn wait_for_delivery(fx: &Fixture, order_id: Uuid) -> Option<Delivery> {
        let admin = Caller::new(Uuid::new_v4(), Role::Admin);
        for _ in 0..50 {
            if let Some(delivery) = fx.deliveries.delivery_for_order(admin, order_id).await.unwrap() {
                return Some(delivery);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        None
    }

    #[actix::test]
    async fn test_shipped_order_with_details_opens_delivery() {
        let fx = fixture();
        let _dispatcher = DeliveryDispatcher::new(fx.deliveries.clone(), &fx.bus).start();

        let (order_id, _) = ship(&fx, Some(shipment())).await;

        let delivery = wait_for_delivery(&fx, order_id).await.expect("delivery was not opened");
        assert_eq!(delivery.status, DeliveryStatus::Pending);
        assert_eq!(delivery.priority, DeliveryPriority::Urgent);
        assert_eq!(delivery.notes.as_deref(), Some("2 cool boxes"));
    }

    #[actix::test]
    async fn test_shipped_without_details_opens_nothing() {
        let fx = fixture();
        let _dispatcher = DeliveryDispatcher::new(fx.deliveries.clone(), &fx.bus).start();

        let (order_id, _) = ship(&fx, None).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(fx.deliveries.all_deliveries().await.unwrap().is_empty());
        assert!(wait_for_delivery(&fx, order_id).await.is_none());
    }

    #[actix::test]
    async fn test_repeated_notice_is_ignored() {
        let fx = fixture();
        let (order_id, seller) = ship(&fx, None).await;
        let dispatcher = DeliveryDispatcher::new(fx.deliveries.clone(), &fx.bus).start();

        let notice = OrderShipped { order_id, shipment: shipment(), note: None, shipped_by: seller };
        let first = dispatcher.send(notice.clone()).await.unwrap().unwrap();
        let second = dispatcher.send(notice).await.unwrap().unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(fx.deliveries.all_deliveries().await.unwrap().len(), 1);
    }
}

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::access::{Actor, Role};
use crate::errors::ServiceError;
use crate::export::orders_csv;
use crate::lifecycle::{execute, Aggregate, Committed, EventEnvelope};
use crate::messaging::EventBus;
use crate::metrics::Metrics;
use crate::projections::OrderFilter;
use crate::store::{HistoryStore, RecordStore, StatusHistoryEntry};
use crate::utils::RetryConfig;

use super::aggregate::Order;
use super::commands::{OrderCommand, PlaceOrder};
use super::events::OrderEvent;
use super::value_objects::{OrderStatus, PaymentStatus, PricingPolicy, ShipmentDetails};

// ============================================================================
// Order Command Handler
// ============================================================================
//
// Orchestrates: Command → Aggregate → Conditional Write → History → Event Bus
//
// The order write and its history row are two separate writes; a failure
// between them leaves the history one row short.
//
// ============================================================================

pub struct OrderCommandHandler {
    orders: Arc<dyn RecordStore<Order>>,
    history: Arc<dyn HistoryStore>,
    bus: EventBus,
    metrics: Arc<Metrics>,
    pricing: PricingPolicy,
    retry: RetryConfig,
}

impl OrderCommandHandler {
    pub fn new(
        orders: Arc<dyn RecordStore<Order>>,
        history: Arc<dyn HistoryStore>,
        bus: EventBus,
        metrics: Arc<Metrics>,
        pricing: PricingPolicy,
        retry: RetryConfig,
    ) -> Self {
        Self { orders, history, bus, metrics, pricing, retry }
    }

    /// Create a `pending` order; totals are computed here and never again
    pub async fn create_order(&self, actor: Actor, command: PlaceOrder) -> Result<Order, ServiceError> {
        let now = Utc::now();
        let event = Order::place(&command, actor, &self.pricing, now)?;
        let order = Order::apply_first_event(&event)?;

        self.orders.insert(&order).await?;
        self.append_history(StatusHistoryEntry::new(
            order.id,
            OrderStatus::Pending,
            Some("Order placed".to_string()),
            Some(actor.id),
            now,
        ))
        .await;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            customer_id = %order.customer_id,
            item_count = order.items.len(),
            total = %order.totals.total,
            "🧾 Order placed"
        );

        self.metrics.record_order_transition(OrderStatus::Pending.as_str());
        self.bus.publish_all(EventEnvelope::wrap_all(order.id, 0, vec![event], Some(actor)));

        Ok(order)
    }

    pub async fn update_order_status(
        &self,
        actor: Actor,
        order_id: Uuid,
        to: OrderStatus,
        note: Option<String>,
        shipment: Option<ShipmentDetails>,
    ) -> Result<Order, ServiceError> {
        self.handle(order_id, OrderCommand::ChangeStatus { actor, to, note, shipment })
            .await
    }

    /// Pending-only cancellation by a party to the order
    pub async fn cancel_order(
        &self,
        actor: Actor,
        order_id: Uuid,
        reason: Option<String>,
    ) -> Result<Order, ServiceError> {
        self.handle(order_id, OrderCommand::Cancel { actor, reason }).await
    }

    pub async fn update_item_status(
        &self,
        actor: Actor,
        order_id: Uuid,
        item_id: Uuid,
        to: OrderStatus,
    ) -> Result<Order, ServiceError> {
        self.handle(order_id, OrderCommand::ChangeItemStatus { actor, item_id, to })
            .await
    }

    pub async fn update_payment_status(
        &self,
        actor: Actor,
        order_id: Uuid,
        to: PaymentStatus,
    ) -> Result<Order, ServiceError> {
        self.handle(order_id, OrderCommand::ChangePaymentStatus { actor, to })
            .await
    }

    /// Handle a command and persist the resulting state
    async fn handle(&self, order_id: Uuid, command: OrderCommand) -> Result<Order, ServiceError> {
        let actor = command.actor();
        let Committed { record, events } = execute(
            self.orders.as_ref(),
            &self.metrics,
            self.retry.clone(),
            order_id,
            actor,
            &command,
        )
        .await?;

        for envelope in &events {
            match &envelope.event_data {
                OrderEvent::StatusChanged(e) => {
                    self.append_history(StatusHistoryEntry::new(
                        order_id,
                        e.to,
                        e.note.clone(),
                        Some(e.changed_by.id),
                        e.changed_at,
                    ))
                    .await;
                    self.metrics.record_order_transition(e.to.as_str());
                    tracing::info!(
                        order_id = %order_id,
                        from = ?e.from,
                        to = ?e.to,
                        actor = %e.changed_by.id,
                        role = %e.changed_by.role,
                        "📦 Order status changed"
                    );
                }
                OrderEvent::ItemStatusChanged(e) => {
                    tracing::info!(
                        order_id = %order_id,
                        item_id = %e.item_id,
                        from = ?e.from,
                        to = ?e.to,
                        "Order item status changed"
                    );
                }
                OrderEvent::PaymentStatusChanged(e) => {
                    tracing::info!(
                        order_id = %order_id,
                        from = ?e.from,
                        to = ?e.to,
                        "💰 Payment status changed"
                    );
                }
                OrderEvent::Placed(_) => {}
            }
        }

        self.bus.publish_all(events);
        Ok(record)
    }

    async fn append_history(&self, entry: StatusHistoryEntry) {
        if let Err(e) = self.history.append(&entry).await {
            tracing::error!(
                order_id = %entry.order_id,
                status = ?entry.status,
                error = %e,
                "Failed to append status history"
            );
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn get_order(&self, actor: Actor, order_id: Uuid) -> Result<Order, ServiceError> {
        let order = self.load(order_id).await?;
        if !order.can_view(&actor) {
            return Err(ServiceError::Forbidden(format!(
                "{} may not view order {}",
                actor.role, order.order_number
            )));
        }
        Ok(order)
    }

    pub async fn order_history(
        &self,
        actor: Actor,
        order_id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>, ServiceError> {
        self.get_order(actor, order_id).await?;
        Ok(self.history.for_order(order_id).await?)
    }

    /// Newest first; customers and sellers only ever see their own orders
    pub async fn list_orders(&self, actor: Actor, filter: OrderFilter) -> Result<Vec<Order>, ServiceError> {
        let filter = scope_filter(actor, filter)?;
        Ok(filter.apply(self.orders.list().await?))
    }

    pub async fn export_orders(&self, actor: Actor, filter: OrderFilter) -> Result<String, ServiceError> {
        let orders = self.list_orders(actor, filter).await?;
        tracing::debug!(rows = orders.len(), "Exporting orders CSV");
        Ok(orders_csv::render(&orders))
    }

    /// Unscoped listing for projections that apply their own scoping
    pub async fn all_orders(&self) -> Result<Vec<Order>, ServiceError> {
        Ok(self.orders.list().await?)
    }

    pub async fn load(&self, order_id: Uuid) -> Result<Order, ServiceError> {
        self.orders
            .get(order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("order", order_id))
    }
}

fn scope_filter(actor: Actor, mut filter: OrderFilter) -> Result<OrderFilter, ServiceError> {
    match actor.role {
        Role::Admin => {}
        Role::Customer => filter.customer_id = Some(actor.id),
        Role::Seller => filter.seller_id = Some(actor.id),
        Role::Distributor => {
            return Err(ServiceError::Forbidden(
                "distributors browse deliveries, not orders".to_string(),
            ))
        }
    }
    Ok(filter)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::order::aggregate::tests::test_create_order;
    use crate::errors::ErrorKind;
    use crate::store::{MemoryHistoryStore, MemoryStore};
    use rust_decimal::Decimal;

    pub(crate) fn test_handler() -> OrderCommandHandler {
        OrderCommandHandler::new(
            Arc::new(MemoryStore::<Order>::new()),
            Arc::new(MemoryHistoryStore::new()),
            EventBus::default(),
            Arc::new(Metrics::new().unwrap()),
            PricingPolicy::default(),
            RetryConfig::for_conflicts(5),
        )
    }

    #[tokio::test]
    async fn test_order_scenario_full_walk() {
        let handler = test_handler();
        let customer = Actor::new(Uuid::new_v4(), Role::Customer);
        let seller = Actor::new(Uuid::new_v4(), Role::Seller);

        let order = handler
            .create_order(customer, test_create_order(customer.id, seller.id))
            .await
            .unwrap();
        assert_eq!(order.totals.total, Decimal::from(105_000));

        for to in [
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            let updated = handler
                .update_order_status(seller, order.id, to, None, None)
                .await
                .unwrap();
            assert_eq!(updated.status, to);
        }

        let err = handler
            .update_order_status(seller, order.id, OrderStatus::Processing, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        let history = handler.order_history(customer, order.id).await.unwrap();
        let statuses: Vec<_> = history.iter().map(|h| h.status).collect();
        assert_eq!(
            statuses,
            vec![
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Processing,
                OrderStatus::Shipped,
                OrderStatus::Delivered,
            ]
        );
    }

    #[tokio::test]
    async fn test_terminal_orders_reject_every_mutation() {
        let handler = test_handler();
        let customer = Actor::new(Uuid::new_v4(), Role::Customer);
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);

        let order = handler
            .create_order(customer, test_create_order(customer.id, Uuid::new_v4()))
            .await
            .unwrap();
        handler.cancel_order(customer, order.id, None).await.unwrap();

        for to in OrderStatus::ALL {
            let err = handler
                .update_order_status(admin, order.id, to, None, None)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        }
        let err = handler.cancel_order(customer, order.id, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    #[tokio::test]
    async fn test_missing_order_is_not_found() {
        let handler = test_handler();
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);

        let err = handler
            .update_order_status(admin, Uuid::new_v4(), OrderStatus::Confirmed, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_serialized_through_the_guard() {
        let handler = Arc::new(test_handler());
        let customer = Actor::new(Uuid::new_v4(), Role::Customer);
        let seller = Actor::new(Uuid::new_v4(), Role::Seller);
        let order = handler
            .create_order(customer, test_create_order(customer.id, seller.id))
            .await
            .unwrap();

        // Both try pending -> confirmed; the loser reloads and finds the
        // transition no longer legal.
        let (a, b) = tokio::join!(
            handler.update_order_status(seller, order.id, OrderStatus::Confirmed, None, None),
            handler.update_order_status(seller, order.id, OrderStatus::Confirmed, None, None),
        );
        let outcomes = [a.is_ok(), b.is_ok()];
        assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);

        let stored = handler.load(order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Confirmed);
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn test_listing_is_scoped_by_role() {
        let handler = test_handler();
        let alice = Actor::new(Uuid::new_v4(), Role::Customer);
        let bob = Actor::new(Uuid::new_v4(), Role::Customer);
        let seller = Actor::new(Uuid::new_v4(), Role::Seller);

        handler.create_order(alice, test_create_order(alice.id, seller.id)).await.unwrap();
        handler.create_order(bob, test_create_order(bob.id, Uuid::new_v4())).await.unwrap();

        assert_eq!(handler.list_orders(alice, OrderFilter::default()).await.unwrap().len(), 1);
        assert_eq!(handler.list_orders(seller, OrderFilter::default()).await.unwrap().len(), 1);

        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        assert_eq!(handler.list_orders(admin, OrderFilter::default()).await.unwrap().len(), 2);

        let distributor = Actor::new(Uuid::new_v4(), Role::Distributor);
        let err = handler.list_orders(distributor, OrderFilter::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = handler
            .get_order(bob, handler.list_orders(alice, OrderFilter::default()).await.unwrap()[0].id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_status_changes_are_published() {
        let handler = test_handler();
        let mut events = handler.bus.subscribe();
        let customer = Actor::new(Uuid::new_v4(), Role::Customer);
        let seller = Actor::new(Uuid::new_v4(), Role::Seller);

        let order = handler
            .create_order(customer, test_create_order(customer.id, seller.id))
            .await
            .unwrap();
        handler
            .update_order_status(seller, order.id, OrderStatus::Confirmed, None, None)
            .await
            .unwrap();

        let placed = events.recv().await.unwrap();
        assert_eq!(placed.topic(), "orders.OrderPlaced");
        let confirmed = events.recv().await.unwrap();
        assert_eq!(confirmed.topic(), "orders.OrderStatusChanged");
    }
}

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::access::{Actor, Role};
use crate::domain::order::Order;
use crate::errors::ServiceError;
use crate::lifecycle::{execute, Aggregate, Committed, EventEnvelope};
use crate::messaging::EventBus;
use crate::metrics::Metrics;
use crate::projections::deliveries::{claim_queue, newest_first};
use crate::store::{Condition, Record, RecordStore, UniqueKeys, DELIVERY_PER_ORDER};
use crate::utils::{retry_on_transient, RetryConfig};

use super::aggregate::Delivery;
use super::commands::{DeliveryCommand, OpenDelivery};
use super::errors::DeliveryError;
use super::events::DeliveryEvent;
use super::value_objects::{DeliveryPriority, DeliveryStatus};

// ============================================================================
// Delivery Command Handler
// ============================================================================
//
// Assignment is the one compare-and-swap in the system: the write is applied
// only while the stored record is still `pending` at the version the claim
// read, so of any number of concurrent claims exactly one lands and an edit
// that slipped in first is reloaded rather than overwritten. Every other
// delivery write is version-checked like orders.
//
// ============================================================================

pub struct DeliveryCommandHandler {
    deliveries: Arc<dyn RecordStore<Delivery>>,
    orders: Arc<dyn RecordStore<Order>>,
    keys: Arc<dyn UniqueKeys>,
    bus: EventBus,
    metrics: Arc<Metrics>,
    retry: RetryConfig,
}

impl DeliveryCommandHandler {
    pub fn new(
        deliveries: Arc<dyn RecordStore<Delivery>>,
        orders: Arc<dyn RecordStore<Order>>,
        keys: Arc<dyn UniqueKeys>,
        bus: EventBus,
        metrics: Arc<Metrics>,
        retry: RetryConfig,
    ) -> Self {
        Self { deliveries, orders, keys, bus, metrics, retry }
    }

    /// Open the single delivery for a processing or shipped order
    pub async fn create_delivery(&self, actor: Actor, command: OpenDelivery) -> Result<Delivery, ServiceError> {
        let order = self
            .orders
            .get(command.order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("order", command.order_id))?;

        let event = Delivery::open(&command, actor, &order, Utc::now())?;
        let delivery = Delivery::apply_first_event(&event)?;

        if !self.keys.reserve(DELIVERY_PER_ORDER, order.id, delivery.id).await? {
            return Err(DeliveryError::Duplicate(order.id).into());
        }
        if let Err(e) = self.deliveries.insert(&delivery).await {
            if let Err(release) = self.keys.release(DELIVERY_PER_ORDER, order.id, delivery.id).await {
                tracing::error!(order_id = %order.id, error = %release, "Failed to release delivery key");
            }
            return Err(e.into());
        }

        tracing::info!(
            delivery_id = %delivery.id,
            delivery_number = %delivery.delivery_number,
            order_id = %order.id,
            priority = %delivery.priority,
            "🚚 Delivery opened"
        );

        self.metrics.record_delivery_transition(DeliveryStatus::Pending.as_str());
        self.bus.publish_all(EventEnvelope::wrap_all(delivery.id, 0, vec![event], Some(actor)));
        Ok(delivery)
    }

    /// Claim a pending delivery; the loser of a race gets `AlreadyAssigned`
    pub async fn assign_delivery(
        &self,
        actor: Actor,
        delivery_id: Uuid,
        distributor_id: Uuid,
    ) -> Result<Delivery, ServiceError> {
        let outcome = retry_on_transient(self.retry.clone(), |attempt| async move {
            let current = self.load(delivery_id).await?;
            let base_version = current.version;
            let events = current.handle_command(&DeliveryCommand::Assign { actor, distributor_id })?;

            let mut claimed = current;
            claimed.apply_all(&events)?;

            let pending_as_read = Condition::StatusAt {
                status: DeliveryStatus::Pending.as_str(),
                version: base_version,
            };
            if !self.deliveries.update(&claimed, pending_as_read).await? {
                // Either another claim or an edit of the pending record landed
                // first; the reload tells them apart
                self.metrics.record_conflict(Delivery::KIND);
                tracing::debug!(
                    delivery_id = %delivery_id,
                    attempt = attempt,
                    "Delivery changed under the claim, reloading"
                );
                return Err(ServiceError::Conflict { kind: Delivery::KIND, id: delivery_id });
            }

            Ok((claimed, base_version, events))
        })
        .await
        .into_result();

        let (claimed, base_version, events) = match outcome {
            Ok(committed) => committed,
            Err(e @ ServiceError::Delivery(DeliveryError::AlreadyAssigned(_))) => {
                self.metrics.record_claim(false);
                tracing::info!(
                    delivery_id = %delivery_id,
                    distributor_id = %distributor_id,
                    "Delivery claim lost, already assigned"
                );
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        self.metrics.record_claim(true);
        self.metrics.record_delivery_transition(DeliveryStatus::Assigned.as_str());
        tracing::info!(
            delivery_id = %delivery_id,
            distributor_id = %distributor_id,
            "✅ Delivery assigned"
        );

        self.bus.publish_all(EventEnvelope::wrap_all(delivery_id, base_version, events, Some(actor)));
        Ok(claimed)
    }

    pub async fn update_delivery_status(
        &self,
        actor: Actor,
        delivery_id: Uuid,
        to: DeliveryStatus,
        note: Option<String>,
    ) -> Result<Delivery, ServiceError> {
        self.handle(delivery_id, actor, DeliveryCommand::ChangeStatus { actor, to, note })
            .await
    }

    pub async fn update_estimate(
        &self,
        actor: Actor,
        delivery_id: Uuid,
        estimated_time: Option<DateTime<Utc>>,
    ) -> Result<Delivery, ServiceError> {
        self.handle(delivery_id, actor, DeliveryCommand::UpdateEstimate { actor, estimated_time })
            .await
    }

    pub async fn reprioritize(
        &self,
        actor: Actor,
        delivery_id: Uuid,
        priority: DeliveryPriority,
    ) -> Result<Delivery, ServiceError> {
        self.handle(delivery_id, actor, DeliveryCommand::Reprioritize { actor, priority })
            .await
    }

    async fn handle(
        &self,
        delivery_id: Uuid,
        actor: Actor,
        command: DeliveryCommand,
    ) -> Result<Delivery, ServiceError> {
        let Committed { record, events } = execute(
            self.deliveries.as_ref(),
            &self.metrics,
            self.retry.clone(),
            delivery_id,
            actor,
            &command,
        )
        .await?;

        for envelope in &events {
            if let DeliveryEvent::StatusChanged(e) = &envelope.event_data {
                self.metrics.record_delivery_transition(e.to.as_str());
                tracing::info!(
                    delivery_id = %delivery_id,
                    from = ?e.from,
                    to = ?e.to,
                    actor = %e.changed_by.id,
                    "🚚 Delivery status changed"
                );
            }
        }

        self.bus.publish_all(events);
        Ok(record)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Claimable deliveries, most urgent first
    pub async fn list_pending_deliveries(&self, actor: Actor) -> Result<Vec<Delivery>, ServiceError> {
        if !matches!(actor.role, Role::Distributor | Role::Admin) {
            return Err(ServiceError::Forbidden(
                "only distributors browse the delivery queue".to_string(),
            ));
        }
        Ok(claim_queue(self.deliveries.list().await?))
    }

    pub async fn get_distributor_deliveries(
        &self,
        actor: Actor,
        distributor_id: Uuid,
        status: Option<DeliveryStatus>,
    ) -> Result<Vec<Delivery>, ServiceError> {
        if !(actor.is_admin() || actor.is(Role::Distributor, distributor_id)) {
            return Err(ServiceError::Forbidden(
                "distributors only see their own deliveries".to_string(),
            ));
        }

        let mine = self
            .deliveries
            .list()
            .await?
            .into_iter()
            .filter(|d| d.is_assigned_to(distributor_id))
            .filter(|d| status.map_or(true, |s| d.status == s))
            .collect();
        Ok(newest_first(mine))
    }

    pub async fn get_delivery(&self, actor: Actor, delivery_id: Uuid) -> Result<Delivery, ServiceError> {
        let delivery = self.load(delivery_id).await?;
        if !can_view(&delivery, &actor) {
            return Err(ServiceError::Forbidden(format!(
                "{} may not view delivery {}",
                actor.role, delivery.delivery_number
            )));
        }
        Ok(delivery)
    }

    pub async fn delivery_for_order(
        &self,
        actor: Actor,
        order_id: Uuid,
    ) -> Result<Option<Delivery>, ServiceError> {
        match self.find_by_order(order_id).await? {
            Some(delivery) if !can_view(&delivery, &actor) => Err(ServiceError::Forbidden(format!(
                "{} may not view delivery {}",
                actor.role, delivery.delivery_number
            ))),
            found => Ok(found),
        }
    }

    pub async fn all_deliveries(&self) -> Result<Vec<Delivery>, ServiceError> {
        Ok(self.deliveries.list().await?)
    }

    async fn find_by_order(&self, order_id: Uuid) -> Result<Option<Delivery>, ServiceError> {
        Ok(self
            .deliveries
            .list()
            .await?
            .into_iter()
            .find(|d| d.order_id == order_id))
    }

    async fn load(&self, delivery_id: Uuid) -> Result<Delivery, ServiceError> {
        self.deliveries
            .get(delivery_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("delivery", delivery_id))
    }
}

fn can_view(delivery: &Delivery, actor: &Actor) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Distributor => delivery.status == DeliveryStatus::Pending || delivery.is_assigned_to(actor.id),
        Role::Customer => delivery.customer_id == actor.id,
        Role::Seller => delivery.seller_ids.contains(&actor.id),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::delivery::aggregate::tests::{processing_order, test_open_delivery};
    use crate::errors::ErrorKind;
    use crate::store::testing::YieldingStore;
    use crate::store::{MemoryStore, MemoryUniqueKeys, StoreError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    pub(crate) struct Fixture {
        pub handler: Arc<DeliveryCommandHandler>,
        pub orders: Arc<MemoryStore<Order>>,
        pub metrics: Arc<Metrics>,
    }

    pub(crate) fn fixture() -> Fixture {
        let orders = Arc::new(MemoryStore::<Order>::new());
        let metrics = Arc::new(Metrics::new().unwrap());
        let handler = Arc::new(DeliveryCommandHandler::new(
            Arc::new(MemoryStore::<Delivery>::new()),
            orders.clone(),
            Arc::new(MemoryUniqueKeys::new()),
            EventBus::default(),
            metrics.clone(),
            RetryConfig::for_conflicts(5),
        ));
        Fixture { handler, orders, metrics }
    }

    /// A stored processing order plus its freshly opened delivery
    pub(crate) async fn opened(fixture: &Fixture) -> (Order, Delivery, Actor) {
        let (order, seller) = processing_order();
        fixture.orders.insert(&order).await.unwrap();
        let delivery = fixture
            .handler
            .create_delivery(seller, test_open_delivery(order.id))
            .await
            .unwrap();
        (order, delivery, seller)
    }

    fn claims(metrics: &Metrics, outcome: &str) -> u64 {
        metrics.delivery_claims.with_label_values(&[outcome]).get()
    }

    #[tokio::test]
    async fn test_two_distributors_race_for_one_delivery() {
        let fx = fixture();
        let (_, delivery, _) = opened(&fx).await;
        let first = Actor::new(Uuid::new_v4(), Role::Distributor);
        let second = Actor::new(Uuid::new_v4(), Role::Distributor);

        let (a, b) = tokio::join!(
            fx.handler.assign_delivery(first, delivery.id, first.id),
            fx.handler.assign_delivery(second, delivery.id, second.id),
        );

        let results = [a, b];
        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        let losers: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(winners.len(), 1);
        assert_eq!(losers.len(), 1);
        assert_eq!(losers[0].kind(), ErrorKind::AlreadyAssigned);

        let winner = winners[0].distributor_id.unwrap();
        let stored = fx
            .handler
            .get_delivery(Actor::new(winner, Role::Distributor), delivery.id)
            .await
            .unwrap();
        assert_eq!(stored.status, DeliveryStatus::Assigned);
        assert_eq!(stored.distributor_id, Some(winner));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_concurrent_claims_exactly_one_wins() {
        let fx = fixture();
        let (_, delivery, _) = opened(&fx).await;

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let handler = fx.handler.clone();
                let distributor = Actor::new(Uuid::new_v4(), Role::Distributor);
                tokio::spawn(async move {
                    handler.assign_delivery(distributor, delivery.id, distributor.id).await
                })
            })
            .collect();

        let mut won = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => won += 1,
                Err(e) => assert_eq!(e.kind(), ErrorKind::AlreadyAssigned),
            }
        }

        assert_eq!(won, 1);
        assert_eq!(claims(&fx.metrics, "won"), 1);
        assert_eq!(claims(&fx.metrics, "lost"), 7);
    }

    /// Memory store that lands one estimate edit right before the next
    /// claim write, as if a seller saved it between the claim's read and
    /// its write
    struct EditBeforeClaim {
        inner: MemoryStore<Delivery>,
        estimate: Mutex<Option<DateTime<Utc>>>,
    }

    impl EditBeforeClaim {
        fn take_estimate(&self) -> Option<DateTime<Utc>> {
            self.estimate.lock().unwrap().take()
        }
    }

    #[async_trait]
    impl RecordStore<Delivery> for EditBeforeClaim {
        async fn insert(&self, record: &Delivery) -> Result<(), StoreError> {
            self.inner.insert(record).await
        }

        async fn get(&self, id: Uuid) -> Result<Option<Delivery>, StoreError> {
            self.inner.get(id).await
        }

        async fn list(&self) -> Result<Vec<Delivery>, StoreError> {
            self.inner.list().await
        }

        async fn update(&self, record: &Delivery, condition: Condition) -> Result<bool, StoreError> {
            let edit = if matches!(condition, Condition::StatusAt { .. }) {
                self.take_estimate()
            } else {
                None
            };
            if let Some(estimate) = edit {
                let mut edited = self.inner.get(record.id).await?.unwrap();
                let read_at = edited.version;
                edited.estimated_time = Some(estimate);
                edited.version += 1;
                assert!(self.inner.update(&edited, Condition::VersionIs(read_at)).await?);
            }
            self.inner.update(record, condition).await
        }

        async fn count(&self) -> Result<usize, StoreError> {
            self.inner.count().await
        }
    }

    #[tokio::test]
    async fn test_claim_reloads_instead_of_overwriting_a_pending_edit() {
        let estimate = Utc::now() + chrono::Duration::hours(3);
        let store = Arc::new(EditBeforeClaim {
            inner: MemoryStore::new(),
            estimate: Mutex::new(Some(estimate)),
        });
        let orders = Arc::new(MemoryStore::<Order>::new());
        let handler = DeliveryCommandHandler::new(
            store.clone(),
            orders.clone(),
            Arc::new(MemoryUniqueKeys::new()),
            EventBus::default(),
            Arc::new(Metrics::new().unwrap()),
            RetryConfig::for_conflicts(5),
        );

        let (order, seller) = processing_order();
        orders.insert(&order).await.unwrap();
        let delivery = handler.create_delivery(seller, test_open_delivery(order.id)).await.unwrap();
        assert_eq!(delivery.version, 1);

        let first = Actor::new(Uuid::new_v4(), Role::Distributor);
        let claimed = handler.assign_delivery(first, delivery.id, first.id).await.unwrap();
        assert_eq!(claimed.version, 3);
        assert_eq!(claimed.estimated_time, Some(estimate));

        let stored = store.get(delivery.id).await.unwrap().unwrap();
        assert_eq!(stored.status, DeliveryStatus::Assigned);
        assert_eq!(stored.distributor_id, Some(first.id));
        assert_eq!(stored.estimated_time, Some(estimate));

        // A writer still holding the edited pending record cannot undo the claim
        let rollback = Delivery {
            status: DeliveryStatus::Pending,
            distributor_id: None,
            version: 3,
            ..stored.clone()
        };
        assert!(!store.update(&rollback, Condition::VersionIs(2)).await.unwrap());

        let second = Actor::new(Uuid::new_v4(), Role::Distributor);
        let err = handler.assign_delivery(second, delivery.id, second.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyAssigned);
    }

    #[tokio::test]
    async fn test_one_delivery_per_order() {
        let fx = fixture();
        let (order, _, seller) = opened(&fx).await;

        let err = fx
            .handler
            .create_delivery(seller, test_open_delivery(order.id))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Duplicate);
    }

    #[tokio::test]
    async fn test_concurrent_opens_for_one_order_create_one_delivery() {
        let deliveries = Arc::new(YieldingStore::<Delivery>::new());
        let orders = Arc::new(MemoryStore::<Order>::new());
        let handler = DeliveryCommandHandler::new(
            deliveries.clone(),
            orders.clone(),
            Arc::new(MemoryUniqueKeys::new()),
            EventBus::default(),
            Arc::new(Metrics::new().unwrap()),
            RetryConfig::for_conflicts(5),
        );
        let (order, seller) = processing_order();
        orders.insert(&order).await.unwrap();

        // Shipped-event dispatch and an explicit create arriving together
        let (a, b) = tokio::join!(
            handler.create_delivery(seller, test_open_delivery(order.id)),
            handler.create_delivery(seller, test_open_delivery(order.id)),
        );

        let failures: Vec<_> = [a, b].into_iter().filter_map(Result::err).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind(), ErrorKind::Duplicate);
        assert_eq!(deliveries.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_distributor_lifecycle_and_listing() {
        let fx = fixture();
        let (order, delivery, _) = opened(&fx).await;
        let distributor = Actor::new(Uuid::new_v4(), Role::Distributor);

        assert_eq!(fx.handler.list_pending_deliveries(distributor).await.unwrap().len(), 1);
        fx.handler.assign_delivery(distributor, delivery.id, distributor.id).await.unwrap();
        assert!(fx.handler.list_pending_deliveries(distributor).await.unwrap().is_empty());

        for to in [DeliveryStatus::PickedUp, DeliveryStatus::InTransit, DeliveryStatus::Delivered] {
            fx.handler
                .update_delivery_status(distributor, delivery.id, to, None)
                .await
                .unwrap();
        }

        let delivered = fx
            .handler
            .get_distributor_deliveries(distributor, distributor.id, Some(DeliveryStatus::Delivered))
            .await
            .unwrap();
        assert_eq!(delivered.len(), 1);
        assert!(delivered[0].pickup_time.is_some());
        assert!(delivered[0].delivery_time.is_some());

        // Delivery updates never touch the order
        let stored_order = fx.orders.get(order.id).await.unwrap().unwrap();
        assert_eq!(stored_order.status, order.status);

        let other = Actor::new(Uuid::new_v4(), Role::Distributor);
        let err = fx
            .handler
            .get_distributor_deliveries(other, distributor.id, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_customers_cannot_browse_the_queue() {
        let fx = fixture();
        let (order, delivery, _) = opened(&fx).await;
        let customer = Actor::new(order.customer_id, Role::Customer);

        let err = fx.handler.list_pending_deliveries(customer).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let own = fx.handler.delivery_for_order(customer, order.id).await.unwrap();
        assert_eq!(own.map(|d| d.id), Some(delivery.id));
    }
}

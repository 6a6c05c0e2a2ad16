use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::access::{Actor, Role};
use crate::domain::order::Order;
use crate::errors::ServiceError;
use crate::lifecycle::{execute, Aggregate, Committed, EventEnvelope};
use crate::messaging::EventBus;
use crate::metrics::Metrics;
use crate::projections::RatingSummary;
use crate::store::{RecordStore, UniqueKeys, REVIEW_PER_ORDER_ITEM};
use crate::utils::RetryConfig;

use super::aggregate::Review;
use super::commands::{ReviewCommand, SubmitReview};
use super::errors::ReviewError;
use super::value_objects::ReviewStatus;

// ============================================================================
// Review Command Handler
// ============================================================================

pub struct ReviewCommandHandler {
    reviews: Arc<dyn RecordStore<Review>>,
    orders: Arc<dyn RecordStore<Order>>,
    keys: Arc<dyn UniqueKeys>,
    bus: EventBus,
    metrics: Arc<Metrics>,
    retry: RetryConfig,
}

impl ReviewCommandHandler {
    pub fn new(
        reviews: Arc<dyn RecordStore<Review>>,
        orders: Arc<dyn RecordStore<Order>>,
        keys: Arc<dyn UniqueKeys>,
        bus: EventBus,
        metrics: Arc<Metrics>,
        retry: RetryConfig,
    ) -> Self {
        Self { reviews, orders, keys, bus, metrics, retry }
    }

    /// Verified-purchase review of a delivered order item
    pub async fn create_review(&self, actor: Actor, command: SubmitReview) -> Result<Review, ServiceError> {
        let order = self
            .orders
            .list()
            .await?
            .into_iter()
            .find(|order| order.item(command.order_item_id).is_some())
            .ok_or_else(|| ServiceError::not_found("order item", command.order_item_id))?;

        let event = Review::submit(&command, actor, &order, Utc::now())?;
        let review = Review::apply_first_event(&event)?;

        let item_id = command.order_item_id;
        if !self.keys.reserve(REVIEW_PER_ORDER_ITEM, item_id, review.id).await? {
            return Err(ReviewError::Duplicate(item_id).into());
        }
        if let Err(e) = self.reviews.insert(&review).await {
            if let Err(release) = self.keys.release(REVIEW_PER_ORDER_ITEM, item_id, review.id).await {
                tracing::error!(order_item_id = %item_id, error = %release, "Failed to release review key");
            }
            return Err(e.into());
        }

        tracing::info!(
            review_id = %review.id,
            product_id = %review.product_id,
            seller_id = %review.seller_id,
            rating = review.rating.value(),
            "⭐ Review submitted"
        );

        self.metrics.record_review_action("submitted");
        self.bus.publish_all(EventEnvelope::wrap_all(review.id, 0, vec![event], Some(actor)));
        Ok(review)
    }

    pub async fn add_seller_response(
        &self,
        actor: Actor,
        review_id: Uuid,
        text: String,
    ) -> Result<Review, ServiceError> {
        let review = self
            .handle(review_id, actor, ReviewCommand::Respond { actor, text })
            .await?;
        self.metrics.record_review_action("responded");
        tracing::info!(review_id = %review_id, seller_id = %actor.id, "Seller responded to review");
        Ok(review)
    }

    pub async fn publish_review(&self, actor: Actor, review_id: Uuid) -> Result<Review, ServiceError> {
        let review = self.handle(review_id, actor, ReviewCommand::Publish { actor }).await?;
        self.metrics.record_review_action("published");
        tracing::info!(review_id = %review_id, "Review published");
        Ok(review)
    }

    async fn handle(&self, review_id: Uuid, actor: Actor, command: ReviewCommand) -> Result<Review, ServiceError> {
        let Committed { record, events } = execute(
            self.reviews.as_ref(),
            &self.metrics,
            self.retry.clone(),
            review_id,
            actor,
            &command,
        )
        .await?;

        self.bus.publish_all(events);
        Ok(record)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// The seller and admins see every review; everyone else sees published ones
    pub async fn get_seller_reviews(
        &self,
        actor: Actor,
        seller_id: Uuid,
        status: Option<ReviewStatus>,
    ) -> Result<Vec<Review>, ServiceError> {
        let privileged = actor.is_admin() || actor.is(Role::Seller, seller_id);
        let status = if privileged { status } else { Some(ReviewStatus::Published) };

        let mut reviews: Vec<Review> = self
            .reviews
            .list()
            .await?
            .into_iter()
            .filter(|review| review.seller_id == seller_id)
            .filter(|review| status.map_or(true, |s| review.status == s))
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    pub async fn product_reviews(&self, product_id: Uuid) -> Result<Vec<Review>, ServiceError> {
        let mut reviews: Vec<Review> = self
            .reviews
            .list()
            .await?
            .into_iter()
            .filter(|review| review.product_id == product_id && review.is_published())
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    /// Average and per-star histogram over published reviews
    pub async fn product_rating(&self, product_id: Uuid) -> Result<RatingSummary, ServiceError> {
        let reviews = self.product_reviews(product_id).await?;
        Ok(RatingSummary::from_reviews(&reviews))
    }

    pub async fn seller_rating(&self, seller_id: Uuid) -> Result<RatingSummary, ServiceError> {
        let reviews: Vec<Review> = self
            .reviews
            .list()
            .await?
            .into_iter()
            .filter(|review| review.seller_id == seller_id && review.is_published())
            .collect();
        Ok(RatingSummary::from_reviews(&reviews))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::delivery::aggregate::tests::processing_order;
    use crate::domain::review::aggregate::tests::{deliver, review_of};
    use crate::errors::ErrorKind;
    use crate::store::testing::YieldingStore;
    use crate::store::{MemoryStore, MemoryUniqueKeys};

    struct Fixture {
        handler: ReviewCommandHandler,
        orders: Arc<MemoryStore<Order>>,
        reviews: Arc<YieldingStore<Review>>,
    }

    fn fixture() -> Fixture {
        let orders = Arc::new(MemoryStore::<Order>::new());
        let reviews = Arc::new(YieldingStore::<Review>::new());
        let handler = ReviewCommandHandler::new(
            reviews.clone(),
            orders.clone(),
            Arc::new(MemoryUniqueKeys::new()),
            EventBus::default(),
            Arc::new(Metrics::new().unwrap()),
            RetryConfig::for_conflicts(5),
        );
        Fixture { handler, orders, reviews }
    }

    async fn delivered_order(fx: &Fixture) -> (Order, Actor, Actor) {
        let (mut order, seller) = processing_order();
        deliver(&mut order, seller);
        fx.orders.insert(&order).await.unwrap();
        let customer = Actor::new(order.customer_id, Role::Customer);
        (order, customer, seller)
    }

    #[tokio::test]
    async fn test_create_review_forbidden_unless_delivered() {
        let fx = fixture();
        let (order, _) = processing_order();
        fx.orders.insert(&order).await.unwrap();
        let customer = Actor::new(order.customer_id, Role::Customer);

        let err = fx.handler.create_review(customer, review_of(&order, 5)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let (delivered, customer, seller) = delivered_order(&fx).await;
        let review = fx.handler.create_review(customer, review_of(&delivered, 5)).await.unwrap();
        assert!(review.verified_purchase);
        assert_eq!(review.seller_id, seller.id);
        assert_eq!(review.order_id, delivered.id);
    }

    #[tokio::test]
    async fn test_second_review_of_same_item_is_duplicate() {
        let fx = fixture();
        let (order, customer, _) = delivered_order(&fx).await;

        fx.handler.create_review(customer, review_of(&order, 4)).await.unwrap();
        let err = fx.handler.create_review(customer, review_of(&order, 1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Duplicate);
    }

    #[tokio::test]
    async fn test_concurrent_reviews_of_same_item_store_one() {
        let fx = fixture();
        let (order, customer, _) = delivered_order(&fx).await;

        let (a, b) = tokio::join!(
            fx.handler.create_review(customer, review_of(&order, 5)),
            fx.handler.create_review(customer, review_of(&order, 2)),
        );

        let failures: Vec<_> = [a, b].into_iter().filter_map(Result::err).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind(), ErrorKind::Duplicate);
        assert_eq!(fx.reviews.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_item_is_not_found() {
        let fx = fixture();
        let customer = Actor::new(Uuid::new_v4(), Role::Customer);
        let command = SubmitReview {
            product_id: Uuid::new_v4(),
            order_item_id: Uuid::new_v4(),
            rating: 3,
            title: None,
            comment: None,
        };
        let err = fx.handler.create_review(customer, command).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_second_seller_response_fails_and_first_is_kept() {
        let fx = fixture();
        let (order, customer, seller) = delivered_order(&fx).await;
        let review = fx.handler.create_review(customer, review_of(&order, 3)).await.unwrap();

        fx.handler
            .add_seller_response(seller, review.id, "Thank you for buying!".to_string())
            .await
            .unwrap();
        let err = fx
            .handler
            .add_seller_response(seller, review.id, "Edited reply".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyResponded);

        let reviews = fx.handler.get_seller_reviews(seller, seller.id, None).await.unwrap();
        assert_eq!(reviews[0].seller_response.as_deref(), Some("Thank you for buying!"));
    }

    #[tokio::test]
    async fn test_ratings_count_published_reviews_only() {
        let fx = fixture();
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);

        let (order, customer, seller) = delivered_order(&fx).await;
        let review = fx.handler.create_review(customer, review_of(&order, 4)).await.unwrap();

        let pending = fx.handler.seller_rating(seller.id).await.unwrap();
        assert_eq!(pending.count, 0);
        assert!(fx.handler.get_seller_reviews(customer, seller.id, None).await.unwrap().is_empty());
        assert_eq!(fx.handler.get_seller_reviews(seller, seller.id, None).await.unwrap().len(), 1);

        fx.handler.publish_review(admin, review.id).await.unwrap();

        let summary = fx.handler.product_rating(order.items[0].product_id).await.unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.average, 4.0);
        assert_eq!(summary.stars(4), 1);
        assert_eq!(summary.stars(5), 0);

        let public = fx.handler.get_seller_reviews(customer, seller.id, None).await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].status, ReviewStatus::Published);
    }
}

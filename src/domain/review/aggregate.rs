use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::access::{Actor, Role};
use crate::domain::order::{Order, OrderStatus};
use crate::lifecycle::Aggregate;
use crate::store::Record;
use super::commands::{ReviewCommand, SubmitReview};
use super::errors::ReviewError;
use super::events::*;
use super::value_objects::{Rating, ReviewStatus};

// ============================================================================
// Review Aggregate - Domain Logic
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub version: i64,

    pub product_id: Uuid,
    pub order_item_id: Uuid,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub seller_id: Uuid,

    pub rating: Rating,
    pub title: Option<String>,
    pub comment: Option<String>,
    /// Always true: reviews can only be written against a delivered order
    pub verified_purchase: bool,
    pub status: ReviewStatus,

    pub seller_response: Option<String>,
    pub response_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    /// Gate a review on ownership and delivery of the reviewed item
    pub fn submit(
        command: &SubmitReview,
        actor: Actor,
        order: &Order,
        now: DateTime<Utc>,
    ) -> Result<ReviewEvent, ReviewError> {
        let rating = Rating::try_from(command.rating)?;

        if !actor.is(Role::Customer, order.customer_id) {
            return Err(ReviewError::Forbidden(
                "only the customer who bought the item can review it".to_string(),
            ));
        }
        if order.status != OrderStatus::Delivered {
            return Err(ReviewError::Forbidden(format!(
                "order {} is {}; reviews open once it is delivered",
                order.order_number, order.status
            )));
        }

        let item = order
            .item(command.order_item_id)
            .filter(|item| item.product_id == command.product_id)
            .ok_or(ReviewError::ItemMismatch {
                order_item_id: command.order_item_id,
                product_id: command.product_id,
            })?;
        if item.status != OrderStatus::Delivered {
            return Err(ReviewError::Forbidden(format!(
                "{} is {}; only delivered items can be reviewed",
                item.name, item.status
            )));
        }

        Ok(ReviewEvent::Submitted(ReviewSubmitted {
            review_id: Uuid::new_v4(),
            product_id: item.product_id,
            order_item_id: item.id,
            order_id: order.id,
            customer_id: order.customer_id,
            seller_id: item.seller_id,
            rating,
            title: non_blank(&command.title),
            comment: non_blank(&command.comment),
            submitted_at: now,
        }))
    }

    pub fn is_published(&self) -> bool {
        self.status == ReviewStatus::Published
    }
}

fn non_blank(text: &Option<String>) -> Option<String> {
    text.as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for Review {
    type Event = ReviewEvent;
    type Command = ReviewCommand;
    type Error = ReviewError;

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            ReviewEvent::Submitted(e) => Ok(Self {
                id: e.review_id,
                version: 1,
                product_id: e.product_id,
                order_item_id: e.order_item_id,
                order_id: e.order_id,
                customer_id: e.customer_id,
                seller_id: e.seller_id,
                rating: e.rating,
                title: e.title.clone(),
                comment: e.comment.clone(),
                verified_purchase: true,
                status: ReviewStatus::Pending,
                seller_response: None,
                response_at: None,
                created_at: e.submitted_at,
                updated_at: e.submitted_at,
            }),
            _ => Err(ReviewError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            ReviewEvent::Submitted(_) => return Err(ReviewError::NotInitialized),
            ReviewEvent::Published(e) => {
                self.status = ReviewStatus::Published;
                self.updated_at = e.published_at;
            }
            ReviewEvent::SellerResponded(e) => {
                self.seller_response = Some(e.response.clone());
                self.response_at = Some(e.responded_at);
                self.updated_at = e.responded_at;
            }
        }

        self.version += 1;
        Ok(())
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let now = Utc::now();

        match command {
            ReviewCommand::Publish { actor } => {
                if !actor.is_admin() {
                    return Err(ReviewError::Forbidden("reviews are published by admins".to_string()));
                }
                if self.is_published() {
                    return Err(ReviewError::AlreadyPublished);
                }

                Ok(vec![ReviewEvent::Published(ReviewPublished {
                    published_by: *actor,
                    published_at: now,
                })])
            }

            ReviewCommand::Respond { actor, text } => {
                if !actor.is(Role::Seller, self.seller_id) {
                    return Err(ReviewError::Forbidden(
                        "only the reviewed seller can respond".to_string(),
                    ));
                }
                if self.seller_response.is_some() {
                    return Err(ReviewError::AlreadyResponded);
                }

                let response = text.trim();
                if response.is_empty() {
                    return Err(ReviewError::EmptyResponse);
                }

                Ok(vec![ReviewEvent::SellerResponded(SellerResponded {
                    seller_id: actor.id,
                    response: response.to_string(),
                    responded_at: now,
                })])
            }
        }
    }

    fn version(&self) -> i64 {
        self.version
    }
}

impl Record for Review {
    const KIND: &'static str = "reviews";

    fn record_id(&self) -> Uuid {
        self.id
    }

    fn record_version(&self) -> i64 {
        self.version
    }

    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::delivery::aggregate::tests::processing_order;
    use crate::domain::order::OrderCommand;

    /// Walk a processing order through shipped and delivered
    pub(crate) fn deliver(order: &mut Order, seller: Actor) {
        for to in [OrderStatus::Shipped, OrderStatus::Delivered] {
            let events = order
                .handle_command(&OrderCommand::ChangeStatus { actor: seller, to, note: None, shipment: None })
                .unwrap();
            order.apply_all(&events).unwrap();
        }
    }

    pub(crate) fn review_of(order: &Order, rating: u8) -> SubmitReview {
        SubmitReview {
            product_id: order.items[0].product_id,
            order_item_id: order.items[0].id,
            rating,
            title: Some("Fresh catch".to_string()),
            comment: Some("Arrived cold and clean.".to_string()),
        }
    }

    #[test]
    fn test_review_forbidden_until_delivered() {
        let (mut order, seller) = processing_order();
        let customer = Actor::new(order.customer_id, Role::Customer);

        let result = Review::submit(&review_of(&order, 5), customer, &order, Utc::now());
        assert!(matches!(result, Err(ReviewError::Forbidden(_))));

        deliver(&mut order, seller);
        let event = Review::submit(&review_of(&order, 5), customer, &order, Utc::now()).unwrap();
        let review = Review::apply_first_event(&event).unwrap();

        assert!(review.verified_purchase);
        assert_eq!(review.status, ReviewStatus::Pending);
        assert_eq!(review.seller_id, seller.id);
        assert_eq!(review.rating.value(), 5);
    }

    #[test]
    fn test_item_cancelled_inside_delivered_order_cannot_be_reviewed() {
        let (mut order, seller) = processing_order();
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        let events = order
            .handle_command(&OrderCommand::ChangeItemStatus {
                actor: admin,
                item_id: order.items[0].id,
                to: OrderStatus::Cancelled,
            })
            .unwrap();
        order.apply_all(&events).unwrap();
        deliver(&mut order, seller);
        assert_eq!(order.status, OrderStatus::Delivered);
        assert_eq!(order.items[0].status, OrderStatus::Cancelled);

        let customer = Actor::new(order.customer_id, Role::Customer);
        let result = Review::submit(&review_of(&order, 5), customer, &order, Utc::now());
        assert!(matches!(result, Err(ReviewError::Forbidden(_))));
    }

    #[test]
    fn test_review_by_someone_else_forbidden() {
        let (mut order, seller) = processing_order();
        deliver(&mut order, seller);
        let stranger = Actor::new(Uuid::new_v4(), Role::Customer);

        let result = Review::submit(&review_of(&order, 4), stranger, &order, Utc::now());
        assert!(matches!(result, Err(ReviewError::Forbidden(_))));
    }

    #[test]
    fn test_review_validates_rating_and_item() {
        let (mut order, seller) = processing_order();
        deliver(&mut order, seller);
        let customer = Actor::new(order.customer_id, Role::Customer);

        let result = Review::submit(&review_of(&order, 0), customer, &order, Utc::now());
        assert!(matches!(result, Err(ReviewError::InvalidRating(0))));

        let mut wrong_product = review_of(&order, 3);
        wrong_product.product_id = Uuid::new_v4();
        let result = Review::submit(&wrong_product, customer, &order, Utc::now());
        assert!(matches!(result, Err(ReviewError::ItemMismatch { .. })));
    }

    #[test]
    fn test_seller_responds_exactly_once() {
        let (mut order, seller) = processing_order();
        deliver(&mut order, seller);
        let customer = Actor::new(order.customer_id, Role::Customer);
        let event = Review::submit(&review_of(&order, 2), customer, &order, Utc::now()).unwrap();
        let mut review = Review::apply_first_event(&event).unwrap();

        let result = review.handle_command(&ReviewCommand::Respond { actor: seller, text: "   ".to_string() });
        assert!(matches!(result, Err(ReviewError::EmptyResponse)));

        let events = review
            .handle_command(&ReviewCommand::Respond { actor: seller, text: "Sorry, we'll pack more ice.".to_string() })
            .unwrap();
        review.apply_all(&events).unwrap();

        let result = review.handle_command(&ReviewCommand::Respond { actor: seller, text: "Second try".to_string() });
        assert!(matches!(result, Err(ReviewError::AlreadyResponded)));
        assert_eq!(review.seller_response.as_deref(), Some("Sorry, we'll pack more ice."));
        assert!(review.response_at.is_some());
    }

    #[test]
    fn test_only_admin_publishes_once() {
        let (mut order, seller) = processing_order();
        deliver(&mut order, seller);
        let customer = Actor::new(order.customer_id, Role::Customer);
        let event = Review::submit(&review_of(&order, 4), customer, &order, Utc::now()).unwrap();
        let mut review = Review::apply_first_event(&event).unwrap();

        let result = review.handle_command(&ReviewCommand::Publish { actor: seller });
        assert!(matches!(result, Err(ReviewError::Forbidden(_))));

        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        let events = review.handle_command(&ReviewCommand::Publish { actor: admin }).unwrap();
        review.apply_all(&events).unwrap();
        assert!(review.is_published());

        let result = review.handle_command(&ReviewCommand::Publish { actor: admin });
        assert!(matches!(result, Err(ReviewError::AlreadyPublished)));
    }
}

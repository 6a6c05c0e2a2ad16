use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::access::Actor;
use crate::lifecycle::DomainEvent;
use super::value_objects::Rating;

// ============================================================================
// Review Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ReviewEvent {
    Submitted(ReviewSubmitted),
    Published(ReviewPublished),
    SellerResponded(SellerResponded),
}

impl DomainEvent for ReviewEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ReviewEvent::Submitted(_) => "ReviewSubmitted",
            ReviewEvent::Published(_) => "ReviewPublished",
            ReviewEvent::SellerResponded(_) => "SellerResponded",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSubmitted {
    pub review_id: Uuid,
    pub product_id: Uuid,
    pub order_item_id: Uuid,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub seller_id: Uuid,
    pub rating: Rating,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewPublished {
    pub published_by: Actor,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerResponded {
    pub seller_id: Uuid,
    pub response: String,
    pub responded_at: DateTime<Utc>,
}

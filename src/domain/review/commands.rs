use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::access::Actor;

/// A customer's review of one delivered order item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReview {
    pub product_id: Uuid,
    pub order_item_id: Uuid,
    pub rating: u8,
    pub title: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ReviewCommand {
    Publish { actor: Actor },
    Respond { actor: Actor, text: String },
}

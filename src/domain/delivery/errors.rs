use uuid::Uuid;

use crate::domain::order::OrderStatus;
use super::value_objects::DeliveryStatus;

// ============================================================================
// Delivery Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Cannot move delivery from {from} to {to}")]
    InvalidTransition { from: DeliveryStatus, to: DeliveryStatus },

    #[error("Delivery {0} has already been claimed")]
    AlreadyAssigned(Uuid),

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Order {0} already has a delivery")]
    Duplicate(Uuid),

    #[error("Order is {0}; deliveries open once it is processing or shipped")]
    OrderNotShippable(OrderStatus),

    #[error("Aggregate not initialized")]
    NotInitialized,
}

use rust_decimal::Decimal;
use uuid::Uuid;

use super::value_objects::{OrderStatus, PaymentStatus};

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Cannot move payment from {from} to {to}")]
    InvalidPaymentTransition { from: PaymentStatus, to: PaymentStatus },

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Order items cannot be empty")]
    EmptyItems,

    #[error("Invalid item quantity: {0}")]
    InvalidQuantity(u32),

    #[error("Invalid unit price: {0}")]
    InvalidPrice(Decimal),

    #[error("Discount must be between zero and the subtotal, got {0}")]
    InvalidDiscount(Decimal),

    #[error("Order item not found: {0}")]
    ItemNotFound(Uuid),

    #[error("Shipment details are only accepted when marking an order shipped")]
    UnexpectedShipment,

    #[error("Aggregate not initialized")]
    NotInitialized,
}

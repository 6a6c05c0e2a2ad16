use uuid::Uuid;

// ============================================================================
// Review Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Order item {0} has already been reviewed")]
    Duplicate(Uuid),

    #[error("Order item {order_item_id} is not product {product_id}")]
    ItemMismatch { order_item_id: Uuid, product_id: Uuid },

    #[error("The seller has already responded to this review")]
    AlreadyResponded,

    #[error("Seller response cannot be empty")]
    EmptyResponse,

    #[error("Review is already published")]
    AlreadyPublished,

    #[error("Aggregate not initialized")]
    NotInitialized,
}

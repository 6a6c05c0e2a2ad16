// ============================================================================
// Order Domain - Business Logic for the Order Aggregate
// ============================================================================
//
// - Value objects (OrderStatus, PaymentStatus, OrderItem, pricing)
// - Events (OrderPlaced, OrderStatusChanged, ...)
// - Commands (PlaceOrder, OrderCommand)
// - Errors (OrderError enum)
// - Aggregate (Order with the transition guard and role gates)
// - Command Handler (OrderCommandHandler)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod command_handler;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use command_handler::*;

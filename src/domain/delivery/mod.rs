// ============================================================================
// Delivery Domain - one delivery per shipped order
// ============================================================================
//
// - Value objects (DeliveryStatus, DeliveryPriority, Location)
// - Events (DeliveryOpened, DeliveryAssigned, ...)
// - Commands (OpenDelivery, DeliveryCommand)
// - Errors (DeliveryError enum)
// - Aggregate (Delivery)
// - Command Handler (DeliveryCommandHandler)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod command_handler;

pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use command_handler::*;

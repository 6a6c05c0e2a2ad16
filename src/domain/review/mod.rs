// ============================================================================
// Review Domain - verified-purchase reviews
// ============================================================================
//
// A review exists only for an order item whose order was delivered. It starts
// `pending`, is published by an admin, and takes at most one seller response.
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

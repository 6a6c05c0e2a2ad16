// ============================================================================
// Seller Domain - business profile and certification approval gate
// ============================================================================
//
// Per certification: unclaimed -> claimed + pending approval -> approved.
// Sellers claim and withdraw; admins approve.
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

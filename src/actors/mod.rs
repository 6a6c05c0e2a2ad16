// ============================================================================
// Actors Module
// ============================================================================
//
// Lifecycle rules live in the command handlers; actors only react to
// committed events.
//
// - delivery_dispatcher - opens a delivery when an order ships with
//   shipment details
//
// ============================================================================

mod delivery_dispatcher;

pub use delivery_dispatcher::{DeliveryDispatcher, OrderShipped};

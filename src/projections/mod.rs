// ============================================================================
// Projections - Read Models
// ============================================================================
//
// Stores only offer full listings; filtering, ordering and aggregation for
// list views, ratings and dashboards happen here, in-process.
//
// ============================================================================

pub mod dashboards;
pub mod deliveries;
pub mod orders;
pub mod ratings;

pub use dashboards::*;
pub use orders::OrderFilter;
pub use ratings::RatingSummary;

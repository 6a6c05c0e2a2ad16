// ============================================================================
// Fish Happy Lifecycle Service
// ============================================================================
//
// Order, delivery, review and seller-certification lifecycles for the Fish
// Happy marketplace:
// - domain/      - aggregates, transition guards and command handlers
// - lifecycle/   - aggregate trait, event envelopes, optimistic executor
// - store/       - record stores (memory, ScyllaDB) and status history
// - projections/ - listings, ratings and role dashboards
// - export/      - orders and products CSV
// - actors/      - event-driven delivery dispatch
// - api/         - actix-web routes
//
// ============================================================================

pub mod actors;
pub mod api;
pub mod config;
pub mod domain;
pub mod errors;
pub mod export;
pub mod lifecycle;
pub mod media;
pub mod messaging;
pub mod metrics;
pub mod projections;
pub mod state;
pub mod store;
pub mod utils;

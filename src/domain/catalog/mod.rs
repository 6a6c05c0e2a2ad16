// ============================================================================
// Catalog - seller products and their CSV import/export
// ============================================================================

pub mod product;
pub mod service;

pub use product::*;
pub use service::*;

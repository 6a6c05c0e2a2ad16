// ============================================================================
// Record Store - Persistence Layer
// ============================================================================
//
// The lifecycle core depends only on the RecordStore / HistoryStore traits:
// insert, point read, full listing (projections filter in-process),
// conditional update and count. UniqueKeys reserves "one X per Y" keys
// ahead of the insert they guard. Two backends implement them:
// - memory: process-local, used by tests and single-node deployments
// - scylla: ScyllaDB tables with lightweight-transaction conditional writes
//
// ============================================================================

pub mod history;
pub mod memory;
pub mod record;
pub mod scylla;
pub mod unique;
#[cfg(test)]
pub(crate) mod testing;

pub use history::{HistoryStore, MemoryHistoryStore, StatusHistoryEntry};
pub use memory::MemoryStore;
pub use record::{Condition, Record, RecordStore, StoreError};
pub use self::scylla::{ScyllaHistoryStore, ScyllaStore, ScyllaUniqueKeys};
pub use unique::{MemoryUniqueKeys, UniqueKeys, DELIVERY_PER_ORDER, REVIEW_PER_ORDER_ITEM};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

/// A persisted lifecycle record
///
/// Every record carries a status label and a version; both can be used as
/// the precondition of a conditional update.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Table / collection name
    const KIND: &'static str;

    fn record_id(&self) -> Uuid;

    fn record_version(&self) -> i64;

    fn status_label(&self) -> &'static str;
}

/// Precondition of a conditional update, checked against the stored row
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Stored version must equal the given one (optimistic concurrency)
    VersionIs(i64),
    /// Stored status label and version must both match
    StatusAt { status: &'static str, version: i64 },
}

impl Condition {
    pub fn holds<T: Record>(&self, stored: &T) -> bool {
        match self {
            Condition::VersionIs(version) => stored.record_version() == *version,
            Condition::StatusAt { status, version } => {
                stored.status_label() == *status && stored.record_version() == *version
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} {id} already exists")]
    AlreadyExists { kind: &'static str, id: Uuid },

    #[error("{kind} {id} does not exist")]
    Missing { kind: &'static str, id: Uuid },

    #[error("Record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait RecordStore<T: Record>: Send + Sync {
    /// Insert a new record; fails if the id is taken
    async fn insert(&self, record: &T) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<T>, StoreError>;

    /// Every record of this kind, unordered
    async fn list(&self) -> Result<Vec<T>, StoreError>;

    /// Replace the stored record only if `condition` holds for it.
    /// Returns whether the write was applied.
    async fn update(&self, record: &T, condition: Condition) -> Result<bool, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}

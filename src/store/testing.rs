use async_trait::async_trait;
use uuid::Uuid;

use super::memory::MemoryStore;
use super::record::{Condition, Record, RecordStore, StoreError};

/// Memory store that yields to the scheduler before every insert, opening
/// the window a networked backend has between a check and its write
pub(crate) struct YieldingStore<T: Record> {
    inner: MemoryStore<T>,
}

impl<T: Record> YieldingStore<T> {
    pub(crate) fn new() -> Self {
        Self { inner: MemoryStore::new() }
    }
}

#[async_trait]
impl<T: Record> RecordStore<T> for YieldingStore<T> {
    async fn insert(&self, record: &T) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        self.inner.insert(record).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        self.inner.get(id).await
    }

    async fn list(&self) -> Result<Vec<T>, StoreError> {
        self.inner.list().await
    }

    async fn update(&self, record: &T, condition: Condition) -> Result<bool, StoreError> {
        self.inner.update(record, condition).await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.inner.count().await
    }
}

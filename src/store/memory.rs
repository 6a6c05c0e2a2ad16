use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::record::{Condition, Record, RecordStore, StoreError};

// ============================================================================
// In-Memory Record Store
// ============================================================================
//
// The condition check and the write happen under one write lock, so a
// conditional update is atomic with respect to every other writer.
//
// ============================================================================

pub struct MemoryStore<T: Record> {
    rows: RwLock<HashMap<Uuid, T>>,
}

impl<T: Record> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Record> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Record> RecordStore<T> for MemoryStore<T> {
    async fn insert(&self, record: &T) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        let id = record.record_id();
        if rows.contains_key(&id) {
            return Err(StoreError::AlreadyExists { kind: T::KIND, id });
        }
        rows.insert(id, record.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn update(&self, record: &T, condition: Condition) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().await;
        let id = record.record_id();
        let stored = rows
            .get_mut(&id)
            .ok_or(StoreError::Missing { kind: T::KIND, id })?;

        if !condition.holds(stored) {
            tracing::debug!(
                kind = T::KIND,
                id = %id,
                condition = ?condition,
                "Conditional update not applied"
            );
            return Ok(false);
        }

        *stored = record.clone();
        Ok(true)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.rows.read().await.len())
    }
}

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::order::OrderStatus;
use super::record::StoreError;

/// Immutable audit row written after every order status change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub id: Uuid,
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub note: Option<String>,
    pub changed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl StatusHistoryEntry {
    pub fn new(
        order_id: Uuid,
        status: OrderStatus,
        note: Option<String>,
        changed_by: Option<Uuid>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            status,
            note,
            changed_by,
            created_at,
        }
    }
}

/// Append-only status history
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, entry: &StatusHistoryEntry) -> Result<(), StoreError>;

    /// Entries for one order, oldest first
    async fn for_order(&self, order_id: Uuid) -> Result<Vec<StatusHistoryEntry>, StoreError>;
}

#[derive(Default)]
pub struct MemoryHistoryStore {
    entries: RwLock<HashMap<Uuid, Vec<StatusHistoryEntry>>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(&self, entry: &StatusHistoryEntry) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .entry(entry.order_id)
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn for_order(&self, order_id: Uuid) -> Result<Vec<StatusHistoryEntry>, StoreError> {
        let mut entries = self
            .entries
            .read()
            .await
            .get(&order_id)
            .cloned()
            .unwrap_or_default();
        entries.sort_by_key(|entry| entry.created_at);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_history_is_per_order_and_oldest_first() {
        let store = MemoryHistoryStore::new();
        let order_id = Uuid::new_v4();
        let now = Utc::now();

        store
            .append(&StatusHistoryEntry::new(order_id, OrderStatus::Confirmed, None, None, now))
            .await
            .unwrap();
        store
            .append(&StatusHistoryEntry::new(
                order_id,
                OrderStatus::Pending,
                Some("Order placed".to_string()),
                None,
                now - Duration::minutes(5),
            ))
            .await
            .unwrap();
        store
            .append(&StatusHistoryEntry::new(Uuid::new_v4(), OrderStatus::Pending, None, None, now))
            .await
            .unwrap();

        let entries = store.for_order(order_id).await.unwrap();
        let statuses: Vec<_> = entries.iter().map(|e| e.status).collect();
        assert_eq!(statuses, vec![OrderStatus::Pending, OrderStatus::Confirmed]);
    }
}

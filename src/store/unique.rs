use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::record::StoreError;

/// One delivery per order
pub const DELIVERY_PER_ORDER: &str = "delivery_per_order";
/// One review per order item
pub const REVIEW_PER_ORDER_ITEM: &str = "review_per_order_item";

/// Insert-if-absent key registry backing the "one X per Y" rules
///
/// A key is reserved before the record it guards is inserted, so two
/// writers racing for the same key cannot both get past the check.
#[async_trait]
pub trait UniqueKeys: Send + Sync {
    /// Reserve `key` in `scope` for `owner`; false if someone holds it
    async fn reserve(&self, scope: &'static str, key: Uuid, owner: Uuid) -> Result<bool, StoreError>;

    /// Give up a reservation, only if `owner` still holds it
    async fn release(&self, scope: &'static str, key: Uuid, owner: Uuid) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct MemoryUniqueKeys {
    keys: RwLock<HashMap<(&'static str, Uuid), Uuid>>,
}

impl MemoryUniqueKeys {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UniqueKeys for MemoryUniqueKeys {
    async fn reserve(&self, scope: &'static str, key: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        let mut keys = self.keys.write().await;
        if keys.contains_key(&(scope, key)) {
            tracing::debug!(scope = scope, key = %key, "Unique key already reserved");
            return Ok(false);
        }
        keys.insert((scope, key), owner);
        Ok(true)
    }

    async fn release(&self, scope: &'static str, key: Uuid, owner: Uuid) -> Result<(), StoreError> {
        let mut keys = self.keys.write().await;
        if keys.get(&(scope, key)) == Some(&owner) {
            keys.remove(&(scope, key));
        }
        Ok(())
    }
}

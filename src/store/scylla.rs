use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scylla::client::session::Session;
use scylla::value::{CqlValue, Row};
use uuid::Uuid;

use super::history::{HistoryStore, StatusHistoryEntry};
use super::record::{Condition, Record, RecordStore, StoreError};
use super::unique::UniqueKeys;

// ============================================================================
// ScyllaDB Record Store
// ============================================================================
//
// One table per record kind:
//   id uuid PRIMARY KEY, status text, version bigint, body text (JSON)
//
// Conditional updates are lightweight transactions (`... IF version = ?` /
// `... IF status = ? AND version = ?`); the coordinator answers with an
// `[applied]` column, which is what makes the delivery claim at-most-once
// across nodes.
//
// ============================================================================

fn backend<E: std::fmt::Display>(error: E) -> StoreError {
    StoreError::Backend(error.to_string())
}

/// Read the `[applied]` flag from the first row of an LWT response
fn applied_flag(row: Option<Row>) -> bool {
    matches!(
        row.and_then(|row| row.columns.into_iter().next().flatten()),
        Some(CqlValue::Boolean(true))
    )
}

/// Create the keyspace and every table the service uses, then switch to it
pub async fn ensure_schema(session: &Session, keyspace: &str, kinds: &[&str]) -> anyhow::Result<()> {
    let create_keyspace = format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH REPLICATION = \
         {{'class': 'SimpleStrategy', 'replication_factor': 1}}",
        keyspace
    );
    session.query_unpaged(create_keyspace.as_str(), &[]).await?;
    session.use_keyspace(keyspace, false).await?;

    for kind in kinds {
        let create_table = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id uuid PRIMARY KEY,
                status text,
                version bigint,
                body text
            )",
            kind
        );
        session.query_unpaged(create_table.as_str(), &[]).await?;
    }

    session
        .query_unpaged(
            "CREATE TABLE IF NOT EXISTS order_status_history (
                order_id uuid,
                created_at timestamp,
                id uuid,
                status text,
                note text,
                changed_by uuid,
                PRIMARY KEY (order_id, created_at, id)
            ) WITH CLUSTERING ORDER BY (created_at ASC, id ASC)",
            &[],
        )
        .await?;

    session
        .query_unpaged(
            "CREATE TABLE IF NOT EXISTS unique_keys (
                scope text,
                key uuid,
                owner uuid,
                PRIMARY KEY ((scope, key))
            )",
            &[],
        )
        .await?;

    tracing::info!(keyspace = %keyspace, tables = kinds.len() + 2, "✅ Schema ready");
    Ok(())
}

pub struct ScyllaStore<T: Record> {
    session: Arc<Session>,
    _phantom: PhantomData<T>,
}

impl<T: Record> ScyllaStore<T> {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Record> RecordStore<T> for ScyllaStore<T> {
    async fn insert(&self, record: &T) -> Result<(), StoreError> {
        let body = serde_json::to_string(record)?;
        let cql = format!(
            "INSERT INTO {} (id, status, version, body) VALUES (?, ?, ?, ?) IF NOT EXISTS",
            T::KIND
        );

        let result = self
            .session
            .query_unpaged(
                cql.as_str(),
                (record.record_id(), record.status_label(), record.record_version(), body),
            )
            .await
            .map_err(backend)?;
        let row = result
            .into_rows_result()
            .map_err(backend)?
            .maybe_first_row::<Row>()
            .map_err(backend)?;

        if !applied_flag(row) {
            return Err(StoreError::AlreadyExists { kind: T::KIND, id: record.record_id() });
        }

        tracing::debug!(kind = T::KIND, id = %record.record_id(), "Inserted record");
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        let cql = format!("SELECT body FROM {} WHERE id = ?", T::KIND);
        let result = self
            .session
            .query_unpaged(cql.as_str(), (id,))
            .await
            .map_err(backend)?;

        let rows_result = match result.into_rows_result() {
            Ok(rows) => rows,
            Err(_) => return Ok(None),
        };

        match rows_result.maybe_first_row::<(String,)>().map_err(backend)? {
            Some((body,)) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<T>, StoreError> {
        let cql = format!("SELECT body FROM {}", T::KIND);
        let result = self
            .session
            .query_unpaged(cql.as_str(), &[])
            .await
            .map_err(backend)?;

        let rows_result = match result.into_rows_result() {
            Ok(rows) => rows,
            Err(_) => return Ok(Vec::new()),
        };

        let mut records = Vec::new();
        for row in rows_result.rows::<(String,)>().map_err(backend)? {
            let (body,) = row.map_err(backend)?;
            records.push(serde_json::from_str(&body)?);
        }

        tracing::debug!(kind = T::KIND, count = records.len(), "Listed records");
        Ok(records)
    }

    async fn update(&self, record: &T, condition: Condition) -> Result<bool, StoreError> {
        let body = serde_json::to_string(record)?;
        let id = record.record_id();

        let result = match &condition {
            Condition::VersionIs(expected) => {
                let cql = format!(
                    "UPDATE {} SET status = ?, version = ?, body = ? WHERE id = ? IF version = ?",
                    T::KIND
                );
                self.session
                    .query_unpaged(
                        cql.as_str(),
                        (record.status_label(), record.record_version(), body, id, *expected),
                    )
                    .await
            }
            Condition::StatusAt { status, version } => {
                let cql = format!(
                    "UPDATE {} SET status = ?, version = ?, body = ? WHERE id = ? IF status = ? AND version = ?",
                    T::KIND
                );
                self.session
                    .query_unpaged(
                        cql.as_str(),
                        (record.status_label(), record.record_version(), body, id, *status, *version),
                    )
                    .await
            }
        }
        .map_err(backend)?;

        let row = result
            .into_rows_result()
            .map_err(backend)?
            .maybe_first_row::<Row>()
            .map_err(backend)?;

        if applied_flag(row) {
            return Ok(true);
        }

        // A failed LWT against a missing row looks like a failed condition
        if self.get(id).await?.is_none() {
            return Err(StoreError::Missing { kind: T::KIND, id });
        }

        tracing::debug!(kind = T::KIND, id = %id, condition = ?condition, "Conditional update not applied");
        Ok(false)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let cql = format!("SELECT COUNT(*) FROM {}", T::KIND);
        let result = self
            .session
            .query_unpaged(cql.as_str(), &[])
            .await
            .map_err(backend)?;

        let count = result
            .into_rows_result()
            .map_err(backend)?
            .maybe_first_row::<(i64,)>()
            .map_err(backend)?
            .map(|(count,)| count)
            .unwrap_or(0);

        Ok(usize::try_from(count).unwrap_or(0))
    }
}

pub struct ScyllaHistoryStore {
    session: Arc<Session>,
}

impl ScyllaHistoryStore {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl HistoryStore for ScyllaHistoryStore {
    async fn append(&self, entry: &StatusHistoryEntry) -> Result<(), StoreError> {
        self.session
            .query_unpaged(
                "INSERT INTO order_status_history (order_id, created_at, id, status, note, changed_by)
                 VALUES (?, ?, ?, ?, ?, ?)",
                (
                    entry.order_id,
                    entry.created_at,
                    entry.id,
                    entry.status.as_str(),
                    entry.note.clone(),
                    entry.changed_by,
                ),
            )
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn for_order(&self, order_id: Uuid) -> Result<Vec<StatusHistoryEntry>, StoreError> {
        let result = self
            .session
            .query_unpaged(
                "SELECT order_id, created_at, id, status, note, changed_by
                 FROM order_status_history
                 WHERE order_id = ?",
                (order_id,),
            )
            .await
            .map_err(backend)?;

        let rows_result = match result.into_rows_result() {
            Ok(rows) => rows,
            Err(_) => return Ok(Vec::new()),
        };

        let mut entries = Vec::new();
        for row in rows_result
            .rows::<(Uuid, DateTime<Utc>, Uuid, String, Option<String>, Option<Uuid>)>()
            .map_err(backend)?
        {
            let (order_id, created_at, id, status, note, changed_by) = row.map_err(backend)?;
            entries.push(StatusHistoryEntry {
                id,
                order_id,
                status: status.parse().map_err(backend)?,
                note,
                changed_by,
                created_at,
            });
        }

        Ok(entries)
    }
}

pub struct ScyllaUniqueKeys {
    session: Arc<Session>,
}

impl ScyllaUniqueKeys {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl UniqueKeys for ScyllaUniqueKeys {
    async fn reserve(&self, scope: &'static str, key: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        let result = self
            .session
            .query_unpaged(
                "INSERT INTO unique_keys (scope, key, owner) VALUES (?, ?, ?) IF NOT EXISTS",
                (scope, key, owner),
            )
            .await
            .map_err(backend)?;
        let row = result
            .into_rows_result()
            .map_err(backend)?
            .maybe_first_row::<Row>()
            .map_err(backend)?;

        let reserved = applied_flag(row);
        if !reserved {
            tracing::debug!(scope = scope, key = %key, "Unique key already reserved");
        }
        Ok(reserved)
    }

    async fn release(&self, scope: &'static str, key: Uuid, owner: Uuid) -> Result<(), StoreError> {
        self.session
            .query_unpaged(
                "DELETE FROM unique_keys WHERE scope = ? AND key = ? IF owner = ?",
                (scope, key, owner),
            )
            .await
            .map_err(backend)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applied_flag_reads_first_column() {
        let applied = Row { columns: vec![Some(CqlValue::Boolean(true))] };
        let rejected = Row {
            columns: vec![Some(CqlValue::Boolean(false)), Some(CqlValue::Text("assigned".to_string()))],
        };

        assert!(applied_flag(Some(applied)));
        assert!(!applied_flag(Some(rejected)));
        assert!(!applied_flag(Some(Row { columns: vec![None] })));
        assert!(!applied_flag(None));
    }
}

use uuid::Uuid;

use crate::domain::access::Actor;
use crate::errors::ServiceError;
use crate::metrics::Metrics;
use crate::store::{Condition, Record, RecordStore};
use crate::utils::{retry_on_transient, RetryConfig};
use super::core::{Aggregate, DomainEvent, EventEnvelope};

// ============================================================================
// Command Executor
// ============================================================================
//
// Orchestrates: Load → Aggregate → Events → Conditional Write
//
// The write is guarded by the version the command was handled against. A
// lost race surfaces as a transient Conflict, and the retry reloads the
// record and runs the guard again on the fresh state.
//
// ============================================================================

/// A command that made it to storage
pub struct Committed<A: Aggregate> {
    pub record: A,
    pub events: Vec<EventEnvelope<A::Event>>,
}

pub async fn execute<A>(
    store: &dyn RecordStore<A>,
    metrics: &Metrics,
    retry: RetryConfig,
    id: Uuid,
    actor: Actor,
    command: &A::Command,
) -> Result<Committed<A>, ServiceError>
where
    A: Aggregate + Record,
    A::Event: DomainEvent,
    A::Command: Sync,
    ServiceError: From<A::Error>,
{
    retry_on_transient(retry, |attempt| async move {
        let current = store
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(A::KIND, id))?;

        let base_version = current.version();
        let events = current.handle_command(command)?;

        let mut next = current;
        next.apply_all(&events)?;

        if !store.update(&next, Condition::VersionIs(base_version)).await? {
            metrics.record_conflict(A::KIND);
            tracing::debug!(
                kind = A::KIND,
                id = %id,
                attempt = attempt,
                "Version conflict, reloading"
            );
            return Err(ServiceError::Conflict { kind: A::KIND, id });
        }

        Ok(Committed {
            events: EventEnvelope::wrap_all(id, base_version, events, Some(actor)),
            record: next,
        })
    })
    .await
    .into_result()
}

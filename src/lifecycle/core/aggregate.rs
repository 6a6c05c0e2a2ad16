// ============================================================================
// Aggregate Root Pattern
// ============================================================================
//
// 1. Commands are validated (transition guard + capability check) before
//    any event is emitted
// 2. Events represent facts that have already happened
// 3. All state changes flow through apply_event
//
// Records are persisted as snapshots; the emitted events feed the status
// history and the event bus.
//
// ============================================================================

/// Generic Aggregate trait - every lifecycle record implements this
///
/// Type Parameters:
/// - `Event`: The domain event type for this aggregate
/// - `Command`: The command type for this aggregate
/// - `Error`: The error type for business rule violations
pub trait Aggregate: Sized + Send + Sync {
    type Event;
    type Command;
    type Error;

    /// Create new aggregate from its first event
    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error>;

    /// Apply subsequent events to update state
    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error>;

    /// Handle command and emit events (business logic)
    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Current version; bumped once per applied event
    fn version(&self) -> i64;

    /// Apply a batch of events in order
    fn apply_all(&mut self, events: &[Self::Event]) -> Result<(), Self::Error> {
        for event in events {
            self.apply_event(event)?;
        }
        Ok(())
    }
}

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use bonded_core::ExpectedVersion;
use bonded_events::EventEnvelope;
use std::sync::Arc;

/// An event ready to be appended to the ledger (not yet assigned a sequence number).
///
/// ## Event Lifecycle
///
/// 1. **Domain event**: decided by the ledger service from current state
/// 2. **UncommittedEvent**: serialized payload plus metadata
/// 3. **StoredEvent**: persisted with an assigned `sequence_number`
/// 4. **EventEnvelope**: decoded back into a typed event for replay
///
/// Use `UncommittedEvent::from_typed()` to build one from a typed event; it
/// captures the metadata needed to decode the payload later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncommittedEvent {
    pub event_id: Uuid,
    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,

    pub payload: JsonValue,
}

/// An event persisted in the ledger stream.
///
/// Sequence numbers are assigned by the store during append and are:
/// - **Monotonically increasing**: each event gets `last + 1`, starting at 1
/// - **Immutable**: once assigned they never change
/// - **Commit order**: they order events whose timestamps tie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub event_id: Uuid,

    /// Position in the ledger stream.
    pub sequence_number: u64,

    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,

    pub payload: JsonValue,
}

impl StoredEvent {
    pub fn to_envelope(&self) -> EventEnvelope<JsonValue> {
        EventEnvelope::new(
            self.event_id,
            self.sequence_number,
            self.event_type.clone(),
            self.occurred_at,
            self.payload.clone(),
        )
    }

    /// Decode the payload into a typed envelope.
    pub fn decode<E: DeserializeOwned>(&self) -> Result<EventEnvelope<E>, EventStoreError> {
        let payload = E::deserialize(&self.payload).map_err(|e| {
            EventStoreError::Codec(format!(
                "event #{} ({}): {e}",
                self.sequence_number, self.event_type
            ))
        })?;
        Ok(EventEnvelope::new(
            self.event_id,
            self.sequence_number,
            self.event_type.clone(),
            self.occurred_at,
            payload,
        ))
    }
}

/// Event store operation error.
///
/// These are **infrastructure errors** (storage, concurrency, encoding) as
/// opposed to domain errors (validation, invariants).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventStoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("invalid append: {0}")]
    InvalidAppend(String),

    #[error("event codec failure: {0}")]
    Codec(String),

    #[error("event store unavailable: {0}")]
    Unavailable(String),
}

/// Append-only ledger event store.
///
/// ## Append Semantics
///
/// `append()`:
/// - checks optimistic concurrency (current version must match `expected_version`)
/// - assigns sequence numbers starting at `current_version + 1`
/// - persists the batch atomically (all or nothing)
///
/// ## Load Semantics
///
/// `load_after(n)` returns every event with `sequence_number > n` in order;
/// `load_after(0)` is the full history.
pub trait EventStore: Send + Sync {
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError>;

    fn load_after(&self, sequence_number: u64) -> Result<Vec<StoredEvent>, EventStoreError>;

    /// Sequence number of the last committed event (0 when empty).
    fn current_version(&self) -> Result<u64, EventStoreError>;
}

impl<S> EventStore for Arc<S>
where
    S: EventStore + ?Sized,
{
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        (**self).append(events, expected_version)
    }

    fn load_after(&self, sequence_number: u64) -> Result<Vec<StoredEvent>, EventStoreError> {
        (**self).load_after(sequence_number)
    }

    fn current_version(&self) -> Result<u64, EventStoreError> {
        (**self).current_version()
    }
}

impl UncommittedEvent {
    /// Convenience constructor from a typed domain event.
    pub fn from_typed<E>(event_id: Uuid, event: &E) -> Result<Self, EventStoreError>
    where
        E: bonded_events::Event + Serialize,
    {
        let payload = serde_json::to_value(event)
            .map_err(|e| EventStoreError::Codec(format!("payload serialization failed: {e}")))?;

        Ok(Self {
            event_id,
            event_type: event.event_type().to_string(),
            event_version: event.version(),
            occurred_at: event.occurred_at(),
            payload,
        })
    }
}

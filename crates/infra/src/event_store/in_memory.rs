use std::sync::RwLock;

use bonded_core::ExpectedVersion;

use super::r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

/// In-memory append-only event store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    stream: RwLock<Vec<StoredEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn last_sequence(stream: &[StoredEvent]) -> u64 {
        stream.last().map(|e| e.sequence_number).unwrap_or(0)
    }
}

impl EventStore for InMemoryEventStore {
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        if events.is_empty() {
            return Ok(vec![]);
        }

        let mut stream = self
            .stream
            .write()
            .map_err(|_| EventStoreError::Unavailable("lock poisoned".to_string()))?;

        let current = Self::last_sequence(&stream);
        if !expected_version.matches(current) {
            return Err(EventStoreError::Concurrency(format!(
                "expected {expected_version:?}, found {current}"
            )));
        }

        if let Some(dup) = events
            .iter()
            .find(|e| stream.iter().any(|s| s.event_id == e.event_id))
        {
            return Err(EventStoreError::InvalidAppend(format!(
                "event {} already committed",
                dup.event_id
            )));
        }

        // Assign sequence numbers and append (append-only).
        let mut next = current + 1;
        let mut committed = Vec::with_capacity(events.len());
        for e in events {
            let stored = StoredEvent {
                event_id: e.event_id,
                sequence_number: next,
                event_type: e.event_type,
                event_version: e.event_version,
                occurred_at: e.occurred_at,
                payload: e.payload,
            };
            next += 1;
            committed.push(stored);
        }
        stream.extend(committed.iter().cloned());

        Ok(committed)
    }

    fn load_after(&self, sequence_number: u64) -> Result<Vec<StoredEvent>, EventStoreError> {
        let stream = self
            .stream
            .read()
            .map_err(|_| EventStoreError::Unavailable("lock poisoned".to_string()))?;

        // Sequence numbers are 1-based and gap-free, so they index the stream directly.
        let start = usize::try_from(sequence_number)
            .unwrap_or(usize::MAX)
            .min(stream.len());
        Ok(stream[start..].to_vec())
    }

    fn current_version(&self) -> Result<u64, EventStoreError> {
        let stream = self
            .stream
            .read()
            .map_err(|_| EventStoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(Self::last_sequence(&stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn event(kind: &str) -> UncommittedEvent {
        UncommittedEvent {
            event_id: Uuid::now_v7(),
            event_type: kind.to_string(),
            event_version: 1,
            occurred_at: Utc::now(),
            payload: json!({ "kind": kind }),
        }
    }

    #[test]
    fn assigns_gap_free_sequence_numbers() {
        let store = InMemoryEventStore::new();
        let first = store
            .append(vec![event("a"), event("b")], ExpectedVersion::Exact(0))
            .unwrap();
        assert_eq!(first[1].sequence_number, 2);
        let second = store
            .append(vec![event("c")], ExpectedVersion::Exact(2))
            .unwrap();
        assert_eq!(second[0].sequence_number, 3);

        assert_eq!(store.current_version().unwrap(), 3);
        let tail = store.load_after(1).unwrap();
        assert_eq!(
            tail.iter().map(|e| e.event_type.as_str()).collect::<Vec<_>>(),
            ["b", "c"]
        );
        assert!(store.load_after(99).unwrap().is_empty());
    }

    #[test]
    fn stale_expected_version_is_rejected_atomically() {
        let store = InMemoryEventStore::new();
        store
            .append(vec![event("a")], ExpectedVersion::Exact(0))
            .unwrap();
        let err = store
            .append(vec![event("b"), event("c")], ExpectedVersion::Exact(0))
            .unwrap_err();
        assert!(matches!(err, EventStoreError::Concurrency(_)));
        assert_eq!(store.current_version().unwrap(), 1);
    }

    #[test]
    fn duplicate_event_id_is_rejected() {
        let store = InMemoryEventStore::new();
        let e = event("a");
        store.append(vec![e.clone()], ExpectedVersion::Any).unwrap();
        let err = store.append(vec![e], ExpectedVersion::Any).unwrap_err();
        assert!(matches!(err, EventStoreError::InvalidAppend(_)));
    }
}

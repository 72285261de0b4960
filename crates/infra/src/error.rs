//! Errors surfaced by ledger operations.

use thiserror::Error;

use bonded_core::DomainError;

use crate::event_store::EventStoreError;

/// Every failure a ledger operation can report. No variant leaves partial
/// state behind; the caller may simply retry or display it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("insufficient available stock: {0}")]
    InsufficientAvailable(String),

    #[error("source and destination warehouse cannot match")]
    SameWarehouse,

    #[error("hold requires a reason and required documents")]
    MissingHoldFields,

    #[error("invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("still referenced: {0}")]
    Referenced(String),

    #[error("inspection queue is empty")]
    EmptyQueue,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("event store failure: {0}")]
    Store(EventStoreError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

impl From<DomainError> for LedgerError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                LedgerError::ValidationFailed(msg)
            }
            DomainError::NotFound(what) => LedgerError::NotFound(what),
            DomainError::CapacityExceeded(msg) => LedgerError::CapacityExceeded(msg),
            DomainError::InsufficientAvailable(msg) => LedgerError::InsufficientAvailable(msg),
            DomainError::SameWarehouse => LedgerError::SameWarehouse,
            DomainError::InvalidTransition(msg) => LedgerError::InvalidTransition(msg),
            DomainError::MissingHoldFields => LedgerError::MissingHoldFields,
            DomainError::Referenced(msg) => LedgerError::Referenced(msg),
            DomainError::Conflict(msg) => LedgerError::Conflict(msg),
        }
    }
}

impl From<EventStoreError> for LedgerError {
    fn from(value: EventStoreError) -> Self {
        match value {
            EventStoreError::Concurrency(msg) => LedgerError::Conflict(msg),
            other => LedgerError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_onto_ledger_kinds() {
        assert_eq!(
            LedgerError::from(DomainError::not_found("warehouse")),
            LedgerError::NotFound("warehouse".to_string())
        );
        assert_eq!(
            LedgerError::from(DomainError::invalid_id("ShipmentId: bad")),
            LedgerError::ValidationFailed("ShipmentId: bad".to_string())
        );
        assert_eq!(
            LedgerError::from(EventStoreError::Concurrency("stale".to_string())),
            LedgerError::Conflict("stale".to_string())
        );
        assert!(matches!(
            LedgerError::from(EventStoreError::Codec("bad json".to_string())),
            LedgerError::Store(_)
        ));
    }
}

//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// admission control, lifecycle rules). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed or out-of-range input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Admitting a movement would overflow a warehouse.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// A release/transfer asks for more than the derived available balance.
    #[error("insufficient available stock: {0}")]
    InsufficientAvailable(String),

    /// Source and destination of a transfer are the same warehouse.
    #[error("source and destination warehouse cannot match")]
    SameWarehouse,

    /// The shipment lifecycle does not allow the requested transition.
    #[error("invalid status transition: {0}")]
    InvalidTransition(String),

    /// A HOLD outcome was recorded without a reason or required documents.
    #[error("hold requires a reason and required documents")]
    MissingHoldFields,

    /// Deletion blocked because other records still reference the entity.
    #[error("still referenced: {0}")]
    Referenced(String),

    /// A conflict occurred (e.g. stale ledger version).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn capacity(msg: impl Into<String>) -> Self {
        Self::CapacityExceeded(msg.into())
    }

    pub fn insufficient(msg: impl Into<String>) -> Self {
        Self::InsufficientAvailable(msg.into())
    }

    pub fn transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn referenced(msg: impl Into<String>) -> Self {
        Self::Referenced(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

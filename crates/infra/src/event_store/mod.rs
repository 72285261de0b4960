//! Append-only event store boundary.
//!
//! The ledger is a single ordered stream; this module defines the storage
//! abstraction for it without making any storage assumptions.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

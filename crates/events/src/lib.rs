//! Ledger event abstractions.
//!
//! Domain modules describe what happened as [`Event`]s; the event store wraps
//! each committed event in an [`EventEnvelope`] carrying its position in the
//! append-only history.

pub mod envelope;
pub mod event;

pub use envelope::EventEnvelope;
pub use event::Event;

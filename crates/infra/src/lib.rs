//! Infrastructure layer: event storage, configuration and the ledger service
//! that ties the warehousing domain to a store.

pub mod config;
pub mod error;
pub mod event_store;
pub mod ledger;


pub use config::{ConfigError, LedgerConfig};
pub use error::{LedgerError, LedgerResult};
pub use event_store::{EventStore, EventStoreError, InMemoryEventStore, StoredEvent, UncommittedEvent};
pub use ledger::{Ledger, ReleaseRequest, TransferRequest, UndoOutcome};

//! Per-operator session state.
//!
//! A session owns the structures that belong to one operator rather than to
//! the ledger: the inspection queue, the undo log, the analytics indexes and
//! the activity log. None of it is durable; a fresh session starts empty.

pub mod activity;
pub mod indexes;
pub mod queue;
pub mod session;
pub mod undo;

pub use activity::{ActivityEntry, ActivityLog, DEFAULT_NOTIFICATION_LIMIT, Notification};
pub use indexes::{AnalyticsIndexes, ReferenceIndex, TransferGraph, Traversal, ValueRangeIndex};
pub use queue::InspectionQueue;
pub use session::{OVERVIEW_ACTIVITY_ROWS, Session, SessionOverview};
pub use undo::{UndoAction, UndoLog};

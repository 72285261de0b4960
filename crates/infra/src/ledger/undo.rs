use chrono::Utc;
use serde::Serialize;

use bonded_core::DomainError;
use bonded_session::{Session, UndoAction};

use super::Ledger;
use super::movements::{release_reversal, transfer_reversal};
use crate::error::LedgerResult;
use crate::event_store::EventStore;

/// What happened to the most recent undoable action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UndoOutcome {
    /// The action was reversed and consumed.
    Reversed,
    EmptyStack,
    /// The release or transfer no longer exists; the stale entry was dropped.
    AlreadyRemoved,
    /// Returning the stock would overfill a warehouse. The entry stays on top.
    CapacityBlocked,
}

impl<S: EventStore> Ledger<S> {
    /// Reverse the session's most recent release or transfer.
    ///
    /// Release reversals return every line to its item's warehouse and put
    /// the shipment back to CLEARED. Transfer reversals move the stock back
    /// into the source warehouse.
    pub fn undo_last(&self, session: &mut Session) -> LedgerResult<UndoOutcome> {
        let Some(action) = session.undo.pop() else {
            return Ok(UndoOutcome::EmptyStack);
        };
        let at = Utc::now();
        let guard = self.guard;

        let result = self.transact("undo_last", |state| {
            let reversal = match &action {
                UndoAction::Release { release_id, .. } => match state.release(*release_id) {
                    Some(_) => release_reversal(state, &guard, *release_id, at),
                    None => return Ok((Vec::new(), UndoOutcome::AlreadyRemoved)),
                },
                UndoAction::Transfer { transfer_id, .. } => match state.transfer(*transfer_id) {
                    Some(_) => transfer_reversal(state, &guard, *transfer_id, at),
                    None => return Ok((Vec::new(), UndoOutcome::AlreadyRemoved)),
                },
            };
            match reversal {
                Ok(events) => Ok((events, UndoOutcome::Reversed)),
                Err(DomainError::CapacityExceeded(_)) => {
                    Ok((Vec::new(), UndoOutcome::CapacityBlocked))
                }
                Err(err) => Err(err),
            }
        });

        let label = action.label();
        match result {
            Ok(UndoOutcome::Reversed) => {
                session.log(at, format!("Undo {label}"));
                Ok(UndoOutcome::Reversed)
            }
            Ok(UndoOutcome::CapacityBlocked) => {
                tracing::warn!(action = %label, "undo blocked by warehouse capacity");
                session
                    .activity
                    .notify(at, format!("Undo {label} blocked: warehouse capacity exceeded"));
                session.undo.push(action);
                Ok(UndoOutcome::CapacityBlocked)
            }
            Ok(outcome) => {
                tracing::info!(action = %label, "undo target already removed");
                Ok(outcome)
            }
            Err(err) => {
                session.undo.push(action);
                Err(err)
            }
        }
    }
}

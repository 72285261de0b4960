//! Inspection queue operations.

use chrono::Utc;

use bonded_core::{Aggregate, HoldId, ShipmentId};
use bonded_session::Session;
use bonded_warehousing::{
    InspectionOutcome, LedgerEvent, LifecycleCommand, RecordOutcome, ShipmentStatus,
};

use super::Ledger;
use crate::error::{LedgerError, LedgerResult};
use crate::event_store::EventStore;

impl<S: EventStore> Ledger<S> {
    /// Put a shipment at the tail of the session's inspection queue and mark
    /// it ARRIVED. A shipment already in the queue keeps its position.
    pub fn enqueue_for_inspection(
        &self,
        session: &mut Session,
        shipment_id: ShipmentId,
    ) -> LedgerResult<()> {
        let at = Utc::now();
        let reference = self.transact("enqueue_for_inspection", |state| {
            let shipment = state.require_shipment(shipment_id)?;
            let events = shipment.handle(&LifecycleCommand::Enqueue { at })?;
            Ok((
                events.into_iter().map(LedgerEvent::from).collect(),
                shipment.reference_no().to_string(),
            ))
        })?;
        if session.queue.enqueue(shipment_id) {
            session.log(at, format!("Enqueued shipment {reference} for inspection"));
        }
        Ok(())
    }

    /// Take the next shipment off the queue and mark it UNDER_INSPECTION.
    ///
    /// Entries for shipments that were removed or fully released since they
    /// were queued are dropped on the way.
    pub fn dequeue_next_for_inspection(&self, session: &mut Session) -> LedgerResult<ShipmentId> {
        let at = Utc::now();
        while let Some(shipment_id) = session.queue.peek() {
            let reference = self.transact("dequeue_next_for_inspection", |state| {
                match state.shipment(shipment_id) {
                    Some(s) if s.status() != ShipmentStatus::Released => {
                        let events = s.handle(&LifecycleCommand::BeginInspection { at })?;
                        Ok((
                            events.into_iter().map(LedgerEvent::from).collect(),
                            Some(s.reference_no().to_string()),
                        ))
                    }
                    _ => Ok((Vec::new(), None)),
                }
            })?;
            session.queue.dequeue();
            match reference {
                Some(reference) => {
                    session.log(at, format!("Inspecting shipment {reference}"));
                    return Ok(shipment_id);
                }
                None => {
                    tracing::warn!(%shipment_id, "dropping stale inspection queue entry");
                }
            }
        }
        Err(LedgerError::EmptyQueue)
    }

    /// Record the inspector's verdict.
    ///
    /// PASS clears the shipment and resolves its open holds, HOLD requires a
    /// reason and the documents to chase, RECHECK sends it to the back of
    /// the queue.
    pub fn record_inspection_outcome(
        &self,
        session: &mut Session,
        shipment_id: ShipmentId,
        outcome: InspectionOutcome,
        notes: Option<&str>,
        reason: Option<&str>,
        required_docs: Option<&str>,
    ) -> LedgerResult<()> {
        let at = Utc::now();
        let command = LifecycleCommand::RecordOutcome(RecordOutcome {
            outcome,
            notes: notes.map(str::to_string),
            reason: reason.map(str::to_string),
            required_docs: required_docs.map(str::to_string),
            hold_id: HoldId::new(),
            at,
        });
        let reference = self.transact("record_inspection_outcome", |state| {
            let shipment = state.require_shipment(shipment_id)?;
            let events = shipment.handle(&command)?;
            Ok((
                events.into_iter().map(LedgerEvent::from).collect(),
                shipment.reference_no().to_string(),
            ))
        })?;

        match outcome {
            InspectionOutcome::Pass => session.log(at, format!("Inspection PASS for {reference}")),
            InspectionOutcome::Hold => {
                let reason = reason.map(str::trim).unwrap_or_default();
                session.log(at, format!("Inspection HOLD for {reference}: {reason}"));
            }
            InspectionOutcome::Recheck => {
                session.queue.enqueue(shipment_id);
                session.log(at, format!("Inspection RECHECK for {reference}, re-queued"));
            }
        }
        Ok(())
    }
}

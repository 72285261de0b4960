//! Releases and transfers, and their compensating reversals.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use bonded_core::{
    Aggregate, CargoItemId, DomainError, DomainResult, Measure, ReleaseId, ShipmentId,
    TransferId, WarehouseId,
};
use bonded_session::{Session, UndoAction};
use bonded_warehousing::stock::{
    MIN_MOVEMENT, OFFICER_MAX_LEN, RELEASE_NO_MAX_LEN, ReleaseCommitted, ReleaseReversed,
    TransferCommitted, TransferReversed,
};
use bonded_warehousing::validation::{require_amount, require_text};
use bonded_warehousing::{
    CapacityGuard, LedgerEvent, LedgerState, LifecycleCommand, ReleaseLine, StockEvent,
    item_balance, item_balance_in,
};

use super::Ledger;
use crate::error::LedgerResult;
use crate::event_store::EventStore;

/// Input of a customs release.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseRequest {
    pub shipment_id: ShipmentId,
    pub release_no: String,
    pub officer: String,
    pub released_at: DateTime<Utc>,
    /// `(item, quantity)` pairs. Zero quantities are skipped; repeated items are summed.
    pub lines: Vec<(CargoItemId, f64)>,
}

/// Input of an inter-warehouse transfer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferRequest {
    pub item_id: CargoItemId,
    pub from: WarehouseId,
    pub to: WarehouseId,
    pub qty: f64,
    pub weight_kg: f64,
    pub transferred_at: DateTime<Utc>,
}

fn merge_lines(lines: &[(CargoItemId, f64)]) -> DomainResult<Vec<(CargoItemId, f64)>> {
    let mut merged: Vec<(CargoItemId, f64)> = Vec::with_capacity(lines.len());
    for &(item_id, qty) in lines {
        if !qty.is_finite() || qty < 0.0 {
            return Err(DomainError::validation(
                "Release quantity must be a non-negative number",
            ));
        }
        if qty == 0.0 {
            continue;
        }
        match merged.iter_mut().find(|(id, _)| *id == item_id) {
            Some(line) => line.1 += qty,
            None => merged.push((item_id, qty)),
        }
    }
    if merged.is_empty() {
        return Err(DomainError::validation(
            "Provide at least one release quantity > 0",
        ));
    }
    Ok(merged)
}

/// Events undoing a live release. Re-admits every released line into the
/// warehouse its item was received into, so capacity is checked per warehouse.
pub(super) fn release_reversal(
    state: &LedgerState,
    guard: &CapacityGuard,
    release_id: ReleaseId,
    at: DateTime<Utc>,
) -> DomainResult<Vec<LedgerEvent>> {
    let release = state.require_release(release_id)?;

    let mut returning: BTreeMap<WarehouseId, Measure> = BTreeMap::new();
    for line in &release.lines {
        if let Some(item) = state.item(line.item_id) {
            *returning.entry(item.warehouse_id).or_default() += line.amount();
        }
    }
    for (&warehouse_id, &amount) in &returning {
        guard.ensure_admits(state, warehouse_id, amount)?;
    }

    let shipment = state.require_shipment(release.shipment_id)?;
    let mut events = vec![LedgerEvent::from(StockEvent::ReleaseReversed(
        ReleaseReversed {
            release_id,
            occurred_at: at,
        },
    ))];
    events.extend(
        shipment
            .handle(&LifecycleCommand::ReverseRelease { at })?
            .into_iter()
            .map(LedgerEvent::from),
    );
    Ok(events)
}

/// Events undoing a live transfer; the moved stock returns to its source.
pub(super) fn transfer_reversal(
    state: &LedgerState,
    guard: &CapacityGuard,
    transfer_id: TransferId,
    at: DateTime<Utc>,
) -> DomainResult<Vec<LedgerEvent>> {
    let transfer = state.require_transfer(transfer_id)?;
    guard.ensure_admits(state, transfer.from, transfer.amount)?;
    Ok(vec![
        StockEvent::TransferReversed(TransferReversed {
            transfer_id,
            occurred_at: at,
        })
        .into(),
    ])
}

impl<S: EventStore> Ledger<S> {
    /// Commit a release atomically and push it onto the session's undo log.
    ///
    /// Line weight and value are allocated from the item's received ratios
    /// and rounded before they are persisted. The shipment must be CLEARED;
    /// it becomes RELEASED once no item has quantity left.
    pub fn create_release(
        &self,
        session: &mut Session,
        request: ReleaseRequest,
    ) -> LedgerResult<ReleaseId> {
        let tolerance = self.guard.tolerance();
        let decimals = self.config.amount_decimals;
        let shipment_id = request.shipment_id;
        let at = request.released_at;

        let (release_id, action, reference) = self.transact("create_release", |state| {
            let shipment = state.require_shipment(shipment_id)?;
            let release_no = require_text(&request.release_no, "Release No", RELEASE_NO_MAX_LEN)?;
            let officer = require_text(&request.officer, "Officer Name", OFFICER_MAX_LEN)?;
            if state.release_by_number(&release_no).is_some() {
                return Err(DomainError::validation(format!(
                    "release number {release_no} already exists"
                )));
            }

            let mut lines = Vec::new();
            for (item_id, qty) in merge_lines(&request.lines)? {
                let item = state
                    .item(item_id)
                    .filter(|i| i.shipment_id == shipment_id)
                    .ok_or_else(|| DomainError::not_found("cargo item"))?;
                let available = item_balance(state, item_id)?.available;
                if qty > available.qty + tolerance {
                    return Err(DomainError::insufficient(format!(
                        "cannot release {qty} of {}: {:.2} available",
                        item.classification_code, available.qty
                    )));
                }
                lines.push(ReleaseLine::priced(item, qty, decimals));
            }

            let mut fully_released = true;
            for item in state.items_of(shipment_id) {
                let releasing: f64 = lines
                    .iter()
                    .filter(|l| l.item_id == item.id)
                    .map(|l| l.qty)
                    .sum();
                let left = item_balance(state, item.id)?.available.qty - releasing;
                if left > tolerance {
                    fully_released = false;
                }
            }
            let status_events = shipment.handle(&LifecycleCommand::CommitRelease {
                fully_released,
                at,
            })?;

            let release_id = ReleaseId::new();
            let mut events = vec![LedgerEvent::from(StockEvent::ReleaseCommitted(
                ReleaseCommitted {
                    release_id,
                    shipment_id,
                    release_no: release_no.clone(),
                    officer,
                    lines: lines.clone(),
                    occurred_at: at,
                },
            ))];
            events.extend(status_events.into_iter().map(LedgerEvent::from));

            let action = UndoAction::Release {
                release_id,
                release_no,
                shipment_id,
                lines,
            };
            Ok((events, (release_id, action, shipment.reference_no().to_string())))
        })?;

        session.log(
            at,
            format!(
                "Created release {} for shipment {reference}",
                request.release_no.trim()
            ),
        );
        session.undo.push(action);
        Ok(release_id)
    }

    /// Move stock of one item between warehouses and push it onto the undo log.
    pub fn create_transfer(
        &self,
        session: &mut Session,
        request: TransferRequest,
    ) -> LedgerResult<TransferId> {
        let guard = self.guard;
        let at = request.transferred_at;

        let (transfer_id, message) = self.transact("create_transfer", |state| {
            let qty = require_amount(request.qty, "Qty", MIN_MOVEMENT)?;
            let weight_kg = require_amount(request.weight_kg, "Weight", MIN_MOVEMENT)?;
            if request.from == request.to {
                return Err(DomainError::SameWarehouse);
            }
            let item = state.require_item(request.item_id)?;
            let from = state.require_warehouse(request.from)?;
            let to = state.require_warehouse(request.to)?;

            let amount = Measure::new(qty, weight_kg);
            let residual = item_balance_in(state, request.item_id, request.from)?;
            if !amount.fits_within(&residual, guard.tolerance()) {
                return Err(DomainError::insufficient(format!(
                    "transfer exceeds available stock of {} in {}: {:.2} qty / {:.2} kg",
                    item.classification_code, from.code, residual.qty, residual.weight_kg
                )));
            }
            guard.ensure_admits(state, request.to, amount)?;

            let transfer_id = TransferId::new();
            let event = StockEvent::TransferCommitted(TransferCommitted {
                transfer_id,
                item_id: request.item_id,
                from: request.from,
                to: request.to,
                amount,
                occurred_at: at,
            });
            let message = format!(
                "Transferred {} qty {qty} from {} to {}",
                item.classification_code, from.code, to.code
            );
            Ok((vec![event.into()], (transfer_id, message)))
        })?;

        session.log(at, message);
        session.undo.push(UndoAction::Transfer {
            transfer_id,
            item_id: request.item_id,
            from: request.from,
            to: request.to,
            amount: Measure::new(request.qty, request.weight_kg),
        });
        Ok(transfer_id)
    }

    /// Delete a release outside any undo log (e.g. by another operator).
    pub fn cancel_release(&self, session: &mut Session, release_id: ReleaseId) -> LedgerResult<()> {
        let at = Utc::now();
        let guard = self.guard;
        let release_no = self.transact("cancel_release", |state| {
            let release_no = state.require_release(release_id)?.release_no.clone();
            Ok((release_reversal(state, &guard, release_id, at)?, release_no))
        })?;
        session.log(at, format!("Cancelled release {release_no}"));
        Ok(())
    }

    /// Delete a transfer outside any undo log.
    pub fn cancel_transfer(
        &self,
        session: &mut Session,
        transfer_id: TransferId,
    ) -> LedgerResult<()> {
        let at = Utc::now();
        let guard = self.guard;
        self.transact("cancel_transfer", |state| {
            Ok((transfer_reversal(state, &guard, transfer_id, at)?, ()))
        })?;
        session.log(at, format!("Cancelled transfer {transfer_id}"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_repeated_items_and_skips_zeroes() {
        let a = CargoItemId::new();
        let b = CargoItemId::new();
        let merged = merge_lines(&[(a, 10.0), (b, 0.0), (a, 5.5)]).unwrap();
        assert_eq!(merged, vec![(a, 15.5)]);
    }

    #[test]
    fn merge_rejects_negative_and_empty_input() {
        let a = CargoItemId::new();
        assert!(matches!(
            merge_lines(&[(a, -1.0)]),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            merge_lines(&[(a, 0.0)]),
            Err(DomainError::Validation(msg)) if msg.contains("at least one")
        ));
        assert!(merge_lines(&[(a, f64::NAN)]).is_err());
    }
}

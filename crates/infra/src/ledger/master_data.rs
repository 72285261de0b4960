//! Warehouses, shipments and cargo item receipts.

use chrono::Utc;

use bonded_core::{CargoItemId, DomainError, DomainResult, ShipmentId, WarehouseId};
use bonded_session::Session;
use bonded_warehousing::shipment::{ShipmentRegistered, ShipmentRemoved};
use bonded_warehousing::stock::{ItemReceived, ItemRemoved};
use bonded_warehousing::warehouse::{WarehouseRegistered, WarehouseRemoved, WarehouseUpdated};
use bonded_warehousing::{
    LedgerEvent, LedgerState, ReceiptSpec, ShipmentEvent, ShipmentSpec, StockEvent,
    WarehouseEvent, WarehouseSpec, warehouse_usage,
};

use super::Ledger;
use crate::error::LedgerResult;
use crate::event_store::EventStore;

fn ensure_unique_code(
    state: &LedgerState,
    code: &str,
    except: Option<WarehouseId>,
) -> DomainResult<()> {
    match state.warehouse_by_code(code) {
        Some(existing) if Some(existing.id) != except => Err(DomainError::validation(format!(
            "warehouse code {code} already exists"
        ))),
        _ => Ok(()),
    }
}

impl<S: EventStore> Ledger<S> {
    pub fn register_warehouse(
        &self,
        session: &mut Session,
        spec: WarehouseSpec,
    ) -> LedgerResult<WarehouseId> {
        let at = Utc::now();
        let id = self.transact("register_warehouse", |state| {
            ensure_unique_code(state, &spec.code, None)?;
            let id = WarehouseId::new();
            let event = WarehouseEvent::Registered(WarehouseRegistered {
                warehouse_id: id,
                code: spec.code.clone(),
                name: spec.name.clone(),
                capacity: spec.capacity,
                occurred_at: at,
            });
            Ok((vec![event.into()], id))
        })?;
        session.log(at, format!("Created warehouse {}", spec.code));
        Ok(id)
    }

    /// Replace a warehouse's master data. Capacity may not shrink below what
    /// the warehouse currently holds.
    pub fn update_warehouse(
        &self,
        session: &mut Session,
        warehouse_id: WarehouseId,
        spec: WarehouseSpec,
    ) -> LedgerResult<()> {
        let at = Utc::now();
        let tolerance = self.guard.tolerance();
        self.transact("update_warehouse", |state| {
            state.require_warehouse(warehouse_id)?;
            ensure_unique_code(state, &spec.code, Some(warehouse_id))?;
            let used = warehouse_usage(state, warehouse_id);
            if !used.fits_within(&spec.capacity, tolerance) {
                return Err(DomainError::capacity(format!(
                    "warehouse {} holds {:.2} qty / {:.2} kg, above the new capacity",
                    spec.code, used.qty, used.weight_kg
                )));
            }
            let event = WarehouseEvent::Updated(WarehouseUpdated {
                warehouse_id,
                code: spec.code.clone(),
                name: spec.name.clone(),
                capacity: spec.capacity,
                occurred_at: at,
            });
            Ok((vec![event.into()], ()))
        })?;
        session.log(at, format!("Updated warehouse {}", spec.code));
        Ok(())
    }

    /// Blocked while any item or transfer references the warehouse.
    pub fn remove_warehouse(
        &self,
        session: &mut Session,
        warehouse_id: WarehouseId,
    ) -> LedgerResult<()> {
        let at = Utc::now();
        let code = self.transact("remove_warehouse", |state| {
            let warehouse = state.require_warehouse(warehouse_id)?;
            if state.is_warehouse_referenced(warehouse_id) {
                return Err(DomainError::referenced(format!(
                    "warehouse {} has item/transfer history",
                    warehouse.code
                )));
            }
            let event = WarehouseEvent::Removed(WarehouseRemoved {
                warehouse_id,
                occurred_at: at,
            });
            Ok((vec![event.into()], warehouse.code.clone()))
        })?;
        session.log(at, format!("Deleted warehouse {code}"));
        Ok(())
    }

    /// Register a new shipment in status ARRIVED.
    pub fn register_shipment(
        &self,
        session: &mut Session,
        spec: ShipmentSpec,
    ) -> LedgerResult<ShipmentId> {
        let at = Utc::now();
        let id = self.transact("register_shipment", |state| {
            if state.shipment_by_reference(&spec.reference_no).is_some() {
                return Err(DomainError::validation(format!(
                    "reference {} already exists",
                    spec.reference_no
                )));
            }
            let id = ShipmentId::new();
            let event = ShipmentEvent::Registered(ShipmentRegistered {
                shipment_id: id,
                reference_no: spec.reference_no.clone(),
                vessel: spec.vessel.clone(),
                arrival_date: spec.arrival_date,
                origin: spec.origin.clone(),
                importer: spec.importer.clone(),
                occurred_at: at,
            });
            Ok((vec![event.into()], id))
        })?;
        session.log(at, format!("Created shipment {}", spec.reference_no));
        Ok(id)
    }

    /// Register a shipment and queue it for inspection in one step.
    pub fn register_shipment_and_enqueue(
        &self,
        session: &mut Session,
        spec: ShipmentSpec,
    ) -> LedgerResult<ShipmentId> {
        let id = self.register_shipment(session, spec)?;
        self.enqueue_for_inspection(session, id)?;
        Ok(id)
    }

    /// Remove a shipment with its items, holds and inspection record.
    ///
    /// Blocked once the shipment has a release or any of its items was transferred.
    pub fn remove_shipment(&self, session: &mut Session, shipment_id: ShipmentId) -> LedgerResult<()> {
        let at = Utc::now();
        let reference = self.transact("remove_shipment", |state| {
            let shipment = state.require_shipment(shipment_id)?;
            if state.shipment_has_history(shipment_id) {
                return Err(DomainError::referenced(format!(
                    "shipment {} has release/transfer history",
                    shipment.reference_no()
                )));
            }
            let event = ShipmentEvent::Removed(ShipmentRemoved {
                shipment_id,
                occurred_at: at,
            });
            Ok((vec![event.into()], shipment.reference_no().to_string()))
        })?;
        session.queue.remove(shipment_id);
        session.log(at, format!("Deleted shipment {reference}"));
        Ok(())
    }

    /// Record a cargo receipt into a warehouse, subject to its capacity.
    pub fn receive_item(
        &self,
        session: &mut Session,
        shipment_id: ShipmentId,
        warehouse_id: WarehouseId,
        receipt: ReceiptSpec,
    ) -> LedgerResult<CargoItemId> {
        let at = Utc::now();
        let guard = self.guard;
        let (id, reference) = self.transact("receive_item", |state| {
            let shipment = state.require_shipment(shipment_id)?;
            state.require_warehouse(warehouse_id)?;
            guard.ensure_admits(state, warehouse_id, receipt.received)?;

            let id = CargoItemId::new();
            let event = StockEvent::ItemReceived(ItemReceived {
                item_id: id,
                shipment_id,
                classification_code: receipt.classification_code.clone(),
                description: receipt.description.clone(),
                unit: receipt.unit,
                received: receipt.received,
                declared_value: receipt.declared_value,
                warehouse_id,
                occurred_at: at,
            });
            Ok((vec![event.into()], (id, shipment.reference_no().to_string())))
        })?;
        session.log(
            at,
            format!(
                "Added item {} to shipment {reference}",
                receipt.classification_code
            ),
        );
        Ok(id)
    }

    /// Blocked once a release or transfer references the item.
    pub fn remove_item(&self, session: &mut Session, item_id: CargoItemId) -> LedgerResult<()> {
        let at = Utc::now();
        let code = self.transact("remove_item", |state| {
            let item = state.require_item(item_id)?;
            if state.is_item_referenced(item_id) {
                return Err(DomainError::referenced(format!(
                    "item {} has release/transfer history",
                    item.classification_code
                )));
            }
            let event = StockEvent::ItemRemoved(ItemRemoved {
                item_id,
                occurred_at: at,
            });
            Ok((vec![LedgerEvent::from(event)], item.classification_code.clone()))
        })?;
        session.log(at, format!("Deleted item {code}"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::event_store::InMemoryEventStore;
    use bonded_core::Measure;
    use bonded_warehousing::Unit;
    use chrono::NaiveDate;

    fn ledger() -> (Ledger<InMemoryEventStore>, Session) {
        let ledger = Ledger::new(InMemoryEventStore::new()).unwrap();
        let session = ledger.open_session();
        (ledger, session)
    }

    fn shipment_spec(reference: &str) -> ShipmentSpec {
        ShipmentSpec::new(
            reference,
            "MV Straits",
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            "Rotterdam",
            "Acme Imports",
        )
        .unwrap()
    }

    #[test]
    fn warehouse_codes_are_unique() {
        let (ledger, mut session) = ledger();
        let spec = WarehouseSpec::new("WH-A", "Shed A", 100.0, 100.0).unwrap();
        ledger.register_warehouse(&mut session, spec.clone()).unwrap();
        let err = ledger.register_warehouse(&mut session, spec).unwrap_err();
        assert!(matches!(err, LedgerError::ValidationFailed(_)));
        assert_eq!(ledger.version().unwrap(), 1);
    }

    #[test]
    fn capacity_cannot_shrink_below_usage() {
        let (ledger, mut session) = ledger();
        let wh = ledger
            .register_warehouse(&mut session, WarehouseSpec::new("WH-A", "Shed A", 100.0, 100.0).unwrap())
            .unwrap();
        let s = ledger.register_shipment(&mut session, shipment_spec("BL-1")).unwrap();
        ledger
            .receive_item(
                &mut session,
                s,
                wh,
                ReceiptSpec::new("8471", "Laptops", Unit::Pcs, 60.0, 60.0, 600.0).unwrap(),
            )
            .unwrap();

        let shrink = WarehouseSpec::new("WH-A", "Shed A", 50.0, 100.0).unwrap();
        assert!(matches!(
            ledger.update_warehouse(&mut session, wh, shrink),
            Err(LedgerError::CapacityExceeded(_))
        ));
        let rename = WarehouseSpec::new("WH-A1", "Shed A", 60.0, 100.0).unwrap();
        ledger.update_warehouse(&mut session, wh, rename).unwrap();
        let state = ledger.snapshot().unwrap();
        assert_eq!(state.require_warehouse(wh).unwrap().code, "WH-A1");
        assert_eq!(state.require_warehouse(wh).unwrap().capacity, Measure::new(60.0, 100.0));
    }

    #[test]
    fn referenced_records_cannot_be_removed() {
        let (ledger, mut session) = ledger();
        let wh = ledger
            .register_warehouse(&mut session, WarehouseSpec::new("WH-A", "Shed A", 100.0, 100.0).unwrap())
            .unwrap();
        let s = ledger.register_shipment(&mut session, shipment_spec("BL-1")).unwrap();
        let item = ledger
            .receive_item(
                &mut session,
                s,
                wh,
                ReceiptSpec::new("8471", "Laptops", Unit::Pcs, 10.0, 10.0, 100.0).unwrap(),
            )
            .unwrap();

        assert!(matches!(
            ledger.remove_warehouse(&mut session, wh),
            Err(LedgerError::Referenced(_))
        ));
        ledger.remove_item(&mut session, item).unwrap();
        ledger.remove_warehouse(&mut session, wh).unwrap();
        assert!(matches!(
            ledger.remove_item(&mut session, item),
            Err(LedgerError::NotFound(what)) if what == "cargo item"
        ));
    }

    #[test]
    fn removing_a_shipment_cascades_and_dequeues() {
        let (ledger, mut session) = ledger();
        let wh = ledger
            .register_warehouse(&mut session, WarehouseSpec::new("WH-A", "Shed A", 100.0, 100.0).unwrap())
            .unwrap();
        let s = ledger
            .register_shipment_and_enqueue(&mut session, shipment_spec("BL-1"))
            .unwrap();
        let item = ledger
            .receive_item(
                &mut session,
                s,
                wh,
                ReceiptSpec::new("8471", "Laptops", Unit::Pcs, 10.0, 10.0, 100.0).unwrap(),
            )
            .unwrap();
        assert!(session.queue.contains(s));

        ledger.remove_shipment(&mut session, s).unwrap();
        let state = ledger.snapshot().unwrap();
        assert!(state.shipment(s).is_none());
        assert!(state.item(item).is_none());
        assert!(!session.queue.contains(s));
        assert_eq!(
            session.activity.notifications().next().map(|n| n.message.clone()),
            Some("Deleted shipment BL-1".to_string())
        );
    }

    #[test]
    fn duplicate_reference_is_rejected() {
        let (ledger, mut session) = ledger();
        ledger.register_shipment(&mut session, shipment_spec("BL-1")).unwrap();
        assert!(matches!(
            ledger.register_shipment(&mut session, shipment_spec("BL-1")),
            Err(LedgerError::ValidationFailed(_))
        ));
    }
}

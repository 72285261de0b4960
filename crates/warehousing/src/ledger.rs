//! The ledger: every committed event, folded into current state.
//!
//! `LedgerState` is a pure fold over the ordered event history. Replaying the
//! same history from scratch always yields an identical state, which is what
//! lets a cached state be checked against a fresh replay.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bonded_core::{
    Aggregate, CargoItemId, DomainError, DomainResult, Entity, ReleaseId, ShipmentId, TransferId,
    WarehouseId,
};
use bonded_events::{Event, EventEnvelope};

use crate::shipment::{Shipment, ShipmentEvent};
use crate::stock::{CargoItem, Release, ReleaseLine, StockEvent, Transfer};
use crate::warehouse::{Warehouse, WarehouseEvent};

/// Every fact the ledger records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    Warehouse(WarehouseEvent),
    Shipment(ShipmentEvent),
    Stock(StockEvent),
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::Warehouse(e) => e.event_type(),
            LedgerEvent::Shipment(e) => e.event_type(),
            LedgerEvent::Stock(e) => e.event_type(),
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::Warehouse(e) => e.occurred_at(),
            LedgerEvent::Shipment(e) => e.occurred_at(),
            LedgerEvent::Stock(e) => e.occurred_at(),
        }
    }
}

impl From<WarehouseEvent> for LedgerEvent {
    fn from(value: WarehouseEvent) -> Self {
        LedgerEvent::Warehouse(value)
    }
}

impl From<ShipmentEvent> for LedgerEvent {
    fn from(value: ShipmentEvent) -> Self {
        LedgerEvent::Shipment(value)
    }
}

impl From<StockEvent> for LedgerEvent {
    fn from(value: StockEvent) -> Self {
        LedgerEvent::Stock(value)
    }
}

fn require<'a, E: Entity>(table: &'a BTreeMap<E::Id, E>, id: &E::Id) -> DomainResult<&'a E> {
    table.get(id).ok_or_else(|| DomainError::not_found(E::KIND))
}

fn insert<E: Entity>(table: &mut BTreeMap<E::Id, E>, entity: E) {
    table.insert(entity.id().clone(), entity);
}

/// Current state of warehouses, shipments, items and live movements.
///
/// Reversed releases/transfers are dropped from the live tables; their
/// committed and reversing events stay in the history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerState {
    version: u64,
    warehouses: BTreeMap<WarehouseId, Warehouse>,
    shipments: BTreeMap<ShipmentId, Shipment>,
    items: BTreeMap<CargoItemId, CargoItem>,
    releases: BTreeMap<ReleaseId, Release>,
    transfers: BTreeMap<TransferId, Transfer>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a complete history into a fresh state.
    pub fn replay<'a>(
        envelopes: impl IntoIterator<Item = &'a EventEnvelope<LedgerEvent>>,
    ) -> DomainResult<Self> {
        let mut state = Self::new();
        for envelope in envelopes {
            state.apply_envelope(envelope)?;
        }
        Ok(state)
    }

    /// Sequence number of the last applied event (0 for an empty ledger).
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Apply one committed event.
    ///
    /// Returns `Ok(false)` for an envelope at or below the current version
    /// (already applied), and rejects gaps in the sequence.
    pub fn apply_envelope(&mut self, envelope: &EventEnvelope<LedgerEvent>) -> DomainResult<bool> {
        let seq = envelope.sequence_number();
        if seq <= self.version {
            return Ok(false);
        }
        if seq != self.version + 1 {
            return Err(DomainError::conflict(format!(
                "non-monotonic ledger sequence (last={}, found={seq})",
                self.version
            )));
        }
        self.apply(seq, envelope.payload());
        self.version = seq;
        Ok(true)
    }

    // Events naming entities that no longer exist are ignored; the history
    // stays replayable even if a later event outlives its target.
    fn apply(&mut self, sequence: u64, event: &LedgerEvent) {
        match event {
            LedgerEvent::Warehouse(e) => self.apply_warehouse(e),
            LedgerEvent::Shipment(e) => self.apply_shipment(e),
            LedgerEvent::Stock(e) => self.apply_stock(sequence, e),
        }
    }

    fn apply_warehouse(&mut self, event: &WarehouseEvent) {
        match event {
            WarehouseEvent::Registered(e) => insert(
                &mut self.warehouses,
                Warehouse {
                    id: e.warehouse_id,
                    code: e.code.clone(),
                    name: e.name.clone(),
                    capacity: e.capacity,
                    registered_at: e.occurred_at,
                },
            ),
            WarehouseEvent::Updated(e) => {
                if let Some(w) = self.warehouses.get_mut(&e.warehouse_id) {
                    w.code = e.code.clone();
                    w.name = e.name.clone();
                    w.capacity = e.capacity;
                }
            }
            WarehouseEvent::Removed(e) => {
                self.warehouses.remove(&e.warehouse_id);
            }
        }
    }

    fn apply_shipment(&mut self, event: &ShipmentEvent) {
        let shipment_id = event.shipment_id();
        match event {
            ShipmentEvent::Registered(_) => {
                let mut shipment = Shipment::empty(shipment_id);
                shipment.apply(event);
                self.shipments.insert(shipment_id, shipment);
            }
            ShipmentEvent::Removed(_) => {
                // Holds and the inspection record live on the shipment itself.
                self.shipments.remove(&shipment_id);
                self.items.retain(|_, item| item.shipment_id != shipment_id);
            }
            _ => {
                if let Some(shipment) = self.shipments.get_mut(&shipment_id) {
                    shipment.apply(event);
                }
            }
        }
    }

    fn apply_stock(&mut self, sequence: u64, event: &StockEvent) {
        match event {
            StockEvent::ItemReceived(e) => insert(
                &mut self.items,
                CargoItem {
                    id: e.item_id,
                    shipment_id: e.shipment_id,
                    classification_code: e.classification_code.clone(),
                    description: e.description.clone(),
                    unit: e.unit,
                    received: e.received,
                    declared_value: e.declared_value,
                    warehouse_id: e.warehouse_id,
                    received_at: e.occurred_at,
                },
            ),
            StockEvent::ItemRemoved(e) => {
                self.items.remove(&e.item_id);
            }
            StockEvent::ReleaseCommitted(e) => insert(
                &mut self.releases,
                Release {
                    id: e.release_id,
                    shipment_id: e.shipment_id,
                    release_no: e.release_no.clone(),
                    officer: e.officer.clone(),
                    released_at: e.occurred_at,
                    lines: e.lines.clone(),
                    sequence,
                },
            ),
            StockEvent::ReleaseReversed(e) => {
                self.releases.remove(&e.release_id);
            }
            StockEvent::TransferCommitted(e) => insert(
                &mut self.transfers,
                Transfer {
                    id: e.transfer_id,
                    item_id: e.item_id,
                    from: e.from,
                    to: e.to,
                    amount: e.amount,
                    transferred_at: e.occurred_at,
                    sequence,
                },
            ),
            StockEvent::TransferReversed(e) => {
                self.transfers.remove(&e.transfer_id);
            }
        }
    }

    // ---- warehouses ----

    pub fn warehouse(&self, id: WarehouseId) -> Option<&Warehouse> {
        self.warehouses.get(&id)
    }

    pub fn require_warehouse(&self, id: WarehouseId) -> DomainResult<&Warehouse> {
        require(&self.warehouses, &id)
    }

    /// Warehouses ordered by code.
    pub fn warehouses(&self) -> Vec<&Warehouse> {
        let mut list: Vec<_> = self.warehouses.values().collect();
        list.sort_by(|a, b| a.code.cmp(&b.code).then(a.id.cmp(&b.id)));
        list
    }

    pub fn warehouse_by_code(&self, code: &str) -> Option<&Warehouse> {
        self.warehouses.values().find(|w| w.code == code)
    }

    /// True while any item was received into, or any transfer touches, the warehouse.
    pub fn is_warehouse_referenced(&self, id: WarehouseId) -> bool {
        self.items.values().any(|i| i.warehouse_id == id)
            || self.transfers.values().any(|t| t.from == id || t.to == id)
    }

    // ---- shipments ----

    pub fn shipment(&self, id: ShipmentId) -> Option<&Shipment> {
        self.shipments.get(&id)
    }

    pub fn require_shipment(&self, id: ShipmentId) -> DomainResult<&Shipment> {
        self.shipments
            .get(&id)
            .ok_or_else(|| DomainError::not_found("shipment"))
    }

    pub fn shipments(&self) -> impl Iterator<Item = &Shipment> {
        self.shipments.values()
    }

    pub fn shipment_by_reference(&self, reference_no: &str) -> Option<&Shipment> {
        self.shipments
            .values()
            .find(|s| s.reference_no() == reference_no)
    }

    /// True when the shipment has a live release or any of its items was transferred.
    pub fn shipment_has_history(&self, id: ShipmentId) -> bool {
        self.releases.values().any(|r| r.shipment_id == id)
            || self.transfers.values().any(|t| {
                self.items
                    .get(&t.item_id)
                    .is_some_and(|i| i.shipment_id == id)
            })
    }

    // ---- items ----

    pub fn item(&self, id: CargoItemId) -> Option<&CargoItem> {
        self.items.get(&id)
    }

    pub fn require_item(&self, id: CargoItemId) -> DomainResult<&CargoItem> {
        require(&self.items, &id)
    }

    pub fn items(&self) -> impl Iterator<Item = &CargoItem> {
        self.items.values()
    }

    /// Items of a shipment in receipt order.
    pub fn items_of(&self, shipment_id: ShipmentId) -> Vec<&CargoItem> {
        let mut list: Vec<_> = self
            .items
            .values()
            .filter(|i| i.shipment_id == shipment_id)
            .collect();
        list.sort_by(|a, b| a.received_at.cmp(&b.received_at).then(a.id.cmp(&b.id)));
        list
    }

    pub fn is_item_referenced(&self, id: CargoItemId) -> bool {
        self.release_lines_for(id).next().is_some()
            || self.transfers.values().any(|t| t.item_id == id)
    }

    // ---- releases ----

    pub fn release(&self, id: ReleaseId) -> Option<&Release> {
        self.releases.get(&id)
    }

    pub fn require_release(&self, id: ReleaseId) -> DomainResult<&Release> {
        require(&self.releases, &id)
    }

    /// Live releases in commit order.
    pub fn releases(&self) -> Vec<&Release> {
        let mut list: Vec<_> = self.releases.values().collect();
        list.sort_by_key(|r| r.sequence);
        list
    }

    pub fn release_by_number(&self, release_no: &str) -> Option<&Release> {
        self.releases.values().find(|r| r.release_no == release_no)
    }

    pub fn release_lines_for(&self, item_id: CargoItemId) -> impl Iterator<Item = &ReleaseLine> {
        self.releases
            .values()
            .flat_map(|r| r.lines.iter())
            .filter(move |l| l.item_id == item_id)
    }

    // ---- transfers ----

    pub fn transfer(&self, id: TransferId) -> Option<&Transfer> {
        self.transfers.get(&id)
    }

    pub fn require_transfer(&self, id: TransferId) -> DomainResult<&Transfer> {
        require(&self.transfers, &id)
    }

    /// Live transfers in commit order.
    pub fn transfers(&self) -> Vec<&Transfer> {
        let mut list: Vec<_> = self.transfers.values().collect();
        list.sort_by_key(|t| t.sequence);
        list
    }

    /// Live transfers of one item in commit order.
    pub fn transfers_for(&self, item_id: CargoItemId) -> Vec<&Transfer> {
        let mut list: Vec<_> = self
            .transfers
            .values()
            .filter(|t| t.item_id == item_id)
            .collect();
        list.sort_by_key(|t| t.sequence);
        list
    }
}

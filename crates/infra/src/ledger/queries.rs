//! Read-only queries and the session-local analytics.

use chrono::{NaiveDate, Utc};

use bonded_core::{CargoItemId, Measure, ReleaseId, ShipmentId, WarehouseId};
use bonded_session::{Session, Traversal};
use bonded_warehousing::{
    CodeValue, Dashboard, HoldRow, ItemBalance, ReleaseNote, SearchField, ShipmentQuery,
    ShipmentSummary, ShipmentView, Utilization, Warehouse, balance, reports,
};

use super::Ledger;
use crate::error::LedgerResult;
use crate::event_store::EventStore;

impl<S: EventStore> Ledger<S> {
    pub fn warehouses(&self) -> LedgerResult<Vec<Warehouse>> {
        self.read(|state| Ok(state.warehouses().into_iter().cloned().collect()))
    }

    /// Received, released and transferred totals of one item.
    pub fn balances_for_item(&self, item_id: CargoItemId) -> LedgerResult<ItemBalance> {
        self.read(|state| balance::item_balance(state, item_id))
    }

    /// What of an item still sits in the given warehouse.
    pub fn item_warehouse_balance(
        &self,
        item_id: CargoItemId,
        warehouse_id: WarehouseId,
    ) -> LedgerResult<Measure> {
        self.read(|state| balance::item_balance_in(state, item_id, warehouse_id))
    }

    pub fn utilization(&self, warehouse_id: WarehouseId) -> LedgerResult<Utilization> {
        self.read(|state| balance::utilization(state, warehouse_id))
    }

    /// Utilization of every warehouse, ordered by code.
    pub fn utilization_all(&self) -> LedgerResult<Vec<Utilization>> {
        self.read(|state| Ok(balance::utilization_all(state)))
    }

    pub fn shipment_summaries(&self) -> LedgerResult<Vec<ShipmentSummary>> {
        self.read(|state| Ok(reports::shipment_summaries(state)))
    }

    pub fn shipment_view(&self, shipment_id: ShipmentId) -> LedgerResult<ShipmentView> {
        self.read(|state| reports::shipment_view(state, shipment_id))
    }

    pub fn release_note(&self, release_id: ReleaseId) -> LedgerResult<ReleaseNote> {
        self.read(|state| reports::release_note(state, release_id))
    }

    pub fn open_holds(&self) -> LedgerResult<Vec<HoldRow>> {
        self.read(|state| Ok(reports::open_holds(state)))
    }

    pub fn top_classification_codes(&self, n: usize) -> LedgerResult<Vec<CodeValue>> {
        self.read(|state| Ok(reports::top_classification_codes(state, n)))
    }

    pub fn dashboard(&self, today: NaiveDate, aging_days: i64) -> LedgerResult<Dashboard> {
        self.read(|state| reports::dashboard(state, today, aging_days))
    }

    /// Filter and sort the shipment list. Whole-number lookups on value or
    /// quantity go through the session's rebuilt value indexes.
    pub fn search_shipments(
        &self,
        session: &mut Session,
        query: &ShipmentQuery,
    ) -> LedgerResult<Vec<ShipmentSummary>> {
        self.read(|state| {
            session.indexes.rebuild(state);
            if !query.is_exact_lookup() {
                return Ok(reports::search_shipments(state, query));
            }
            let Some(target) = query.numeric_target() else {
                return Ok(Vec::new());
            };
            let index = match query.field {
                SearchField::Quantity => &session.indexes.quantities,
                _ => &session.indexes.values,
            };
            let mut rows: Vec<_> = index
                .search(target)
                .iter()
                .filter_map(|id| state.shipment(*id))
                .map(|shipment| reports::shipment_summary(state, shipment))
                .collect();
            reports::sort_summaries(&mut rows, query.sort);
            tracing::debug!(field = ?query.field, target, hits = rows.len(), "indexed lookup");
            Ok(rows)
        })
    }

    /// Shipments whose total declared value lies in `[min, max]`, lowest
    /// value first. Rebuilds the session's value index.
    pub fn value_range_report(
        &self,
        session: &mut Session,
        min: f64,
        max: f64,
    ) -> LedgerResult<Vec<ShipmentSummary>> {
        self.read(|state| {
            session.indexes.rebuild(state);
            Ok(session
                .indexes
                .values
                .range(min, max)
                .into_iter()
                .filter_map(|(_, id)| state.shipment(id))
                .map(|shipment| reports::shipment_summary(state, shipment))
                .collect())
        })
    }

    /// Warehouses reachable from `start` along recorded transfers, in visit
    /// order. Empty for an unknown warehouse.
    pub fn transfer_reachability(
        &self,
        session: &mut Session,
        start: WarehouseId,
        traversal: Traversal,
    ) -> LedgerResult<Vec<WarehouseId>> {
        self.read(|state| {
            session.indexes.rebuild(state);
            Ok(session.indexes.graph.reachable_from(start, traversal))
        })
    }

    /// Whether stock has ever been able to travel in a loop.
    pub fn has_transfer_cycle(&self, session: &mut Session) -> LedgerResult<bool> {
        self.read(|state| {
            session.indexes.rebuild(state);
            Ok(session.indexes.graph.has_cycle())
        })
    }

    /// Exact lookup by reference number (surrounding whitespace ignored).
    pub fn quick_find(
        &self,
        session: &mut Session,
        reference: &str,
    ) -> LedgerResult<Option<ShipmentSummary>> {
        self.read(|state| Ok(session.quick_find(state, reference).cloned()))
    }

    /// Clear the session's queue, undo log, indexes and activity entries.
    /// The ledger itself is untouched.
    pub fn reset_session(&self, session: &mut Session) {
        session.reset(Utc::now());
    }
}

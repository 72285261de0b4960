//! Balance Calculator: available stock and warehouse utilization, derived
//! from the live releases and transfers in a [`LedgerState`].

use serde::{Deserialize, Serialize};

use bonded_core::{CargoItemId, DomainResult, Measure, ShipmentId, WarehouseId};

use crate::ledger::LedgerState;
use crate::stock::CargoItem;

/// Movement totals for one cargo item.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemBalance {
    pub received: Measure,
    pub released: Measure,
    pub transferred_out: Measure,
    pub transferred_in: Measure,
    pub available: Measure,
}

fn released_of(state: &LedgerState, item_id: CargoItemId) -> Measure {
    state.release_lines_for(item_id).map(|l| l.amount()).sum()
}

fn balance_of(state: &LedgerState, item: &CargoItem) -> ItemBalance {
    let released = released_of(state, item.id);
    // An item-level transfer is both an outbound and an inbound movement of
    // the same item, so it never changes the item's overall availability.
    let moved: Measure = state.transfers_for(item.id).iter().map(|t| t.amount).sum();
    ItemBalance {
        received: item.received,
        released,
        transferred_out: moved,
        transferred_in: moved,
        available: item.received - released - moved + moved,
    }
}

/// `available = received - released - transferred out + transferred in`.
pub fn item_balance(state: &LedgerState, item_id: CargoItemId) -> DomainResult<ItemBalance> {
    let item = state.require_item(item_id)?;
    Ok(balance_of(state, item))
}

/// Residual of one item attributed to one warehouse.
///
/// Releases always draw from the receiving warehouse; transfers are replayed
/// in commit order, each moving stock out of `from` and into `to`.
pub fn item_balance_in(
    state: &LedgerState,
    item_id: CargoItemId,
    warehouse_id: WarehouseId,
) -> DomainResult<Measure> {
    let item = state.require_item(item_id)?;
    state.require_warehouse(warehouse_id)?;
    Ok(residual_in(state, item, warehouse_id))
}

fn residual_in(state: &LedgerState, item: &CargoItem, warehouse_id: WarehouseId) -> Measure {
    let mut residual = if item.warehouse_id == warehouse_id {
        item.received - released_of(state, item.id)
    } else {
        Measure::ZERO
    };
    for transfer in state.transfers_for(item.id) {
        if transfer.from == warehouse_id {
            residual -= transfer.amount;
        }
        if transfer.to == warehouse_id {
            residual += transfer.amount;
        }
    }
    residual
}

/// Stock currently stored in a warehouse, across all items.
pub fn warehouse_usage(state: &LedgerState, warehouse_id: WarehouseId) -> Measure {
    let stored: Measure = state
        .items()
        .filter(|i| i.warehouse_id == warehouse_id)
        .map(|i| i.received - released_of(state, i.id))
        .sum();
    let mut used = stored;
    for transfer in state.transfers() {
        if transfer.from == warehouse_id {
            used -= transfer.amount;
        }
        if transfer.to == warehouse_id {
            used += transfer.amount;
        }
    }
    used
}

/// Warehouse usage against its declared capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utilization {
    pub warehouse_id: WarehouseId,
    pub code: String,
    pub name: String,
    pub used: Measure,
    pub capacity: Measure,
}

impl Utilization {
    /// Capacity left before the warehouse is full (may be negative within tolerance).
    pub fn headroom(&self) -> Measure {
        self.capacity - self.used
    }

    /// Percentage of quantity capacity in use; 0 for a zero-capacity warehouse.
    pub fn qty_percent(&self) -> f64 {
        if self.capacity.qty > 0.0 {
            self.used.qty / self.capacity.qty * 100.0
        } else {
            0.0
        }
    }

    pub fn weight_percent(&self) -> f64 {
        if self.capacity.weight_kg > 0.0 {
            self.used.weight_kg / self.capacity.weight_kg * 100.0
        } else {
            0.0
        }
    }
}

pub fn utilization(state: &LedgerState, warehouse_id: WarehouseId) -> DomainResult<Utilization> {
    let warehouse = state.require_warehouse(warehouse_id)?;
    Ok(Utilization {
        warehouse_id,
        code: warehouse.code.clone(),
        name: warehouse.name.clone(),
        used: warehouse_usage(state, warehouse_id),
        capacity: warehouse.capacity,
    })
}

/// Utilization of every warehouse, ordered by code.
pub fn utilization_all(state: &LedgerState) -> Vec<Utilization> {
    state
        .warehouses()
        .into_iter()
        .map(|w| Utilization {
            warehouse_id: w.id,
            code: w.code.clone(),
            name: w.name.clone(),
            used: warehouse_usage(state, w.id),
            capacity: w.capacity,
        })
        .collect()
}

/// True when no item of the shipment has quantity left (within `tolerance`).
pub fn shipment_depleted(
    state: &LedgerState,
    shipment_id: ShipmentId,
    tolerance: f64,
) -> bool {
    state
        .items_of(shipment_id)
        .into_iter()
        .all(|item| balance_of(state, item).available.is_depleted(tolerance))
}


#[cfg(test)]
mod tests {
    use super::fixtures::{History, date};
    use super::*;
    use crate::stock::ReleaseLine;
    use proptest::prelude::*;

    #[test]
    fn release_reduces_available_and_origin_usage() {
        let mut h = History::default();
        let wh = h.warehouse("WH-A", 1000.0, 5000.0);
        let s = h.shipment("BL-1", date(2024, 3, 1));
        let item = h.item(s, wh, "8471", 900.0, 4000.0, 9000.0);
        let before = h.state();
        let line = ReleaseLine::priced(before.require_item(item).unwrap(), 300.0, 2);
        h.release(s, vec![line]);

        let state = h.state();
        let balance = item_balance(&state, item).unwrap();
        assert_eq!(balance.available.qty, 600.0);
        assert!((balance.available.weight_kg - 2666.67).abs() < 1e-9);
        assert_eq!(warehouse_usage(&state, wh).qty, 600.0);
        assert!(!shipment_depleted(&state, s, 1e-4));
    }

    #[test]
    fn transfers_move_residual_between_warehouses() {
        let mut h = History::default();
        let x = h.warehouse("WH-X", 1000.0, 5000.0);
        let y = h.warehouse("WH-Y", 1000.0, 5000.0);
        let s = h.shipment("BL-2", date(2024, 3, 2));
        let item = h.item(s, x, "0901", 500.0, 1000.0, 2500.0);
        h.transfer(item, x, y, 100.0, 200.0);
        h.transfer(item, y, x, 40.0, 80.0);

        let state = h.state();
        assert_eq!(item_balance_in(&state, item, x).unwrap(), Measure::new(440.0, 880.0));
        assert_eq!(item_balance_in(&state, item, y).unwrap(), Measure::new(60.0, 120.0));
        assert_eq!(warehouse_usage(&state, y), Measure::new(60.0, 120.0));

        let balance = item_balance(&state, item).unwrap();
        assert_eq!(balance.available, Measure::new(500.0, 1000.0));
        assert_eq!(balance.transferred_out, Measure::new(140.0, 280.0));
        assert_eq!(balance.transferred_in, balance.transferred_out);
    }

    #[test]
    fn utilization_lists_warehouses_by_code() {
        let mut h = History::default();
        h.warehouse("WH-B", 10.0, 10.0);
        let a = h.warehouse("WH-A", 0.0, 0.0);
        let state = h.state();
        let all = utilization_all(&state);
        assert_eq!(all[0].code, "WH-A");
        assert_eq!(all[0].qty_percent(), 0.0);
        assert_eq!(utilization(&state, a).unwrap().headroom(), Measure::ZERO);
        assert!(utilization(&state, WarehouseId::new()).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: transfers only move stock around; per-warehouse
        /// residuals and usage always add up to received minus released.
        #[test]
        fn transfers_conserve_stock(
            released in 0.0..100.0f64,
            moves in prop::collection::vec((0..3usize, 0..3usize, 0.0..50.0f64), 0..12),
        ) {
            let mut h = History::default();
            let warehouses = [
                h.warehouse("WH-A", 1e6, 1e6),
                h.warehouse("WH-B", 1e6, 1e6),
                h.warehouse("WH-C", 1e6, 1e6),
            ];
            let s = h.shipment("BL-P", date(2024, 4, 1));
            let item = h.item(s, warehouses[0], "8471", 100.0, 100.0, 100.0);
            let line = ReleaseLine::priced(h.state().require_item(item).unwrap(), released, 2);
            h.release(s, vec![line]);
            for (from, to, qty) in moves {
                if from != to {
                    h.transfer(item, warehouses[from], warehouses[to], qty, qty);
                }
            }

            let state = h.state();
            let available = item_balance(&state, item).unwrap().available;
            let residuals: Measure = warehouses
                .iter()
                .map(|w| item_balance_in(&state, item, *w).unwrap())
                .sum();
            let usage: Measure = warehouses.iter().map(|w| warehouse_usage(&state, *w)).sum();
            prop_assert!(residuals.approx_eq(&available, 1e-6));
            prop_assert!(usage.approx_eq(&available, 1e-6));
            prop_assert!((available.qty - (100.0 - released)).abs() < 1e-9);
        }
    }
}

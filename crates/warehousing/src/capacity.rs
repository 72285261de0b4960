//! Capacity Guard: admission control for movements into a warehouse.

use bonded_core::{DomainError, DomainResult, Measure, WarehouseId};

use crate::balance::{utilization, utilization_all, Utilization};
use crate::ledger::LedgerState;

/// Absolute tolerance absorbing rounding from per-unit allocation.
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityGuard {
    tolerance: f64,
}

impl Default for CapacityGuard {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl CapacityGuard {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// True iff adding `delta` to the warehouse keeps it within capacity.
    ///
    /// Always evaluated against current utilization; nothing is reserved.
    pub fn can_admit(
        &self,
        state: &LedgerState,
        warehouse_id: WarehouseId,
        delta: Measure,
    ) -> DomainResult<bool> {
        let current = utilization(state, warehouse_id)?;
        Ok(self.admits(&current, delta))
    }

    pub fn admits(&self, current: &Utilization, delta: Measure) -> bool {
        (current.used + delta).fits_within(&current.capacity, self.tolerance)
    }

    /// Like [`CapacityGuard::can_admit`], but reports the overflow as an error.
    pub fn ensure_admits(
        &self,
        state: &LedgerState,
        warehouse_id: WarehouseId,
        delta: Measure,
    ) -> DomainResult<()> {
        let current = utilization(state, warehouse_id)?;
        if self.admits(&current, delta) {
            return Ok(());
        }
        let free = current.headroom();
        Err(DomainError::capacity(format!(
            "warehouse {} has room for {:.2} qty / {:.2} kg, requested {:.2} qty / {:.2} kg",
            current.code, free.qty, free.weight_kg, delta.qty, delta.weight_kg
        )))
    }

    /// Warehouses currently over capacity. Empty whenever the ledger is consistent.
    pub fn violations(&self, state: &LedgerState) -> Vec<Utilization> {
        utilization_all(state)
            .into_iter()
            .filter(|u| !u.used.fits_within(&u.capacity, self.tolerance))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::fixtures::{History, date};

    #[test]
    fn rejects_receipt_that_overflows_quantity() {
        let mut h = History::default();
        let wh = h.warehouse("WH-A", 1000.0, 5000.0);
        let s = h.shipment("BL-1", date(2024, 3, 1));
        h.item(s, wh, "8471", 900.0, 4000.0, 9000.0);
        let state = h.state();
        let guard = CapacityGuard::default();

        assert!(!guard.can_admit(&state, wh, Measure::new(200.0, 0.0)).unwrap());
        assert!(guard.can_admit(&state, wh, Measure::new(100.0, 1000.0)).unwrap());
        let err = guard
            .ensure_admits(&state, wh, Measure::new(200.0, 0.0))
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::capacity(
                "warehouse WH-A has room for 100.00 qty / 1000.00 kg, requested 200.00 qty / 0.00 kg"
            )
        );
    }

    #[test]
    fn tolerance_absorbs_rounding_noise() {
        let mut h = History::default();
        let wh = h.warehouse("WH-A", 10.0, 10.0);
        let state = h.state();
        let guard = CapacityGuard::default();
        assert!(guard.can_admit(&state, wh, Measure::new(10.00005, 10.0)).unwrap());
        assert!(!guard.can_admit(&state, wh, Measure::new(10.001, 10.0)).unwrap());
        assert!(guard.violations(&state).is_empty());
    }

    #[test]
    fn unknown_warehouse_is_not_found() {
        let state = History::default().state();
        let err = CapacityGuard::default()
            .can_admit(&state, WarehouseId::new(), Measure::ZERO)
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("warehouse"));
    }
}

//! Bonded warehousing domain (event-sourced).
//!
//! This crate contains the business rules of the stock ledger: warehouses,
//! shipments and their lifecycle, cargo items, releases and transfers, and the
//! balances and capacity checks derived from them. Everything here is
//! deterministic domain logic (no IO, no storage).

pub mod balance;
pub mod capacity;
pub mod ledger;
pub mod reports;
pub mod shipment;
pub mod stock;
pub mod validation;
pub mod warehouse;

pub use balance::{
    ItemBalance, Utilization, item_balance, item_balance_in, shipment_depleted, utilization,
    utilization_all, warehouse_usage,
};
pub use capacity::{CapacityGuard, DEFAULT_TOLERANCE};
pub use ledger::{LedgerEvent, LedgerState};
pub use reports::{
    AgingRow, CodeValue, DailyArrivals, Dashboard, HoldRow, ItemView, Kpis, ReleaseNote,
    ReleaseNoteLine, SearchField, ShipmentQuery, ShipmentSort, ShipmentSummary, ShipmentView,
};
pub use shipment::{
    Hold, InspectionOutcome, InspectionRecord, LifecycleCommand, RecordOutcome, Shipment,
    ShipmentEvent, ShipmentSpec, ShipmentStatus,
};
pub use stock::{CargoItem, ReceiptSpec, Release, ReleaseLine, StockEvent, Transfer, Unit};
pub use warehouse::{Warehouse, WarehouseEvent, WarehouseSpec};

//! Cargo items and the quantity movements recorded against them.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bonded_core::{
    round_to, CargoItemId, DomainError, DomainResult, Entity, Measure, ReleaseId, ShipmentId,
    TransferId, WarehouseId,
};

use crate::validation::{require_amount, require_text};

pub const CLASSIFICATION_MAX_LEN: usize = 40;
pub const DESCRIPTION_MAX_LEN: usize = 120;
pub const RELEASE_NO_MAX_LEN: usize = 50;
pub const OFFICER_MAX_LEN: usize = 120;
/// Smallest quantity accepted for a receipt or transfer, and smallest transfer weight.
pub const MIN_MOVEMENT: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Pcs,
    Kg,
}

impl FromStr for Unit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pcs" => Ok(Unit::Pcs),
            "kg" => Ok(Unit::Kg),
            _ => Err(DomainError::validation("Unit must be one of: pcs, kg")),
        }
    }
}

/// One received line of goods within a shipment.
///
/// Received figures never change; only derived balances do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CargoItem {
    pub id: CargoItemId,
    pub shipment_id: ShipmentId,
    pub classification_code: String,
    pub description: String,
    pub unit: Unit,
    pub received: Measure,
    pub declared_value: f64,
    /// Warehouse the item was received into.
    pub warehouse_id: WarehouseId,
    pub received_at: DateTime<Utc>,
}

impl CargoItem {
    pub fn unit_weight(&self) -> f64 {
        if self.received.qty > 0.0 {
            self.received.weight_kg / self.received.qty
        } else {
            0.0
        }
    }

    pub fn unit_value(&self) -> f64 {
        if self.received.qty > 0.0 {
            self.declared_value / self.received.qty
        } else {
            0.0
        }
    }
}

impl Entity for CargoItem {
    type Id = CargoItemId;
    const KIND: &'static str = "cargo item";

    fn id(&self) -> &CargoItemId {
        &self.id
    }
}

/// Validated receipt input.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptSpec {
    pub classification_code: String,
    pub description: String,
    pub unit: Unit,
    pub received: Measure,
    pub declared_value: f64,
}

impl ReceiptSpec {
    pub fn new(
        classification_code: &str,
        description: &str,
        unit: Unit,
        qty: f64,
        weight_kg: f64,
        declared_value: f64,
    ) -> DomainResult<Self> {
        Ok(Self {
            classification_code: require_text(
                classification_code,
                "HS Code",
                CLASSIFICATION_MAX_LEN,
            )?,
            description: require_text(description, "Item Name", DESCRIPTION_MAX_LEN)?,
            unit,
            received: Measure::new(
                require_amount(qty, "Quantity", MIN_MOVEMENT)?,
                require_amount(weight_kg, "Weight", 0.0)?,
            ),
            declared_value: require_amount(declared_value, "Declared Value", 0.0)?,
        })
    }
}

/// One item's share of a release, priced at commit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseLine {
    pub item_id: CargoItemId,
    pub qty: f64,
    pub weight_kg: f64,
    pub value: f64,
}

impl ReleaseLine {
    /// Allocate weight and value proportionally to `qty` using the item's
    /// received ratios, rounded to `decimals` before the line is persisted.
    pub fn priced(item: &CargoItem, qty: f64, decimals: u32) -> Self {
        Self {
            item_id: item.id,
            qty,
            weight_kg: round_to(qty * item.unit_weight(), decimals),
            value: round_to(qty * item.unit_value(), decimals),
        }
    }

    pub fn amount(&self) -> Measure {
        Measure::new(self.qty, self.weight_kg)
    }
}

/// A customs release: an atomic withdrawal of one or more item quantities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: ReleaseId,
    pub shipment_id: ShipmentId,
    pub release_no: String,
    pub officer: String,
    pub released_at: DateTime<Utc>,
    pub lines: Vec<ReleaseLine>,
    /// Ledger position of the commit.
    pub sequence: u64,
}

impl Release {
    pub fn total(&self) -> Measure {
        self.lines.iter().map(ReleaseLine::amount).sum()
    }

    pub fn total_value(&self) -> f64 {
        self.lines.iter().map(|l| l.value).sum()
    }
}

impl Entity for Release {
    type Id = ReleaseId;
    const KIND: &'static str = "release";

    fn id(&self) -> &ReleaseId {
        &self.id
    }
}

/// Movement of part of an item's stock between two warehouses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub item_id: CargoItemId,
    pub from: WarehouseId,
    pub to: WarehouseId,
    pub amount: Measure,
    pub transferred_at: DateTime<Utc>,
    /// Ledger position of the commit.
    pub sequence: u64,
}

impl Entity for Transfer {
    type Id = TransferId;
    const KIND: &'static str = "transfer";

    fn id(&self) -> &TransferId {
        &self.id
    }
}

/// Event: ItemReceived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemReceived {
    pub item_id: CargoItemId,
    pub shipment_id: ShipmentId,
    pub classification_code: String,
    pub description: String,
    pub unit: Unit,
    pub received: Measure,
    pub declared_value: f64,
    pub warehouse_id: WarehouseId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemRemoved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRemoved {
    pub item_id: CargoItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReleaseCommitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseCommitted {
    pub release_id: ReleaseId,
    pub shipment_id: ShipmentId,
    pub release_no: String,
    pub officer: String,
    pub lines: Vec<ReleaseLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReleaseReversed (compensates a ReleaseCommitted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseReversed {
    pub release_id: ReleaseId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TransferCommitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferCommitted {
    pub transfer_id: TransferId,
    pub item_id: CargoItemId,
    pub from: WarehouseId,
    pub to: WarehouseId,
    pub amount: Measure,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TransferReversed (compensates a TransferCommitted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferReversed {
    pub transfer_id: TransferId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StockEvent {
    ItemReceived(ItemReceived),
    ItemRemoved(ItemRemoved),
    ReleaseCommitted(ReleaseCommitted),
    ReleaseReversed(ReleaseReversed),
    TransferCommitted(TransferCommitted),
    TransferReversed(TransferReversed),
}

impl StockEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            StockEvent::ItemReceived(_) => "stock.item.received",
            StockEvent::ItemRemoved(_) => "stock.item.removed",
            StockEvent::ReleaseCommitted(_) => "stock.release.committed",
            StockEvent::ReleaseReversed(_) => "stock.release.reversed",
            StockEvent::TransferCommitted(_) => "stock.transfer.committed",
            StockEvent::TransferReversed(_) => "stock.transfer.reversed",
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            StockEvent::ItemReceived(e) => e.occurred_at,
            StockEvent::ItemRemoved(e) => e.occurred_at,
            StockEvent::ReleaseCommitted(e) => e.occurred_at,
            StockEvent::ReleaseReversed(e) => e.occurred_at,
            StockEvent::TransferCommitted(e) => e.occurred_at,
            StockEvent::TransferReversed(e) => e.occurred_at,
        }
    }
}

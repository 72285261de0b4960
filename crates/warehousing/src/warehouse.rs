//! Bonded warehouses: master data and declared capacity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bonded_core::{DomainResult, Entity, Measure, WarehouseId};

use crate::validation::{require_amount, require_text};

pub const CODE_MAX_LEN: usize = 30;
pub const NAME_MAX_LEN: usize = 120;

/// A bonded warehouse with a declared quantity/weight capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub code: String,
    pub name: String,
    pub capacity: Measure,
    pub registered_at: DateTime<Utc>,
}

impl Entity for Warehouse {
    type Id = WarehouseId;
    const KIND: &'static str = "warehouse";

    fn id(&self) -> &WarehouseId {
        &self.id
    }
}

/// Validated warehouse master data (used for both registration and update).
#[derive(Debug, Clone, PartialEq)]
pub struct WarehouseSpec {
    pub code: String,
    pub name: String,
    pub capacity: Measure,
}

impl WarehouseSpec {
    pub fn new(
        code: &str,
        name: &str,
        capacity_qty: f64,
        capacity_weight_kg: f64,
    ) -> DomainResult<Self> {
        Ok(Self {
            code: require_text(code, "Code", CODE_MAX_LEN)?,
            name: require_text(name, "Name", NAME_MAX_LEN)?,
            capacity: Measure::new(
                require_amount(capacity_qty, "Capacity Qty", 0.0)?,
                require_amount(capacity_weight_kg, "Capacity Weight", 0.0)?,
            ),
        })
    }
}

/// Event: WarehouseRegistered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseRegistered {
    pub warehouse_id: WarehouseId,
    pub code: String,
    pub name: String,
    pub capacity: Measure,
    pub occurred_at: DateTime<Utc>,
}

/// Event: WarehouseUpdated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseUpdated {
    pub warehouse_id: WarehouseId,
    pub code: String,
    pub name: String,
    pub capacity: Measure,
    pub occurred_at: DateTime<Utc>,
}

/// Event: WarehouseRemoved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseRemoved {
    pub warehouse_id: WarehouseId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WarehouseEvent {
    Registered(WarehouseRegistered),
    Updated(WarehouseUpdated),
    Removed(WarehouseRemoved),
}

impl WarehouseEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            WarehouseEvent::Registered(_) => "warehouse.registered",
            WarehouseEvent::Updated(_) => "warehouse.updated",
            WarehouseEvent::Removed(_) => "warehouse.removed",
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            WarehouseEvent::Registered(e) => e.occurred_at,
            WarehouseEvent::Updated(e) => e.occurred_at,
            WarehouseEvent::Removed(e) => e.occurred_at,
        }
    }
}

//! Per-session stack of reversible ledger actions.

use serde::{Deserialize, Serialize};

use bonded_core::{CargoItemId, Measure, ReleaseId, ShipmentId, TransferId, WarehouseId};
use bonded_warehousing::ReleaseLine;

/// A committed action that `undo` can reverse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UndoAction {
    Release {
        release_id: ReleaseId,
        release_no: String,
        shipment_id: ShipmentId,
        lines: Vec<ReleaseLine>,
    },
    Transfer {
        transfer_id: TransferId,
        item_id: CargoItemId,
        from: WarehouseId,
        to: WarehouseId,
        amount: Measure,
    },
}

impl UndoAction {
    /// Short label, e.g. `RELEASE:REL-7`.
    pub fn label(&self) -> String {
        match self {
            UndoAction::Release { release_no, .. } => format!("RELEASE:{release_no}"),
            UndoAction::Transfer { transfer_id, .. } => format!("TRANSFER:{transfer_id}"),
        }
    }
}

/// Most-recent-first stack. Entries are consumed on successful reversal and
/// never replayed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UndoLog {
    stack: Vec<UndoAction>,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: UndoAction) {
        self.stack.push(action);
    }

    pub fn pop(&mut self) -> Option<UndoAction> {
        self.stack.pop()
    }

    pub fn peek(&self) -> Option<&UndoAction> {
        self.stack.last()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &UndoAction> {
        self.stack.iter().rev()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }
}

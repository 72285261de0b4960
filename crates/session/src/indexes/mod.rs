//! Analytics indexes: derived, advisory views over the ledger.
//!
//! All of them are rebuilt in full from a [`LedgerState`]; rebuilding twice
//! from the same state yields equal indexes.

mod graph;
mod reference;
mod value_range;

pub use graph::{TransferGraph, Traversal};
pub use reference::ReferenceIndex;
pub use value_range::ValueRangeIndex;

use bonded_warehousing::{LedgerState, reports};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsIndexes {
    pub reference: ReferenceIndex,
    pub values: ValueRangeIndex,
    /// Keyed by total received quantity.
    pub quantities: ValueRangeIndex,
    pub graph: TransferGraph,
}

impl AnalyticsIndexes {
    pub fn build(state: &LedgerState) -> Self {
        let mut indexes = Self::default();
        indexes.rebuild(state);
        indexes
    }

    pub fn rebuild(&mut self, state: &LedgerState) {
        let summaries = reports::shipment_summaries(state);
        self.reference = ReferenceIndex::from_summaries(&summaries);
        self.values = ValueRangeIndex::from_summaries(&summaries);
        self.quantities = ValueRangeIndex::from_keyed(&summaries, |s| s.total_qty);
        self.graph = TransferGraph::from_ledger(state);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

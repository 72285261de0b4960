use std::collections::HashMap;

use bonded_warehousing::ShipmentSummary;

/// Exact-match lookup of shipment summaries by reference number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceIndex {
    by_reference: HashMap<String, ShipmentSummary>,
}

impl ReferenceIndex {
    pub fn from_summaries(summaries: &[ShipmentSummary]) -> Self {
        let mut index = Self::default();
        for summary in summaries {
            index.insert(summary.clone());
        }
        index
    }

    pub fn insert(&mut self, summary: ShipmentSummary) {
        self.by_reference
            .insert(summary.reference_no.clone(), summary);
    }

    /// Surrounding whitespace in `reference` is ignored.
    pub fn get(&self, reference: &str) -> Option<&ShipmentSummary> {
        self.by_reference.get(reference.trim())
    }

    /// Sorted, for display.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<_> = self.by_reference.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.by_reference.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_reference.is_empty()
    }
}

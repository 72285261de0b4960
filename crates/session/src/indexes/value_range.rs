use std::cmp::Ordering;
use std::collections::BTreeMap;

use bonded_core::ShipmentId;
use bonded_warehousing::ShipmentSummary;

/// Total order over `f64` so values can key an ordered map.
#[derive(Debug, Clone, Copy)]
struct ValueKey(f64);

impl ValueKey {
    fn new(value: f64) -> Self {
        // -0.0 and 0.0 share a bucket.
        Self(if value == 0.0 { 0.0 } else { value })
    }
}

impl PartialEq for ValueKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ValueKey {}

impl PartialOrd for ValueKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ValueKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Shipments ordered by a numeric aggregate (declared value unless built
/// with [`ValueRangeIndex::from_keyed`]). Equal values share one bucket,
/// holding ids in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueRangeIndex {
    buckets: BTreeMap<ValueKey, Vec<ShipmentId>>,
}

impl ValueRangeIndex {
    pub fn from_summaries(summaries: &[ShipmentSummary]) -> Self {
        Self::from_keyed(summaries, |s| s.total_value)
    }

    pub fn from_keyed(
        summaries: &[ShipmentSummary],
        key: impl Fn(&ShipmentSummary) -> f64,
    ) -> Self {
        let mut index = Self::default();
        for summary in summaries {
            index.insert(key(summary), summary.shipment_id);
        }
        index
    }

    pub fn insert(&mut self, value: f64, shipment_id: ShipmentId) {
        self.buckets
            .entry(ValueKey::new(value))
            .or_default()
            .push(shipment_id);
    }

    /// Shipments whose value is exactly `value`.
    pub fn search(&self, value: f64) -> &[ShipmentId] {
        self.buckets
            .get(&ValueKey::new(value))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// `(value, shipment)` pairs with `min <= value <= max`, ascending by value.
    pub fn range(&self, min: f64, max: f64) -> Vec<(f64, ShipmentId)> {
        if min.is_nan() || max.is_nan() || min > max {
            return Vec::new();
        }
        self.buckets
            .range(ValueKey::new(min)..=ValueKey::new(max))
            .flat_map(|(key, ids)| ids.iter().map(move |id| (key.0, *id)))
            .collect()
    }

    /// Number of distinct value buckets.
    pub fn node_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_inclusive_and_ordered() {
        let (a, b, c, d) = (
            ShipmentId::new(),
            ShipmentId::new(),
            ShipmentId::new(),
            ShipmentId::new(),
        );
        let mut index = ValueRangeIndex::default();
        index.insert(500.0, a);
        index.insert(100.0, b);
        index.insert(500.0, c);
        index.insert(900.0, d);

        assert_eq!(index.node_count(), 3);
        assert_eq!(index.len(), 4);
        assert_eq!(index.search(500.0), &[a, c]);
        assert_eq!(
            index.range(100.0, 500.0),
            vec![(100.0, b), (500.0, a), (500.0, c)]
        );
        assert!(index.range(901.0, 10_000.0).is_empty());
        assert!(index.range(10.0, 1.0).is_empty());
    }

    #[test]
    fn negative_zero_shares_the_zero_bucket() {
        let id = ShipmentId::new();
        let mut index = ValueRangeIndex::default();
        index.insert(-0.0, id);
        assert_eq!(index.range(0.0, 1.0), vec![(0.0, id)]);
    }
}

//! FIFO of shipments awaiting inspection.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use bonded_core::ShipmentId;

/// Strict FIFO, duplicate-suppressed at enqueue time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionQueue {
    entries: VecDeque<ShipmentId>,
}

impl InspectionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` at the tail. Returns `false` (and leaves the queue
    /// untouched) when the shipment is already queued.
    pub fn enqueue(&mut self, id: ShipmentId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.entries.push_back(id);
        true
    }

    pub fn dequeue(&mut self) -> Option<ShipmentId> {
        self.entries.pop_front()
    }

    pub fn peek(&self) -> Option<ShipmentId> {
        self.entries.front().copied()
    }

    pub fn contains(&self, id: ShipmentId) -> bool {
        self.entries.contains(&id)
    }

    /// Drop a shipment that no longer exists.
    pub fn remove(&mut self, id: ShipmentId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|queued| *queued != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Head first.
    pub fn iter(&self) -> impl Iterator<Item = &ShipmentId> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn dequeue_on_empty_returns_none() {
        let mut queue = InspectionQueue::new();
        assert_eq!(queue.dequeue(), None);
        assert_eq!(queue.peek(), None);
    }

    #[test]
    fn remove_drops_only_that_shipment() {
        let mut queue = InspectionQueue::new();
        let a = ShipmentId::new();
        let b = ShipmentId::new();
        queue.enqueue(a);
        queue.enqueue(b);
        assert!(queue.remove(a));
        assert!(!queue.remove(a));
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![b]);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: distinct enqueues come back out in the same order.
        #[test]
        fn dequeue_order_matches_enqueue_order(n in 0usize..40) {
            let ids: Vec<ShipmentId> = (0..n).map(|_| ShipmentId::new()).collect();
            let mut queue = InspectionQueue::new();
            for id in &ids {
                prop_assert!(queue.enqueue(*id));
            }
            let drained: Vec<_> = std::iter::from_fn(|| queue.dequeue()).collect();
            prop_assert_eq!(drained, ids);
            prop_assert!(queue.is_empty());
        }

        /// Property: re-enqueueing a queued shipment changes neither length nor order.
        #[test]
        fn duplicate_enqueue_is_idempotent(n in 1usize..30, picks in prop::collection::vec(any::<prop::sample::Index>(), 1..20)) {
            let ids: Vec<ShipmentId> = (0..n).map(|_| ShipmentId::new()).collect();
            let mut queue = InspectionQueue::new();
            for id in &ids {
                queue.enqueue(*id);
            }
            let snapshot = queue.clone();
            for pick in picks {
                prop_assert!(!queue.enqueue(*pick.get(&ids)));
            }
            prop_assert_eq!(queue, snapshot);
        }
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use bonded_core::ShipmentId;
use bonded_warehousing::{LedgerState, ShipmentSummary};

use crate::activity::ActivityLog;
use crate::indexes::AnalyticsIndexes;
use crate::queue::InspectionQueue;
use crate::undo::{UndoAction, UndoLog};

/// Activity entries shown in a [`SessionOverview`].
pub const OVERVIEW_ACTIVITY_ROWS: usize = 30;

/// Snapshot of the session structures as they currently stand. Indexes are
/// reported as last rebuilt, not refreshed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionOverview {
    /// Newest first.
    pub recent_activity: Vec<String>,
    pub activity_len: usize,
    pub unread_notifications: usize,
    /// What `undo` reverses next.
    pub next_undo: Option<String>,
    /// Most recent first.
    pub undo_labels: Vec<String>,
    pub queued: Vec<ShipmentId>,
    pub reference_keys: Vec<String>,
    pub value_nodes: usize,
    pub quantity_nodes: usize,
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub graph_has_cycle: bool,
}

/// Everything one operator accumulates between sign-in and sign-out.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub queue: InspectionQueue,
    pub undo: UndoLog,
    pub indexes: AnalyticsIndexes,
    pub activity: ActivityLog,
}

impl Session {
    pub fn new(notification_limit: usize) -> Self {
        Self {
            activity: ActivityLog::new(notification_limit),
            ..Self::default()
        }
    }

    /// Record a successful mutation in the activity log.
    pub fn log(&mut self, at: DateTime<Utc>, message: impl Into<String>) {
        self.activity.record(at, message);
    }

    /// Rebuild the reference index and look a shipment up by reference number.
    pub fn quick_find(&mut self, state: &LedgerState, reference: &str) -> Option<&ShipmentSummary> {
        self.indexes.rebuild(state);
        self.indexes.reference.get(reference)
    }

    pub fn overview(&self) -> SessionOverview {
        let graph = &self.indexes.graph;
        SessionOverview {
            recent_activity: self
                .activity
                .recent(OVERVIEW_ACTIVITY_ROWS)
                .into_iter()
                .map(|e| e.message.clone())
                .collect(),
            activity_len: self.activity.entries().len(),
            unread_notifications: self.activity.unread_count(),
            next_undo: self.undo.peek().map(UndoAction::label),
            undo_labels: self.undo.iter().map(UndoAction::label).collect(),
            queued: self.queue.iter().copied().collect(),
            reference_keys: self
                .indexes
                .reference
                .keys()
                .into_iter()
                .map(str::to_string)
                .collect(),
            value_nodes: self.indexes.values.node_count(),
            quantity_nodes: self.indexes.quantities.node_count(),
            graph_nodes: graph.node_count(),
            graph_edges: graph.edge_count(),
            graph_has_cycle: graph.has_cycle(),
        }
    }

    /// Empty the queue, undo log, indexes and activity entries.
    ///
    /// Notifications survive so the operator still sees the reset notice.
    pub fn reset(&mut self, at: DateTime<Utc>) {
        self.queue.clear();
        self.undo.clear();
        self.indexes.clear();
        self.activity.clear_entries();
        info!("session data structures reset");
        self.log(at, "Session data structures reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bonded_core::{Measure, TransferId, WarehouseId};

    #[test]
    fn reset_empties_session_structures() {
        let mut session = Session::new(5);
        session.queue.enqueue(ShipmentId::new());
        session.log(Utc::now(), "Registered shipment BL-1");
        session.reset(Utc::now());

        assert!(session.queue.is_empty());
        assert!(session.undo.is_empty());
        assert!(session.indexes.reference.is_empty());
        assert_eq!(session.activity.entries().len(), 1);
        assert_eq!(
            session.activity.notifications().next().map(|n| n.message.as_str()),
            Some("Session data structures reset")
        );
    }

    #[test]
    fn quick_find_on_empty_ledger_misses() {
        let mut session = Session::default();
        assert!(session.quick_find(&LedgerState::new(), "BL-1").is_none());
    }

    #[test]
    fn overview_lists_undo_labels_newest_first() {
        let mut session = Session::new(5);
        let first = ShipmentId::new();
        session.queue.enqueue(first);
        session.log(Utc::now(), "Registered shipment BL-1");
        session.log(Utc::now(), "Released REL-1");
        session.undo.push(UndoAction::Release {
            release_id: Default::default(),
            release_no: "REL-1".to_string(),
            shipment_id: first,
            lines: Vec::new(),
        });
        let transfer_id = TransferId::new();
        session.undo.push(UndoAction::Transfer {
            transfer_id,
            item_id: Default::default(),
            from: WarehouseId::new(),
            to: WarehouseId::new(),
            amount: Measure::new(1.0, 1.0),
        });

        let overview = session.overview();
        assert_eq!(
            overview.undo_labels,
            vec![format!("TRANSFER:{transfer_id}"), "RELEASE:REL-1".to_string()]
        );
        assert_eq!(overview.next_undo.as_ref(), overview.undo_labels.first());
        assert_eq!(overview.queued, vec![first]);
        assert_eq!(overview.recent_activity, ["Released REL-1", "Registered shipment BL-1"]);
        assert_eq!(overview.unread_notifications, 2);
        assert!(overview.reference_keys.is_empty());
        assert_eq!(overview.value_nodes, 0);
        assert!(!overview.graph_has_cycle);
    }
}

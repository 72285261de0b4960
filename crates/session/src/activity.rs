//! Activity log and capped notifications for one operator.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_NOTIFICATION_LIMIT: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

/// Append-only activity list plus a bounded, newest-first notification feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLog {
    entries: Vec<ActivityEntry>,
    notifications: VecDeque<Notification>,
    limit: usize,
    next_id: u64,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_LIMIT)
    }
}

impl ActivityLog {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            notifications: VecDeque::new(),
            limit,
            next_id: 1,
        }
    }

    /// Record a message in the log and raise a notification for it.
    pub fn record(&mut self, at: DateTime<Utc>, message: impl Into<String>) {
        let message = message.into();
        self.entries.push(ActivityEntry {
            at,
            message: message.clone(),
        });
        self.notify(at, message);
    }

    pub fn notify(&mut self, at: DateTime<Utc>, message: impl Into<String>) {
        self.notifications.push_front(Notification {
            id: self.next_id,
            message: message.into(),
            created_at: at,
            read: false,
        });
        self.next_id += 1;
        self.notifications.truncate(self.limit);
    }

    /// Oldest first.
    pub fn entries(&self) -> &[ActivityEntry] {
        &self.entries
    }

    /// The last `n` entries, newest first.
    pub fn recent(&self, n: usize) -> Vec<&ActivityEntry> {
        self.entries.iter().rev().take(n).collect()
    }

    /// Newest first.
    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    pub fn mark_all_read(&mut self) {
        for n in self.notifications.iter_mut() {
            n.read = true;
        }
    }

    pub fn clear_notifications(&mut self) {
        self.notifications.clear();
    }

    /// Drop the activity entries; notifications are kept.
    pub fn clear_entries(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifications_are_capped_newest_first() {
        let mut log = ActivityLog::new(3);
        let now = Utc::now();
        for i in 0..5 {
            log.record(now, format!("event {i}"));
        }
        let messages: Vec<_> = log.notifications().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, ["event 4", "event 3", "event 2"]);
        assert_eq!(log.entries().len(), 5);
        assert_eq!(log.recent(2)[0].message, "event 4");
    }

    #[test]
    fn unread_count_tracks_reads() {
        let mut log = ActivityLog::default();
        log.notify(Utc::now(), "hello");
        log.notify(Utc::now(), "again");
        assert_eq!(log.unread_count(), 2);
        log.mark_all_read();
        assert_eq!(log.unread_count(), 0);
        log.clear_notifications();
        assert_eq!(log.notifications().count(), 0);
    }
}

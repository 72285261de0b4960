use chrono::{DateTime, Utc};

/// A fact recorded in the stock ledger.
///
/// Ledger events are never edited or deleted. Undoing a release or transfer
/// appends a compensating event instead, so replaying the history in sequence
/// order always rebuilds the same state.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted name stored next to the payload, e.g. `stock.transfer.reversed`.
    fn event_type(&self) -> &'static str;

    /// Payload schema version; bumped when a variant's fields change shape.
    fn version(&self) -> u32;

    /// Business time of the movement, which may precede the commit.
    fn occurred_at(&self) -> DateTime<Utc>;
}

//! The ledger service: every operation the surrounding layer calls.
//!
//! ## Execution Flow
//!
//! ```text
//! operation
//!   ↓
//! 1. Catch up: apply events committed since the cached version
//!   ↓
//! 2. Decide: pure function of the current LedgerState (admission checks,
//!    lifecycle rules) producing new events
//!   ↓
//! 3. Append with ExpectedVersion::Exact(cached version)
//!   ↓
//! 4. Apply the committed events to the cached state
//! ```
//!
//! Steps 1-4 run while holding the state write lock, so the capacity check
//! and the append it guards are atomic relative to every other writer on
//! this handle. Writers on other handles sharing the same store are caught by
//! the store's version check and surface as [`LedgerError::Conflict`].

mod inspection;
mod master_data;
mod movements;
mod queries;
mod undo;

pub use movements::{ReleaseRequest, TransferRequest};
pub use undo::UndoOutcome;

use std::sync::{PoisonError, RwLock};

use uuid::Uuid;

use bonded_core::{DomainResult, ExpectedVersion};
use bonded_events::EventEnvelope;
use bonded_session::Session;
use bonded_warehousing::{CapacityGuard, LedgerEvent, LedgerState};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::event_store::{EventStore, EventStoreError, UncommittedEvent};

/// Events to append plus the value handed back to the caller.
type Decision<T> = (Vec<LedgerEvent>, T);

fn poisoned<T>(_: PoisonError<T>) -> LedgerError {
    LedgerError::Store(EventStoreError::Unavailable(
        "ledger state lock poisoned".to_string(),
    ))
}

/// Stock ledger backed by an [`EventStore`].
///
/// The cached [`LedgerState`] is a pure fold of the store's history and is
/// refreshed before every read and write, so it never serves a stale view.
#[derive(Debug)]
pub struct Ledger<S> {
    store: S,
    state: RwLock<LedgerState>,
    guard: CapacityGuard,
    config: LedgerConfig,
}

impl<S: EventStore> Ledger<S> {
    pub fn new(store: S) -> LedgerResult<Self> {
        Self::with_config(store, LedgerConfig::default())
    }

    /// Build a ledger and replay the store's existing history.
    pub fn with_config(store: S, config: LedgerConfig) -> LedgerResult<Self> {
        let ledger = Self {
            store,
            state: RwLock::new(LedgerState::new()),
            guard: CapacityGuard::new(config.capacity_tolerance),
            config,
        };
        ledger.refresh()?;
        Ok(ledger)
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn guard(&self) -> &CapacityGuard {
        &self.guard
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// A fresh, empty operator session.
    pub fn open_session(&self) -> Session {
        Session::new(self.config.notification_limit)
    }

    /// Sequence number of the last committed event.
    pub fn version(&self) -> LedgerResult<u64> {
        self.read(|state| Ok(state.version()))
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> LedgerResult<LedgerState> {
        self.read(|state| Ok(state.clone()))
    }

    /// Rebuild state from the full history, bypassing the cache.
    pub fn replay_from_scratch(&self) -> LedgerResult<LedgerState> {
        let mut state = LedgerState::new();
        Self::catch_up(&self.store, &mut state)?;
        Ok(state)
    }

    /// Run a query against the current state.
    pub fn read<T>(&self, query: impl FnOnce(&LedgerState) -> DomainResult<T>) -> LedgerResult<T> {
        self.refresh()?;
        let state = self.state.read().map_err(poisoned)?;
        Ok(query(&state)?)
    }

    fn refresh(&self) -> LedgerResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        Self::catch_up(&self.store, &mut state)
    }

    fn catch_up(store: &S, state: &mut LedgerState) -> LedgerResult<()> {
        let pending = store.load_after(state.version())?;
        if pending.is_empty() {
            return Ok(());
        }
        for stored in &pending {
            let envelope = stored.decode::<LedgerEvent>()?;
            state.apply_envelope(&envelope)?;
        }
        tracing::debug!(
            applied = pending.len(),
            version = state.version(),
            "ledger caught up with store"
        );
        Ok(())
    }

    /// Decide and commit one all-or-nothing change.
    fn transact<T>(
        &self,
        operation: &'static str,
        decide: impl FnOnce(&LedgerState) -> DomainResult<Decision<T>>,
    ) -> LedgerResult<T> {
        let mut state = self.state.write().map_err(poisoned)?;
        Self::catch_up(&self.store, &mut state)?;

        let expected = state.version();
        let (events, output) = decide(&state).map_err(|err| {
            tracing::warn!(operation, error = %err, "ledger operation rejected");
            LedgerError::from(err)
        })?;
        if events.is_empty() {
            return Ok(output);
        }

        let uncommitted = events
            .iter()
            .map(|event| UncommittedEvent::from_typed(Uuid::now_v7(), event))
            .collect::<Result<Vec<_>, _>>()?;
        let committed = self
            .store
            .append(uncommitted, ExpectedVersion::Exact(expected))
            .map_err(|err| {
                tracing::warn!(operation, error = %err, "ledger append failed");
                LedgerError::from(err)
            })?;

        for (stored, event) in committed.iter().zip(events) {
            let envelope = EventEnvelope::new(
                stored.event_id,
                stored.sequence_number,
                stored.event_type.clone(),
                stored.occurred_at,
                event,
            );
            state.apply_envelope(&envelope)?;
        }
        tracing::info!(
            operation,
            events = committed.len(),
            version = state.version(),
            "ledger transaction committed"
        );
        Ok(output)
    }
}

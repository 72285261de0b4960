//! Shipments and their inspection/release lifecycle.
//!
//! ```text
//! ARRIVED ──dequeue──▶ UNDER_INSPECTION ──PASS──▶ CLEARED ──full release──▶ RELEASED
//!                          ▲     │                  ▲  │
//!                   RECHECK│     │HOLD        undo  │  │partial release
//!                          │     ▼                  │  ▼
//!                          └── ON_HOLD            CLEARED
//! ```
//!
//! Status is only ever changed through [`Shipment::handle`]; the resulting
//! [`ShipmentEvent`]s are the sole way the ledger mutates it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use bonded_core::{Aggregate, AggregateRoot, DomainError, DomainResult, HoldId, ShipmentId};

use crate::validation::{optional_text, require_text};

pub const REFERENCE_MAX_LEN: usize = 40;
pub const VESSEL_MAX_LEN: usize = 80;
pub const ORIGIN_MAX_LEN: usize = 80;
pub const IMPORTER_MAX_LEN: usize = 120;
pub const NOTES_MAX_LEN: usize = 300;
pub const HOLD_FIELD_MAX_LEN: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Arrived,
    UnderInspection,
    OnHold,
    Cleared,
    Released,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Arrived => "ARRIVED",
            ShipmentStatus::UnderInspection => "UNDER_INSPECTION",
            ShipmentStatus::OnHold => "ON_HOLD",
            ShipmentStatus::Cleared => "CLEARED",
            ShipmentStatus::Released => "RELEASED",
        }
    }
}

impl core::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InspectionOutcome {
    Pass,
    Hold,
    Recheck,
}

/// Latest inspection result for a shipment (one per shipment, overwritten).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionRecord {
    pub outcome: InspectionOutcome,
    pub notes: String,
    pub inspected_at: DateTime<Utc>,
}

/// A customs hold placed by a HOLD outcome; resolved by a later PASS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hold {
    pub id: HoldId,
    pub reason: String,
    pub required_docs: String,
    pub placed_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Hold {
    pub fn is_open(&self) -> bool {
        self.resolved_at.is_none()
    }
}

/// Validated shipment registration data.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentSpec {
    pub reference_no: String,
    pub vessel: String,
    pub arrival_date: NaiveDate,
    pub origin: String,
    pub importer: String,
}

impl ShipmentSpec {
    pub fn new(
        reference_no: &str,
        vessel: &str,
        arrival_date: NaiveDate,
        origin: &str,
        importer: &str,
    ) -> DomainResult<Self> {
        Ok(Self {
            reference_no: require_text(reference_no, "Reference No", REFERENCE_MAX_LEN)?,
            vessel: require_text(vessel, "Vessel Name", VESSEL_MAX_LEN)?,
            arrival_date,
            origin: require_text(origin, "Origin Country", ORIGIN_MAX_LEN)?,
            importer: require_text(importer, "Importer Name", IMPORTER_MAX_LEN)?,
        })
    }
}

/// Aggregate root: Shipment.
#[derive(Debug, Clone, PartialEq)]
pub struct Shipment {
    id: ShipmentId,
    reference_no: String,
    vessel: String,
    arrival_date: NaiveDate,
    origin: String,
    importer: String,
    status: ShipmentStatus,
    registered_at: DateTime<Utc>,
    inspection: Option<InspectionRecord>,
    holds: Vec<Hold>,
    version: u64,
    created: bool,
}

impl Shipment {
    /// Create an empty, not-yet-registered aggregate instance for rehydration.
    pub fn empty(id: ShipmentId) -> Self {
        Self {
            id,
            reference_no: String::new(),
            vessel: String::new(),
            arrival_date: NaiveDate::default(),
            origin: String::new(),
            importer: String::new(),
            status: ShipmentStatus::Arrived,
            registered_at: DateTime::<Utc>::default(),
            inspection: None,
            holds: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ShipmentId {
        self.id
    }

    pub fn reference_no(&self) -> &str {
        &self.reference_no
    }

    pub fn vessel(&self) -> &str {
        &self.vessel
    }

    pub fn arrival_date(&self) -> NaiveDate {
        self.arrival_date
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn importer(&self) -> &str {
        &self.importer
    }

    pub fn status(&self) -> ShipmentStatus {
        self.status
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    pub fn inspection(&self) -> Option<&InspectionRecord> {
        self.inspection.as_ref()
    }

    pub fn holds(&self) -> &[Hold] {
        &self.holds
    }

    pub fn open_holds(&self) -> impl Iterator<Item = &Hold> {
        self.holds.iter().filter(|h| h.is_open())
    }

    pub fn is_registered(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for Shipment {
    type Id = ShipmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: record the result of an inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    pub outcome: InspectionOutcome,
    pub notes: Option<String>,
    pub reason: Option<String>,
    pub required_docs: Option<String>,
    /// Identity for the hold a HOLD outcome creates (ignored otherwise).
    pub hold_id: HoldId,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleCommand {
    /// Put the shipment (back) in line for inspection.
    Enqueue { at: DateTime<Utc> },
    /// The shipment was taken from the head of the inspection queue.
    BeginInspection { at: DateTime<Utc> },
    RecordOutcome(RecordOutcome),
    /// A release was committed; `fully_released` when no item has stock left.
    CommitRelease {
        fully_released: bool,
        at: DateTime<Utc>,
    },
    /// The most recent release was undone.
    ReverseRelease { at: DateTime<Utc> },
}

/// Event: ShipmentRegistered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRegistered {
    pub shipment_id: ShipmentId,
    pub reference_no: String,
    pub vessel: String,
    pub arrival_date: NaiveDate,
    pub origin: String,
    pub importer: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StatusChanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChanged {
    pub shipment_id: ShipmentId,
    pub from: ShipmentStatus,
    pub to: ShipmentStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InspectionRecorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionRecorded {
    pub shipment_id: ShipmentId,
    pub outcome: InspectionOutcome,
    pub notes: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: HoldPlaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldPlaced {
    pub shipment_id: ShipmentId,
    pub hold_id: HoldId,
    pub reason: String,
    pub required_docs: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ShipmentRemoved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRemoved {
    pub shipment_id: ShipmentId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShipmentEvent {
    Registered(ShipmentRegistered),
    StatusChanged(StatusChanged),
    InspectionRecorded(InspectionRecorded),
    HoldPlaced(HoldPlaced),
    Removed(ShipmentRemoved),
}

impl ShipmentEvent {
    pub fn shipment_id(&self) -> ShipmentId {
        match self {
            ShipmentEvent::Registered(e) => e.shipment_id,
            ShipmentEvent::StatusChanged(e) => e.shipment_id,
            ShipmentEvent::InspectionRecorded(e) => e.shipment_id,
            ShipmentEvent::HoldPlaced(e) => e.shipment_id,
            ShipmentEvent::Removed(e) => e.shipment_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            ShipmentEvent::Registered(_) => "shipment.registered",
            ShipmentEvent::StatusChanged(_) => "shipment.status_changed",
            ShipmentEvent::InspectionRecorded(_) => "shipment.inspection_recorded",
            ShipmentEvent::HoldPlaced(_) => "shipment.hold_placed",
            ShipmentEvent::Removed(_) => "shipment.removed",
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ShipmentEvent::Registered(e) => e.occurred_at,
            ShipmentEvent::StatusChanged(e) => e.occurred_at,
            ShipmentEvent::InspectionRecorded(e) => e.occurred_at,
            ShipmentEvent::HoldPlaced(e) => e.occurred_at,
            ShipmentEvent::Removed(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Shipment {
    type Command = LifecycleCommand;
    type Event = ShipmentEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ShipmentEvent::Registered(e) => {
                self.id = e.shipment_id;
                self.reference_no = e.reference_no.clone();
                self.vessel = e.vessel.clone();
                self.arrival_date = e.arrival_date;
                self.origin = e.origin.clone();
                self.importer = e.importer.clone();
                self.status = ShipmentStatus::Arrived;
                self.registered_at = e.occurred_at;
                self.created = true;
            }
            ShipmentEvent::StatusChanged(e) => {
                self.status = e.to;
            }
            ShipmentEvent::InspectionRecorded(e) => {
                self.inspection = Some(InspectionRecord {
                    outcome: e.outcome,
                    notes: e.notes.clone(),
                    inspected_at: e.occurred_at,
                });
                if e.outcome == InspectionOutcome::Pass {
                    for hold in self.holds.iter_mut().filter(|h| h.is_open()) {
                        hold.resolved_at = Some(e.occurred_at);
                    }
                }
            }
            ShipmentEvent::HoldPlaced(e) => {
                self.holds.push(Hold {
                    id: e.hold_id,
                    reason: e.reason.clone(),
                    required_docs: e.required_docs.clone(),
                    placed_at: e.occurred_at,
                    resolved_at: None,
                });
            }
            ShipmentEvent::Removed(_) => {
                self.created = false;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        if !self.created {
            return Err(DomainError::not_found("shipment"));
        }
        match command {
            LifecycleCommand::Enqueue { at } => {
                self.ensure_not_released("queued for inspection")?;
                Ok(self.status_change(ShipmentStatus::Arrived, *at).into_iter().collect())
            }
            LifecycleCommand::BeginInspection { at } => {
                self.ensure_not_released("inspected")?;
                Ok(self
                    .status_change(ShipmentStatus::UnderInspection, *at)
                    .into_iter()
                    .collect())
            }
            LifecycleCommand::RecordOutcome(cmd) => self.handle_outcome(cmd),
            LifecycleCommand::CommitRelease { fully_released, at } => {
                if self.status != ShipmentStatus::Cleared {
                    return Err(DomainError::transition(format!(
                        "release requires CLEARED status, shipment {} is {}",
                        self.reference_no, self.status
                    )));
                }
                if *fully_released {
                    Ok(self.status_change(ShipmentStatus::Released, *at).into_iter().collect())
                } else {
                    Ok(vec![])
                }
            }
            LifecycleCommand::ReverseRelease { at } => {
                Ok(self.status_change(ShipmentStatus::Cleared, *at).into_iter().collect())
            }
        }
    }
}

impl Shipment {
    fn ensure_not_released(&self, action: &str) -> Result<(), DomainError> {
        if self.status == ShipmentStatus::Released {
            return Err(DomainError::transition(format!(
                "released shipment {} cannot be {action}",
                self.reference_no
            )));
        }
        Ok(())
    }

    fn status_change(&self, to: ShipmentStatus, at: DateTime<Utc>) -> Option<ShipmentEvent> {
        (self.status != to).then(|| {
            ShipmentEvent::StatusChanged(StatusChanged {
                shipment_id: self.id,
                from: self.status,
                to,
                occurred_at: at,
            })
        })
    }

    fn handle_outcome(&self, cmd: &RecordOutcome) -> Result<Vec<ShipmentEvent>, DomainError> {
        self.ensure_not_released("inspected")?;
        let notes = optional_text(cmd.notes.as_deref(), "Notes", NOTES_MAX_LEN)?;

        let mut events = vec![ShipmentEvent::InspectionRecorded(InspectionRecorded {
            shipment_id: self.id,
            outcome: cmd.outcome,
            notes,
            occurred_at: cmd.at,
        })];

        match cmd.outcome {
            InspectionOutcome::Pass => {
                events.extend(self.status_change(ShipmentStatus::Cleared, cmd.at));
            }
            InspectionOutcome::Hold => {
                let reason = hold_field(cmd.reason.as_deref(), "Hold reason")?;
                let required_docs = hold_field(cmd.required_docs.as_deref(), "Required documents")?;
                events.extend(self.status_change(ShipmentStatus::OnHold, cmd.at));
                events.push(ShipmentEvent::HoldPlaced(HoldPlaced {
                    shipment_id: self.id,
                    hold_id: cmd.hold_id,
                    reason,
                    required_docs,
                    occurred_at: cmd.at,
                }));
            }
            InspectionOutcome::Recheck => {
                events.extend(self.status_change(ShipmentStatus::UnderInspection, cmd.at));
            }
        }

        Ok(events)
    }
}

fn hold_field(value: Option<&str>, field: &str) -> Result<String, DomainError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => require_text(v, field, HOLD_FIELD_MAX_LEN),
        _ => Err(DomainError::MissingHoldFields),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn registered() -> Shipment {
        let id = ShipmentId::new();
        let mut shipment = Shipment::empty(id);
        shipment.apply(&ShipmentEvent::Registered(ShipmentRegistered {
            shipment_id: id,
            reference_no: "REF-001".to_string(),
            vessel: "MV Horizon".to_string(),
            arrival_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            origin: "SG".to_string(),
            importer: "Acme Imports".to_string(),
            occurred_at: test_time(),
        }));
        shipment
    }

    fn run(shipment: &mut Shipment, cmd: LifecycleCommand) -> Vec<ShipmentEvent> {
        let events = shipment.handle(&cmd).unwrap();
        for e in &events {
            shipment.apply(e);
        }
        events
    }

    fn outcome(outcome: InspectionOutcome) -> LifecycleCommand {
        LifecycleCommand::RecordOutcome(RecordOutcome {
            outcome,
            notes: Some("seal intact".to_string()),
            reason: Some("missing invoice".to_string()),
            required_docs: Some("commercial invoice".to_string()),
            hold_id: HoldId::new(),
            at: test_time(),
        })
    }

    #[test]
    fn registration_starts_arrived() {
        let shipment = registered();
        assert_eq!(shipment.status(), ShipmentStatus::Arrived);
        assert_eq!(shipment.version(), 1);
    }

    #[test]
    fn unregistered_shipment_is_not_found() {
        let shipment = Shipment::empty(ShipmentId::new());
        let err = shipment
            .handle(&LifecycleCommand::Enqueue { at: test_time() })
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn enqueue_of_arrived_shipment_emits_nothing() {
        let shipment = registered();
        let events = shipment
            .handle(&LifecycleCommand::Enqueue { at: test_time() })
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn pass_clears_and_hold_places_hold() {
        let mut shipment = registered();
        run(&mut shipment, LifecycleCommand::BeginInspection { at: test_time() });
        assert_eq!(shipment.status(), ShipmentStatus::UnderInspection);

        let events = run(&mut shipment, outcome(InspectionOutcome::Hold));
        assert_eq!(events.len(), 3);
        assert_eq!(shipment.status(), ShipmentStatus::OnHold);
        assert_eq!(shipment.open_holds().count(), 1);

        run(&mut shipment, outcome(InspectionOutcome::Recheck));
        assert_eq!(shipment.status(), ShipmentStatus::UnderInspection);

        run(&mut shipment, outcome(InspectionOutcome::Pass));
        assert_eq!(shipment.status(), ShipmentStatus::Cleared);
        assert_eq!(shipment.open_holds().count(), 0);
        assert_eq!(shipment.holds().len(), 1);
        assert_eq!(
            shipment.inspection().map(|i| i.outcome),
            Some(InspectionOutcome::Pass)
        );
    }

    #[test]
    fn hold_without_reason_is_rejected() {
        let shipment = registered();
        let cmd = LifecycleCommand::RecordOutcome(RecordOutcome {
            outcome: InspectionOutcome::Hold,
            notes: None,
            reason: Some("   ".to_string()),
            required_docs: Some("permit".to_string()),
            hold_id: HoldId::new(),
            at: test_time(),
        });
        assert_eq!(shipment.handle(&cmd).unwrap_err(), DomainError::MissingHoldFields);
    }

    #[test]
    fn release_requires_cleared_status() {
        let shipment = registered();
        let err = shipment
            .handle(&LifecycleCommand::CommitRelease {
                fully_released: false,
                at: test_time(),
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));
    }

    #[test]
    fn full_release_is_terminal_until_reversed() {
        let mut shipment = registered();
        run(&mut shipment, outcome(InspectionOutcome::Pass));

        let partial = run(
            &mut shipment,
            LifecycleCommand::CommitRelease {
                fully_released: false,
                at: test_time(),
            },
        );
        assert!(partial.is_empty());
        assert_eq!(shipment.status(), ShipmentStatus::Cleared);

        run(
            &mut shipment,
            LifecycleCommand::CommitRelease {
                fully_released: true,
                at: test_time(),
            },
        );
        assert_eq!(shipment.status(), ShipmentStatus::Released);

        for cmd in [
            LifecycleCommand::Enqueue { at: test_time() },
            LifecycleCommand::BeginInspection { at: test_time() },
            outcome(InspectionOutcome::Pass),
        ] {
            assert!(matches!(
                shipment.handle(&cmd),
                Err(DomainError::InvalidTransition(_))
            ));
        }

        run(&mut shipment, LifecycleCommand::ReverseRelease { at: test_time() });
        assert_eq!(shipment.status(), ShipmentStatus::Cleared);
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let shipment = registered();
        let before = shipment.clone();
        let _ = shipment.handle(&outcome(InspectionOutcome::Hold));
        assert_eq!(shipment, before);
    }
}

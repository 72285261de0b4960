//! Read models derived on demand from a [`LedgerState`].

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use bonded_core::{
    CargoItemId, DomainResult, HoldId, Measure, ReleaseId, ShipmentId, WarehouseId, round_to,
};

use crate::balance::{ItemBalance, Utilization, item_balance, utilization_all};
use crate::ledger::LedgerState;
use crate::shipment::{Hold, InspectionRecord, Shipment, ShipmentStatus};
use crate::stock::{ReleaseLine, Unit};

/// Number of most recent arrival dates listed on the dashboard.
pub const DAILY_ARRIVAL_DAYS: usize = 10;
/// Open holds listed on the dashboard.
pub const DASHBOARD_HOLD_ROWS: usize = 20;
/// Classification codes listed on the dashboard.
pub const DASHBOARD_TOP_CODES: usize = 5;

/// A shipment with its received totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentSummary {
    pub shipment_id: ShipmentId,
    pub reference_no: String,
    pub vessel: String,
    pub arrival_date: NaiveDate,
    pub origin: String,
    pub importer: String,
    pub status: ShipmentStatus,
    pub item_count: usize,
    pub total_qty: f64,
    pub total_value: f64,
}

pub fn shipment_summary(state: &LedgerState, shipment: &Shipment) -> ShipmentSummary {
    let items = state.items_of(shipment.id_typed());
    ShipmentSummary {
        shipment_id: shipment.id_typed(),
        reference_no: shipment.reference_no().to_string(),
        vessel: shipment.vessel().to_string(),
        arrival_date: shipment.arrival_date(),
        origin: shipment.origin().to_string(),
        importer: shipment.importer().to_string(),
        status: shipment.status(),
        item_count: items.len(),
        total_qty: items.iter().fold(0.0, |acc, i| acc + i.received.qty),
        total_value: items.iter().fold(0.0, |acc, i| acc + i.declared_value),
    }
}

/// Every shipment, most recently registered first.
pub fn shipment_summaries(state: &LedgerState) -> Vec<ShipmentSummary> {
    let mut shipments: Vec<_> = state.shipments().collect();
    shipments.sort_by(|a, b| {
        b.registered_at()
            .cmp(&a.registered_at())
            .then(b.id_typed().cmp(&a.id_typed()))
    });
    shipments
        .into_iter()
        .map(|s| shipment_summary(state, s))
        .collect()
}

/// Shipment attribute a search matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    #[default]
    Reference,
    Importer,
    Vessel,
    ClassificationCode,
    Value,
    Quantity,
}

impl SearchField {
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Value | Self::Quantity)
    }
}

/// Ascending order applied to search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentSort {
    #[default]
    ArrivalDate,
    TotalQty,
    TotalValue,
}

/// Shipment list search.
///
/// Text fields match case-insensitively on a substring of the needle. A
/// numeric field matches a substring of the number's plain rendering, or the
/// whole number when `exact` is set. An empty needle keeps every shipment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipmentQuery {
    pub field: SearchField,
    pub needle: String,
    pub sort: ShipmentSort,
    #[serde(default)]
    pub exact: bool,
}

impl ShipmentQuery {
    pub fn new(field: SearchField, needle: impl Into<String>) -> Self {
        Self {
            field,
            needle: needle.into(),
            ..Self::default()
        }
    }

    pub fn sorted_by(mut self, sort: ShipmentSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn exact(mut self) -> Self {
        self.exact = true;
        self
    }

    /// Trimmed, lowercased needle.
    pub fn cleaned_needle(&self) -> String {
        self.needle.trim().to_lowercase()
    }

    /// Whether this query is a whole-number lookup on a numeric field.
    pub fn is_exact_lookup(&self) -> bool {
        self.exact && self.field.is_numeric() && !self.needle.trim().is_empty()
    }

    /// The needle as a finite number; `None` when it does not parse.
    pub fn numeric_target(&self) -> Option<f64> {
        self.needle
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }
}

/// Shipments matching `query`, sorted by `query.sort`.
pub fn search_shipments(state: &LedgerState, query: &ShipmentQuery) -> Vec<ShipmentSummary> {
    let summaries = shipment_summaries(state);
    let needle = query.cleaned_needle();
    let mut rows: Vec<_> = if needle.is_empty() {
        summaries
    } else if query.is_exact_lookup() {
        match query.numeric_target() {
            Some(target) => summaries
                .into_iter()
                .filter(|s| numeric_field(s, query.field) == target)
                .collect(),
            None => Vec::new(),
        }
    } else {
        summaries
            .into_iter()
            .filter(|s| matches_substring(state, s, query.field, &needle))
            .collect()
    };
    sort_summaries(&mut rows, query.sort);
    rows
}

/// Stable ascending sort; ties keep their incoming order.
pub fn sort_summaries(rows: &mut [ShipmentSummary], sort: ShipmentSort) {
    match sort {
        ShipmentSort::ArrivalDate => rows.sort_by(|a, b| a.arrival_date.cmp(&b.arrival_date)),
        ShipmentSort::TotalQty => rows.sort_by(|a, b| a.total_qty.total_cmp(&b.total_qty)),
        ShipmentSort::TotalValue => rows.sort_by(|a, b| a.total_value.total_cmp(&b.total_value)),
    }
}

fn numeric_field(summary: &ShipmentSummary, field: SearchField) -> f64 {
    match field {
        SearchField::Quantity => summary.total_qty,
        _ => summary.total_value,
    }
}

fn matches_substring(
    state: &LedgerState,
    summary: &ShipmentSummary,
    field: SearchField,
    needle: &str,
) -> bool {
    let contains = |text: &str| text.to_lowercase().contains(needle);
    match field {
        SearchField::Reference => contains(&summary.reference_no),
        SearchField::Importer => contains(&summary.importer),
        SearchField::Vessel => contains(&summary.vessel),
        SearchField::ClassificationCode => state
            .items_of(summary.shipment_id)
            .iter()
            .any(|item| contains(&item.classification_code)),
        SearchField::Value | SearchField::Quantity => {
            numeric_field(summary, field).to_string().contains(needle)
        }
    }
}

/// One item of a shipment with its derived balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemView {
    pub item_id: CargoItemId,
    pub classification_code: String,
    pub description: String,
    pub unit: Unit,
    pub declared_value: f64,
    pub warehouse_id: WarehouseId,
    pub warehouse_code: String,
    pub balance: ItemBalance,
}

/// Shipment detail: header, inspection, holds and items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentView {
    pub summary: ShipmentSummary,
    pub inspection: Option<InspectionRecord>,
    pub holds: Vec<HoldRow>,
    pub items: Vec<ItemView>,
}

pub fn shipment_view(state: &LedgerState, shipment_id: ShipmentId) -> DomainResult<ShipmentView> {
    let shipment = state.require_shipment(shipment_id)?;
    let items = state
        .items_of(shipment_id)
        .into_iter()
        .map(|item| {
            Ok(ItemView {
                item_id: item.id,
                classification_code: item.classification_code.clone(),
                description: item.description.clone(),
                unit: item.unit,
                declared_value: item.declared_value,
                warehouse_id: item.warehouse_id,
                warehouse_code: state
                    .warehouse(item.warehouse_id)
                    .map(|w| w.code.clone())
                    .unwrap_or_default(),
                balance: item_balance(state, item.id)?,
            })
        })
        .collect::<DomainResult<Vec<_>>>()?;
    let mut holds: Vec<_> = shipment
        .holds()
        .iter()
        .map(|h| HoldRow::new(shipment, h))
        .collect();
    holds.reverse();
    Ok(ShipmentView {
        summary: shipment_summary(state, shipment),
        inspection: shipment.inspection().cloned(),
        holds,
        items,
    })
}

/// A hold joined with its shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldRow {
    pub hold_id: HoldId,
    pub shipment_id: ShipmentId,
    pub reference_no: String,
    pub importer: String,
    pub reason: String,
    pub required_docs: String,
    pub placed_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl HoldRow {
    fn new(shipment: &Shipment, hold: &Hold) -> Self {
        Self {
            hold_id: hold.id,
            shipment_id: shipment.id_typed(),
            reference_no: shipment.reference_no().to_string(),
            importer: shipment.importer().to_string(),
            reason: hold.reason.clone(),
            required_docs: hold.required_docs.clone(),
            placed_at: hold.placed_at,
            resolved_at: hold.resolved_at,
        }
    }
}

/// Unresolved holds, most recently placed first.
pub fn open_holds(state: &LedgerState) -> Vec<HoldRow> {
    let mut rows: Vec<_> = state
        .shipments()
        .flat_map(|s| s.open_holds().map(move |h| HoldRow::new(s, h)))
        .collect();
    rows.sort_by(|a, b| b.placed_at.cmp(&a.placed_at).then(b.hold_id.cmp(&a.hold_id)));
    rows
}

/// Printable release document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseNote {
    pub release_id: ReleaseId,
    pub release_no: String,
    pub officer: String,
    pub released_at: DateTime<Utc>,
    pub shipment_id: ShipmentId,
    pub reference_no: String,
    pub importer: String,
    pub vessel: String,
    pub lines: Vec<ReleaseNoteLine>,
    pub total: Measure,
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseNoteLine {
    pub classification_code: String,
    pub description: String,
    pub unit: Option<Unit>,
    #[serde(flatten)]
    pub line: ReleaseLine,
}

pub fn release_note(state: &LedgerState, release_id: ReleaseId) -> DomainResult<ReleaseNote> {
    let release = state.require_release(release_id)?;
    let shipment = state.require_shipment(release.shipment_id)?;
    let lines = release
        .lines
        .iter()
        .map(|line| {
            let item = state.item(line.item_id);
            ReleaseNoteLine {
                classification_code: item
                    .map(|i| i.classification_code.clone())
                    .unwrap_or_default(),
                description: item.map(|i| i.description.clone()).unwrap_or_default(),
                unit: item.map(|i| i.unit),
                line: line.clone(),
            }
        })
        .collect();
    Ok(ReleaseNote {
        release_id,
        release_no: release.release_no.clone(),
        officer: release.officer.clone(),
        released_at: release.released_at,
        shipment_id: shipment.id_typed(),
        reference_no: shipment.reference_no().to_string(),
        importer: shipment.importer().to_string(),
        vessel: shipment.vessel().to_string(),
        lines,
        total: release.total(),
        total_value: release.total_value(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeValue {
    pub classification_code: String,
    pub total_value: f64,
}

/// Classification codes by total declared value, highest first.
pub fn top_classification_codes(state: &LedgerState, n: usize) -> Vec<CodeValue> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for item in state.items() {
        *totals.entry(item.classification_code.as_str()).or_default() += item.declared_value;
    }
    let mut rows: Vec<_> = totals
        .into_iter()
        .map(|(code, total)| CodeValue {
            classification_code: code.to_string(),
            total_value: round_to(total, 2),
        })
        .collect();
    // Stable sort keeps ties in code order.
    rows.sort_by(|a, b| b.total_value.total_cmp(&a.total_value));
    rows.truncate(n);
    rows
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyArrivals {
    pub arrival_date: NaiveDate,
    pub count: usize,
}

/// Shipment count per arrival date for the most recent dates.
pub fn daily_arrivals(state: &LedgerState, days: usize) -> Vec<DailyArrivals> {
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for shipment in state.shipments() {
        *counts.entry(shipment.arrival_date()).or_default() += 1;
    }
    counts
        .into_iter()
        .rev()
        .take(days)
        .map(|(arrival_date, count)| DailyArrivals {
            arrival_date,
            count,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgingRow {
    pub shipment_id: ShipmentId,
    pub reference_no: String,
    pub status: ShipmentStatus,
    pub age_days: i64,
}

/// Shipments stuck in inspection or on hold for more than `threshold_days`.
pub fn aging_shipments(state: &LedgerState, today: NaiveDate, threshold_days: i64) -> Vec<AgingRow> {
    let mut rows: Vec<_> = state
        .shipments()
        .filter(|s| {
            matches!(
                s.status(),
                ShipmentStatus::OnHold | ShipmentStatus::UnderInspection
            )
        })
        .map(|s| AgingRow {
            shipment_id: s.id_typed(),
            reference_no: s.reference_no().to_string(),
            status: s.status(),
            age_days: (today - s.arrival_date()).num_days(),
        })
        .filter(|r| r.age_days > threshold_days)
        .collect();
    rows.sort_by(|a, b| b.age_days.cmp(&a.age_days).then(a.reference_no.cmp(&b.reference_no)));
    rows
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Kpis {
    pub total_shipments: usize,
    pub under_inspection: usize,
    pub on_hold: usize,
    pub total_available: Measure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub kpis: Kpis,
    pub utilization: Vec<Utilization>,
    pub daily_arrivals: Vec<DailyArrivals>,
    pub open_holds: Vec<HoldRow>,
    pub top_codes: Vec<CodeValue>,
    pub aging: Vec<AgingRow>,
}

pub fn dashboard(state: &LedgerState, today: NaiveDate, aging_days: i64) -> DomainResult<Dashboard> {
    let mut kpis = Kpis::default();
    for shipment in state.shipments() {
        kpis.total_shipments += 1;
        match shipment.status() {
            ShipmentStatus::UnderInspection => kpis.under_inspection += 1,
            ShipmentStatus::OnHold => kpis.on_hold += 1,
            _ => {}
        }
    }
    for item in state.items() {
        kpis.total_available += item_balance(state, item.id)?.available;
    }

    let mut holds = open_holds(state);
    holds.truncate(DASHBOARD_HOLD_ROWS);

    Ok(Dashboard {
        kpis,
        utilization: utilization_all(state),
        daily_arrivals: daily_arrivals(state, DAILY_ARRIVAL_DAYS),
        open_holds: holds,
        top_codes: top_classification_codes(state, DASHBOARD_TOP_CODES),
        aging: aging_shipments(state, today, aging_days),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::fixtures::{History, date};
    use crate::shipment::{
        HoldPlaced, InspectionOutcome, InspectionRecorded, ShipmentEvent, StatusChanged,
    };

    fn put_on_hold(h: &mut History, shipment_id: ShipmentId, reason: &str) {
        h.push(ShipmentEvent::StatusChanged(StatusChanged {
            shipment_id,
            from: ShipmentStatus::Arrived,
            to: ShipmentStatus::OnHold,
            occurred_at: Utc::now(),
        }));
        h.push(ShipmentEvent::HoldPlaced(HoldPlaced {
            shipment_id,
            hold_id: HoldId::new(),
            reason: reason.to_string(),
            required_docs: "Certificate of origin".to_string(),
            occurred_at: Utc::now(),
        }));
    }

    #[test]
    fn summaries_total_received_items() {
        let mut h = History::default();
        let wh = h.warehouse("WH-A", 10_000.0, 10_000.0);
        let first = h.shipment("BL-1", date(2024, 3, 1));
        let second = h.shipment("BL-2", date(2024, 3, 2));
        h.item(first, wh, "8471", 10.0, 20.0, 100.0);
        h.item(first, wh, "0901", 5.0, 5.0, 50.5);
        h.item(second, wh, "8471", 1.0, 1.0, 1.0);
        let state = h.state();

        let rows = shipment_summaries(&state);
        let bl1 = rows.iter().find(|r| r.reference_no == "BL-1").unwrap();
        assert_eq!(bl1.item_count, 2);
        assert_eq!(bl1.total_qty, 15.0);
        assert_eq!(bl1.total_value, 150.5);

        let top = top_classification_codes(&state, 1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].classification_code, "8471");
        assert_eq!(top[0].total_value, 101.0);
    }

    fn search_history() -> LedgerState {
        let mut h = History::default();
        let wh = h.warehouse("WH-A", 10_000.0, 10_000.0);
        let late = h.shipment("BL-200", date(2024, 5, 3));
        let early = h.shipment("bl-100", date(2024, 5, 1));
        let middle = h.shipment("CX-300", date(2024, 5, 2));
        h.item(late, wh, "8471", 10.0, 10.0, 1500.0);
        h.item(early, wh, "0901", 40.0, 10.0, 250.5);
        h.item(middle, wh, "8471", 3.0, 1.0, 250.5);
        h.item(middle, wh, "6109", 4.0, 1.0, 99.5);
        h.state()
    }

    fn found(state: &LedgerState, query: ShipmentQuery) -> Vec<String> {
        search_shipments(state, &query)
            .into_iter()
            .map(|r| r.reference_no)
            .collect()
    }

    #[test]
    fn search_matches_text_fields_case_insensitively() {
        let state = search_history();
        let query = |field, needle: &str| ShipmentQuery::new(field, needle);

        assert_eq!(found(&state, query(SearchField::Reference, " BL-")), ["bl-100", "BL-200"]);
        assert_eq!(
            found(&state, query(SearchField::ClassificationCode, "847")),
            ["CX-300", "BL-200"]
        );
        assert_eq!(found(&state, query(SearchField::Vessel, "straits")).len(), 3);
        assert!(found(&state, query(SearchField::Importer, "zzz")).is_empty());
    }

    #[test]
    fn empty_needle_lists_everything_in_sort_order() {
        let state = search_history();
        assert_eq!(
            found(&state, ShipmentQuery::default()),
            ["bl-100", "CX-300", "BL-200"]
        );
        assert_eq!(
            found(&state, ShipmentQuery::default().sorted_by(ShipmentSort::TotalQty)),
            ["CX-300", "BL-200", "bl-100"]
        );
        let blank = ShipmentQuery::new(SearchField::Value, "  ").sorted_by(ShipmentSort::TotalValue);
        assert_eq!(found(&state, blank), ["bl-100", "CX-300", "BL-200"]);
    }

    #[test]
    fn numeric_search_matches_substring_or_whole_number() {
        let state = search_history();
        let value = |needle: &str| ShipmentQuery::new(SearchField::Value, needle);
        let qty = |needle: &str| ShipmentQuery::new(SearchField::Quantity, needle);

        assert_eq!(found(&state, value("50")).len(), 3);
        assert_eq!(found(&state, value("250.5").exact()), ["bl-100"]);
        assert_eq!(found(&state, qty("7").exact()), ["CX-300"]);
        assert!(found(&state, qty("4").exact()).is_empty());
        assert!(found(&state, value("abc").exact()).is_empty());
    }

    #[test]
    fn exact_flag_is_ignored_for_text_fields() {
        let state = search_history();
        let query = ShipmentQuery::new(SearchField::Reference, "bl").exact();
        assert!(!query.is_exact_lookup());
        assert_eq!(found(&state, query).len(), 2);
    }

    #[test]
    fn dashboard_reports_holds_and_aging() {
        let mut h = History::default();
        let held = h.shipment("BL-OLD", date(2024, 1, 1));
        h.shipment("BL-NEW", date(2024, 3, 9));
        put_on_hold(&mut h, held, "Missing invoice");
        let state = h.state();

        let board = dashboard(&state, date(2024, 3, 10), 7).unwrap();
        assert_eq!(board.kpis.total_shipments, 2);
        assert_eq!(board.kpis.on_hold, 1);
        assert_eq!(board.open_holds.len(), 1);
        assert_eq!(board.open_holds[0].reference_no, "BL-OLD");
        assert_eq!(board.aging.len(), 1);
        assert_eq!(board.aging[0].age_days, 69);
        assert_eq!(board.daily_arrivals[0].arrival_date, date(2024, 3, 9));
    }

    #[test]
    fn passing_inspection_resolves_holds() {
        let mut h = History::default();
        let s = h.shipment("BL-1", date(2024, 3, 1));
        put_on_hold(&mut h, s, "Seal broken");
        h.push(ShipmentEvent::InspectionRecorded(InspectionRecorded {
            shipment_id: s,
            outcome: InspectionOutcome::Pass,
            notes: String::new(),
            occurred_at: Utc::now(),
        }));
        let state = h.state();
        assert!(open_holds(&state).is_empty());
        let view = shipment_view(&state, s).unwrap();
        assert_eq!(view.holds.len(), 1);
        assert!(view.holds[0].resolved_at.is_some());
    }

    #[test]
    fn daily_arrivals_keeps_latest_dates() {
        let mut h = History::default();
        for day in 1..=12 {
            h.shipment(&format!("BL-{day}"), date(2024, 4, day));
        }
        h.shipment("BL-EXTRA", date(2024, 4, 12));
        let rows = daily_arrivals(&h.state(), DAILY_ARRIVAL_DAYS);
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0], DailyArrivals { arrival_date: date(2024, 4, 12), count: 2 });
        assert_eq!(rows[9].arrival_date, date(2024, 4, 3));
    }
}

// src/routes/wasted.rs

use std::{cmp::Ordering, collections::BTreeSet, sync::Arc};

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{today, TabQ};
use crate::{
    aggregate::{
        period::{self, MonthKey, Quarter},
        rollup::{
            ceil1, percent_change, round1, round2, round_half_up, sum_by_month, sum_by_quarter,
            Buckets, Delta, Direction, Field, QuarterTotals,
        },
    },
    error::AppError,
    models::{Record, RowQuery},
    sheets::parse::is_totals_floor,
    AppState,
};

const PEOPLE_IN_BUILDING: f64 = 372.0;
/// Average municipal disposal fee, THB per kg.
const UNIT_COST_WASTED: f64 = 2.28;
/// kgCO2e per kg of landfilled waste.
const LANDFILL_KGCO2E_PER_KG: f64 = 2.32;
const DEFAULT_RECYCLE_TARGET: f64 = 5.0;

// ─────────────────────────────────────────────────────────────────────────────
// Response models
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct RowsResp {
    pub count: usize,
    pub cached: bool,
    pub fetched_at: DateTime<Utc>,
    pub ttl_days: i64,
    pub rows: Arc<Vec<Record>>,
}

#[derive(Serialize)]
pub struct QuarterlyResp {
    pub quarterly_summary: Buckets<Quarter, QuarterTotals>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MonthSummary {
    pub month: MonthKey,
    pub total_kg: f64,
    /// kg per 1000 people in the building
    pub computed_value: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Comparison {
    pub previous_month: Option<MonthKey>,
    pub current_month: Option<MonthKey>,
    pub previous_value: f64,
    pub current_value: f64,
    pub diff: Option<f64>,
    pub pct_change: Option<f64>,
    pub direction: Direction,
}

#[derive(Debug, Serialize)]
pub struct WidgetResp {
    pub months_used: Vec<MonthKey>,
    pub organic_summary: Vec<MonthSummary>,
    pub hazardous_summary: Vec<MonthSummary>,
    pub landfill_summary: Vec<MonthSummary>,
    pub organic_trend: Option<Comparison>,
    pub hazardous_comparison: Option<Comparison>,
    pub landfill_comparison: Option<Comparison>,
    pub total_rows: usize,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct FloorTotal {
    pub floor: String,
    pub total_waste_kg: f64,
}

#[derive(Debug, Serialize)]
pub struct FloorsResp {
    pub month_used: MonthKey,
    pub month_name_th: String,
    pub total_rows: usize,
    pub floors: Vec<FloorTotal>,
}

impl FloorsResp {
    /// Same shape with no rows, for reports that have no per-floor data yet.
    pub fn placeholder(month: MonthKey) -> Self {
        Self {
            month_used: month,
            month_name_th: month.thai_label(),
            total_rows: 0,
            floors: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
pub struct RecycleQ {
    pub gid: Option<String>,
    pub year: Option<i32>,
    pub target: Option<f64>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RecycleMonth {
    pub year: i32,
    pub month: u32,
    pub recycle_rate_percent: i64,
    pub target: f64,
}

#[derive(Serialize)]
pub struct RecycleResp {
    #[serde(rename = "RecycleRate")]
    pub recycle_rate: Vec<RecycleMonth>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct LandfillRate {
    pub change_kg: f64,
    pub wasted_kgco2e: f64,
    pub percent_change: Option<f64>,
    pub direction_kg: Direction,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct LandfillCost {
    pub change_baht: f64,
    pub percent_change: Option<f64>,
    pub unit_cost_per_kg: f64,
    pub direction: Direction,
}

#[derive(Debug, Serialize)]
pub struct ManagementResp {
    pub months_used: Vec<MonthKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_month_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_month_name: Option<String>,
    pub landfill_rate: Option<LandfillRate>,
    pub cost: Option<LandfillCost>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Reports
// ─────────────────────────────────────────────────────────────────────────────

/// Four quarters ending at the latest dated row, oldest first.
pub fn quarterly_report(records: &[Record]) -> QuarterlyResp {
    let summary = match period::max_date(records) {
        Some(max) => sum_by_quarter(records, &Quarter::latest_four(Quarter::of(max))),
        None => Vec::new(),
    };
    QuarterlyResp { quarterly_summary: Buckets(summary) }
}

fn per_thousand_summary(rows: &[&Record], months: &[MonthKey], field: Field) -> Vec<MonthSummary> {
    sum_by_month(rows.iter().copied(), months, field)
        .into_iter()
        .map(|(month, total)| MonthSummary {
            month,
            total_kg: ceil1(total),
            computed_value: ceil1(total / PEOPLE_IN_BUILDING * 1000.0),
        })
        .collect()
}

fn compare_computed(summary: &[MonthSummary]) -> Option<Comparison> {
    let [prev, curr] = summary else { return None };
    let delta = Delta::between(prev.computed_value, curr.computed_value);
    Some(Comparison {
        previous_month: Some(prev.month),
        current_month: Some(curr.month),
        previous_value: prev.computed_value,
        current_value: curr.computed_value,
        diff: Some(delta.diff),
        pct_change: delta.pct_change.map(round2),
        direction: delta.direction,
    })
}

// Hazardous compares the rounded kg totals rather than the per-1000 values,
// and its direction follows the rounded percentage.
fn compare_hazardous(summary: &[MonthSummary]) -> Option<Comparison> {
    let [prev, curr] = summary else { return None };
    let pct_change = percent_change(prev.total_kg, curr.total_kg).map(round2);
    Some(Comparison {
        previous_month: Some(prev.month),
        current_month: Some(curr.month),
        previous_value: prev.total_kg,
        current_value: curr.total_kg,
        diff: None,
        pct_change,
        direction: pct_change.map_or(Direction::Flat, Direction::of),
    })
}

/// Per-1000-people waste for the two latest months that have data.
pub fn widget_report(records: &[Record]) -> WidgetResp {
    let months_set = period::latest_distinct_months(records, 2);
    let months: Vec<MonthKey> = months_set.iter().copied().collect();
    let rows = period::filter_by_months(records, &months_set);

    if months.len() < 2 {
        return WidgetResp {
            months_used: months,
            organic_summary: Vec::new(),
            hazardous_summary: Vec::new(),
            landfill_summary: Vec::new(),
            organic_trend: None,
            hazardous_comparison: None,
            landfill_comparison: None,
            total_rows: rows.len(),
        };
    }

    let organic_summary = per_thousand_summary(&rows, &months, Field::Organic);
    let hazardous_summary = per_thousand_summary(&rows, &months, Field::Hazardous);
    let landfill_summary = per_thousand_summary(&rows, &months, Field::Landfill);

    WidgetResp {
        organic_trend: compare_computed(&organic_summary),
        hazardous_comparison: compare_hazardous(&hazardous_summary),
        landfill_comparison: compare_computed(&landfill_summary),
        months_used: months,
        organic_summary,
        hazardous_summary,
        landfill_summary,
        total_rows: rows.len(),
    }
}

fn finite_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Thai dictionary order: a leading vowel (เ แ โ ใ ไ) sorts by the consonant
/// it precedes, and ASCII letters ignore case.
fn thai_sort_key(s: &str) -> Vec<char> {
    let mut key = Vec::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if ('\u{0E40}'..='\u{0E44}').contains(&c) {
            if let Some(next) = chars.next() {
                key.push(next);
            }
        }
        key.push(c.to_ascii_lowercase());
    }
    key
}

// Numeric floors first in numeric order, then named floors.
fn floor_order(a: &str, b: &str) -> Ordering {
    match (finite_number(a), finite_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => thai_sort_key(a).cmp(&thai_sort_key(b)).then_with(|| a.cmp(b)),
    }
}

/// Total waste per floor for `month`. Floor `0` covers both basements and is
/// split evenly into `B1` and `B2`.
pub fn floors_report(records: &[Record], month: MonthKey) -> FloorsResp {
    let rows: Vec<&Record> = records.iter().filter(|r| r.month_key() == Some(month)).collect();

    let mut totals: Vec<(String, f64)> = Vec::new();
    for r in &rows {
        let floor = r.floor.as_deref().unwrap_or("").trim();
        if floor.is_empty() || is_totals_floor(floor) {
            continue;
        }
        match totals.iter_mut().find(|(f, _)| f == floor) {
            Some((_, sum)) => *sum += r.resolved_total_waste(),
            None => totals.push((floor.to_string(), r.resolved_total_waste())),
        }
    }
    totals.sort_by(|(a, _), (b, _)| floor_order(a, b));

    let mut floors: Vec<FloorTotal> = Vec::with_capacity(totals.len() + 1);
    if let Some(pos) = totals.iter().position(|(f, _)| f == "0") {
        let (_, basement) = totals.remove(pos);
        let half = round1(basement / 2.0);
        floors.push(FloorTotal { floor: "B1".into(), total_waste_kg: half });
        floors.push(FloorTotal { floor: "B2".into(), total_waste_kg: half });
    }
    floors.extend(totals.into_iter().map(|(floor, kg)| FloorTotal {
        floor,
        total_waste_kg: round1(kg),
    }));

    FloorsResp {
        month_used: month,
        month_name_th: month.thai_label(),
        total_rows: rows.len(),
        floors,
    }
}

/// Monthly recycle share of total waste for `year`. The current year stops at
/// the previous month.
pub fn recycle_rate_report(records: &[Record], year: i32, target: f64, today: NaiveDate) -> RecycleResp {
    let end_month = if year == today.year() {
        today.month().saturating_sub(1).max(1)
    } else {
        12
    };
    let months: Vec<MonthKey> = (1..=end_month).map(|m| MonthKey::new(year, m)).collect();

    let recycled = sum_by_month(records, &months, Field::Recycle);
    let totals = sum_by_month(records, &months, Field::Total);

    let recycle_rate = recycled
        .into_iter()
        .zip(totals)
        .map(|((month, recycle), (_, total))| {
            let percent = if total > 0.0 { recycle / total * 100.0 } else { 0.0 };
            RecycleMonth {
                year,
                month: month.month,
                recycle_rate_percent: round_half_up(percent) as i64,
                target,
            }
        })
        .collect();

    RecycleResp { recycle_rate }
}

/// Landfill weight and disposal cost, latest data month against the one before.
pub fn management_report(records: &[Record]) -> ManagementResp {
    let present: BTreeSet<MonthKey> = records.iter().filter_map(Record::month_key).collect();
    let months: Vec<MonthKey> = present.iter().rev().take(2).rev().copied().collect();

    if months.len() < 2 {
        return ManagementResp {
            months_used: months,
            previous_month_name: None,
            current_month_name: None,
            landfill_rate: None,
            cost: None,
        };
    }
    let (prev_key, curr_key) = (months[0], months[1]);

    let sums = sum_by_month(records, &months, Field::Landfill);
    let (prev, curr) = (sums[0].1, sums[1].1);

    let diff_kg = curr - prev;
    let landfill_rate = LandfillRate {
        change_kg: round1(diff_kg),
        wasted_kgco2e: round1(diff_kg * LANDFILL_KGCO2E_PER_KG),
        percent_change: percent_change(prev, curr).map(round1),
        direction_kg: Direction::of(diff_kg),
    };

    let (prev_cost, curr_cost) = (prev * UNIT_COST_WASTED, curr * UNIT_COST_WASTED);
    let change_baht = round1(curr_cost - prev_cost);
    let cost = LandfillCost {
        change_baht,
        percent_change: percent_change(prev_cost, curr_cost).map(round1),
        unit_cost_per_kg: UNIT_COST_WASTED,
        direction: Direction::of(change_baht),
    };

    ManagementResp {
        previous_month_name: Some(prev_key.thai_label()),
        current_month_name: Some(curr_key.thai_label()),
        months_used: months,
        landfill_rate: Some(landfill_rate),
        cost: Some(cost),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/wasted/json
pub async fn rows_json(
    State(state): State<AppState>,
    Query(q): Query<RowQuery>,
) -> Result<Json<RowsResp>, AppError> {
    if let Some(month) = q.month.filter(|m| !(1..=12).contains(m)) {
        return Err(AppError::BadRequest(format!("month must be 1-12, got {month}")));
    }
    let fetched = state.rows.resolve(&q).await?;
    Ok(Json(RowsResp {
        count: fetched.records.len(),
        cached: fetched.from_cache,
        fetched_at: fetched.fetched_at,
        ttl_days: state.rows.ttl().num_days(),
        rows: fetched.records,
    }))
}

/// GET /api/v1/wasted/wasted-latest_four-quarterly
pub async fn latest_four_quarterly(
    State(state): State<AppState>,
    Query(q): Query<TabQ>,
) -> Result<Json<QuarterlyResp>, AppError> {
    let fetched = state.rows.resolve(&RowQuery::for_tab(q.gid)).await?;
    Ok(Json(quarterly_report(&fetched.records)))
}

/// GET /api/v1/wasted/widget
pub async fn widget(
    State(state): State<AppState>,
    Query(q): Query<TabQ>,
) -> Result<Json<WidgetResp>, AppError> {
    let fetched = state.rows.resolve(&RowQuery::for_tab(q.gid)).await?;
    Ok(Json(widget_report(&fetched.records)))
}

/// GET /api/v1/wasted/wasted-floors
pub async fn floors(
    State(state): State<AppState>,
    Query(q): Query<TabQ>,
) -> Result<Json<FloorsResp>, AppError> {
    let fetched = state.rows.resolve(&RowQuery::for_tab(q.gid)).await?;
    let last_month = MonthKey::from_date(today()).prev();
    Ok(Json(floors_report(&fetched.records, last_month)))
}

/// GET /api/v1/wasted/recycle-rate
pub async fn recycle_rate(
    State(state): State<AppState>,
    Query(q): Query<RecycleQ>,
) -> Result<Json<RecycleResp>, AppError> {
    let fetched = state.rows.resolve(&RowQuery::for_tab(q.gid)).await?;
    let today = today();
    let year = q.year.unwrap_or(today.year());
    let target = q.target.unwrap_or(DEFAULT_RECYCLE_TARGET);
    if fetched.records.is_empty() {
        return Ok(Json(RecycleResp { recycle_rate: Vec::new() }));
    }
    Ok(Json(recycle_rate_report(&fetched.records, year, target, today)))
}

/// GET /api/v1/wasted/waste-management-information
pub async fn management_information(
    State(state): State<AppState>,
    Query(q): Query<TabQ>,
) -> Result<Json<ManagementResp>, AppError> {
    let fetched = state.rows.resolve(&RowQuery::for_tab(q.gid)).await?;
    Ok(Json(management_report(&fetched.records)))
}

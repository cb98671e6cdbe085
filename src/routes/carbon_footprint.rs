// src/routes/carbon_footprint.rs

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;

use super::{today, wasted::FloorsResp, TabQ};
use crate::{
    aggregate::{
        period::{trailing_months, MonthKey},
        rollup::{percent_change, round1, sum_by_month, Direction, Field},
    },
    error::AppError,
    models::{Record, RowQuery},
    AppState,
};

const ENERGY_FACTOR_KGCO2E_PER_KWH: f64 = 0.4999;
const WASTE_FACTOR_KGCO2E_PER_KG: f64 = 2.32;
/// kgCO2e absorbed per planted tree.
const TREE_FACTOR_KGCO2E: f64 = 9.5;
const TGO_REFERENCE: &str = "องค์การบริหารจัดการก๊าซเรือนกระจก (อบก.) มีนาคม 2567";
const TREE_FACTOR_REFERENCE: &str = "องค์การบริหารจัดการก๊าซเรือนกระจก (อบก.), มีนาคม 2567";

#[derive(Debug, Serialize)]
pub struct EmissionFactors {
    pub energy_factor_kgco2e_per_kwh: f64,
    pub waste_factor_kgco2e_per_kg: f64,
    pub data_source_reference: &'static str,
}

impl Default for EmissionFactors {
    fn default() -> Self {
        Self {
            energy_factor_kgco2e_per_kwh: ENERGY_FACTOR_KGCO2E_PER_KWH,
            waste_factor_kgco2e_per_kg: WASTE_FACTOR_KGCO2E_PER_KG,
            data_source_reference: TGO_REFERENCE,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MonthlyEmission {
    pub month_name_th: &'static str,
    pub year: i32,
    pub carbon_emission_kgco2e: f64,
    pub energy_emission_kgco2e: f64,
}

#[derive(Debug, Serialize)]
pub struct MonthlyPrintingResp {
    pub emission_factors: EmissionFactors,
    pub monthly_emission_report: Vec<MonthlyEmission>,
}

#[derive(Debug, Serialize)]
pub struct ReductionPeriod {
    pub months_used: [MonthKey; 2],
    pub previous_month_name_th: String,
    pub current_month_name_th: String,
    pub previous_month_carbon_kgco2e: f64,
    pub current_month_carbon_kgco2e: f64,
}

#[derive(Debug, Serialize)]
pub struct EmissionRate {
    pub change_kgco2e: f64,
    pub percent_change: Option<f64>,
    pub direction: Direction,
}

#[derive(Debug, Serialize)]
pub struct TreesEquivalent {
    pub trees_equivalent: f64,
    pub per_tree_factor_kgco2e: f64,
    pub reference: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReductionResp {
    pub period: ReductionPeriod,
    pub carbon_emission_rate: EmissionRate,
    pub trees_replacement_equivalent: TreesEquivalent,
}

/// Waste carbon for the twelve months ending in the month of `today`.
pub fn monthly_printing_report(records: &[Record], today: NaiveDate) -> MonthlyPrintingResp {
    if records.is_empty() {
        return MonthlyPrintingResp {
            emission_factors: EmissionFactors::default(),
            monthly_emission_report: Vec::new(),
        };
    }

    let months = trailing_months(MonthKey::from_date(today), 12);
    let monthly_emission_report = sum_by_month(records, &months, Field::Carbon)
        .into_iter()
        .map(|(month, carbon)| MonthlyEmission {
            month_name_th: month.thai_name(),
            year: month.year,
            carbon_emission_kgco2e: round1(carbon),
            energy_emission_kgco2e: 0.0,
        })
        .collect();

    MonthlyPrintingResp {
        emission_factors: EmissionFactors::default(),
        monthly_emission_report,
    }
}

/// This calendar month against the previous one; months without rows count as zero.
pub fn reduction_report(records: &[Record], today: NaiveDate) -> ReductionResp {
    let curr_key = MonthKey::from_date(today);
    let prev_key = curr_key.prev();

    let sums = sum_by_month(records, &[prev_key, curr_key], Field::Carbon);
    let (prev, curr) = (sums[0].1, sums[1].1);

    let change_kgco2e = round1(curr - prev);

    ReductionResp {
        period: ReductionPeriod {
            months_used: [prev_key, curr_key],
            previous_month_name_th: prev_key.thai_label(),
            current_month_name_th: curr_key.thai_label(),
            previous_month_carbon_kgco2e: round1(prev),
            current_month_carbon_kgco2e: round1(curr),
        },
        carbon_emission_rate: EmissionRate {
            change_kgco2e,
            percent_change: percent_change(prev, curr).map(round1),
            direction: Direction::of(change_kgco2e),
        },
        trees_replacement_equivalent: TreesEquivalent {
            trees_equivalent: round1(change_kgco2e.abs() / TREE_FACTOR_KGCO2E),
            per_tree_factor_kgco2e: TREE_FACTOR_KGCO2E,
            reference: TREE_FACTOR_REFERENCE,
        },
    }
}

/// GET /api/v1/carbon-footprint/carbonfootpint-floors
///
/// Per-floor carbon is not recorded in the sheet yet.
pub async fn floors() -> Json<FloorsResp> {
    Json(FloorsResp::placeholder(MonthKey::from_date(today()).prev()))
}

/// GET /api/v1/carbon-footprint/monthly-printing
pub async fn monthly_printing(
    State(state): State<AppState>,
    Query(q): Query<TabQ>,
) -> Result<Json<MonthlyPrintingResp>, AppError> {
    tracing::debug!(gid = ?q.gid, "monthly printing report");
    let fetched = state.rows.resolve(&RowQuery::for_tab(q.gid)).await?;
    Ok(Json(monthly_printing_report(&fetched.records, today())))
}

/// GET /api/v1/carbon-footprint/carbon-reduction-info
pub async fn reduction_info(
    State(state): State<AppState>,
    Query(q): Query<TabQ>,
) -> Result<Json<ReductionResp>, AppError> {
    let fetched = state.rows.resolve(&RowQuery::for_tab(q.gid)).await?;
    Ok(Json(reduction_report(&fetched.records, today())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::waste;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn carbon(date: &str, kg: f64) -> Record {
        Record { carbon_emission_kgco2e: kg, ..waste(date, "1") }
    }

    #[test]
    fn printing_covers_twelve_months() {
        let rows = vec![
            carbon("2025-10-02", 1.04),
            carbon("2025-10-20", 2.0),
            carbon("2024-11-05", 5.0),
            carbon("2024-10-31", 99.0),
        ];
        let report = monthly_printing_report(&rows, day(2025, 10, 16)).monthly_emission_report;

        assert_eq!(report.len(), 12);
        assert_eq!(report[0].year, 2024);
        assert_eq!(report[0].month_name_th, "พฤศจิกายน");
        assert_eq!(report[0].carbon_emission_kgco2e, 5.0);
        assert_eq!(report[11].month_name_th, "ตุลาคม");
        assert_eq!(report[11].carbon_emission_kgco2e, 3.0);
        assert!(report[1..11].iter().all(|m| m.carbon_emission_kgco2e == 0.0));
    }

    #[test]
    fn printing_without_rows_is_empty() {
        let r = monthly_printing_report(&[], day(2025, 10, 16));
        assert!(r.monthly_emission_report.is_empty());
        assert_eq!(r.emission_factors.waste_factor_kgco2e_per_kg, 2.32);
        assert_eq!(
            r.emission_factors.data_source_reference,
            "องค์การบริหารจัดการก๊าซเรือนกระจก (อบก.) มีนาคม 2567"
        );
    }

    #[test]
    fn reduction_against_previous_month() {
        let rows = vec![carbon("2025-09-10", 100.0), carbon("2025-10-01", 81.0)];
        let r = reduction_report(&rows, day(2025, 10, 16));

        assert_eq!(r.period.previous_month_name_th, "กันยายน 2568");
        assert_eq!(r.carbon_emission_rate.change_kgco2e, -19.0);
        assert_eq!(r.carbon_emission_rate.percent_change, Some(-19.0));
        assert_eq!(r.carbon_emission_rate.direction, Direction::Down);
        assert_eq!(r.trees_replacement_equivalent.trees_equivalent, 2.0);
        assert_eq!(
            r.trees_replacement_equivalent.reference,
            "องค์การบริหารจัดการก๊าซเรือนกระจก (อบก.), มีนาคม 2567"
        );
    }

    #[test]
    fn reduction_with_empty_previous_month() {
        let r = reduction_report(&[carbon("2025-01-03", 4.0)], day(2025, 1, 20));
        assert_eq!(r.period.months_used[0].to_string(), "2024-12");
        assert_eq!(r.carbon_emission_rate.percent_change, None);
        assert_eq!(r.carbon_emission_rate.direction, Direction::Up);
    }
}

// src/routes/energy.rs
//
// Energy meters are not wired into the sheet yet; these reports serve the
// dashboard layout with zeroed or sample figures.

use axum::Json;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use super::{today, wasted::FloorsResp};
use crate::aggregate::{
    period::{thai_month_name, MonthKey, Quarter},
    rollup::{round1, Buckets},
};

/// Bangkok, UTC+7.
const BKK_OFFSET_SECS: i32 = 7 * 3600;
const ECON_TARGET_KWH: f64 = 131_177.0;

const SAMPLE_LAST_YEAR_KWH: [f64; 12] = [
    137571.0, 134294.0, 146991.0, 137148.0, 146681.0, 133828.0, 135507.9, 145008.0, 138121.0,
    132131.8, 0.0, 0.0,
];
const SAMPLE_CURRENT_YEAR_KWH: [f64; 12] = [
    113941.4, 121612.1, 135974.0, 156997.1, 141046.5, 126615.0, 65848.5, 148453.0, 94997.5,
    154559.0, 0.0, 0.0,
];

#[derive(Debug, Serialize, PartialEq)]
pub struct SystemTotals {
    pub months_included: [MonthKey; 3],
    pub lighting_system: f64,
    pub air_conditioning_system: f64,
    pub other_electrical_systems: f64,
}

#[derive(Serialize)]
pub struct QuarterlyResp {
    pub quarterly_summary: Buckets<Quarter, SystemTotals>,
}

#[derive(Debug, Serialize)]
pub struct EuiReport {
    pub year: i32,
    pub month_name_th: &'static str,
    pub building_area_m2: f64,
    pub total_energy_kwh: f64,
    pub eui_kwh_per_m2: f64,
}

#[derive(Serialize)]
pub struct EuiResp {
    pub eui_report: EuiReport,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct YearlyMonth {
    pub month_name_th: &'static str,
    /// Unix seconds at local midnight on the 1st, Bangkok time
    pub timestamp: i64,
    pub last_year_energy_used: f64,
    pub current_year_energy_used: f64,
}

#[derive(Serialize)]
pub struct YearlyResp {
    pub energy_yearly_comparison: Vec<YearlyMonth>,
    pub econ: f64,
}

#[derive(Serialize)]
pub struct SolarResp {
    pub solar_energy_generated_kwh: f64,
    pub solar_energy_unit: &'static str,
    pub current_month: String,
}

#[derive(Debug, Serialize)]
pub struct EnergyCard {
    pub key: &'static str,
    pub title_th: &'static str,
    pub value_kwh: f64,
    pub value_display: &'static str,
    pub unit: &'static str,
    pub change_percent: f64,
    pub direction: &'static str,
    pub compare_to_th: &'static str,
}

#[derive(Serialize)]
pub struct WidgetResp {
    pub updated_at: DateTime<Utc>,
    pub widgets: Vec<EnergyCard>,
}

pub fn quarterly_report(today: NaiveDate) -> QuarterlyResp {
    let summary = Quarter::latest_four(Quarter::of(today))
        .into_iter()
        .map(|q| {
            (
                q,
                SystemTotals {
                    months_included: q.months(),
                    lighting_system: 0.0,
                    air_conditioning_system: 0.0,
                    other_electrical_systems: 0.0,
                },
            )
        })
        .collect();
    QuarterlyResp { quarterly_summary: Buckets(summary) }
}

/// EUI = total energy (kWh) / building area (m²); zero while the area is unknown.
pub fn eui_report(today: NaiveDate) -> EuiReport {
    let building_area_m2 = 0.0;
    let total_energy_kwh = 0.0;
    let eui_kwh_per_m2 = if building_area_m2 > 0.0 {
        total_energy_kwh / building_area_m2
    } else {
        0.0
    };
    EuiReport {
        year: today.year(),
        month_name_th: thai_month_name(today.month()),
        building_area_m2,
        total_energy_kwh,
        eui_kwh_per_m2,
    }
}

fn month_start_bkk(year: i32, month: u32) -> i64 {
    FixedOffset::east_opt(BKK_OFFSET_SECS)
        .and_then(|tz| tz.with_ymd_and_hms(year, month, 1, 0, 0, 0).single())
        .map(|dt| dt.timestamp())
        .unwrap_or_default()
}

/// January through the current month, this year against last year.
pub fn yearly_report(today: NaiveDate) -> YearlyResp {
    let energy_yearly_comparison = (1..=today.month())
        .map(|m| {
            let i = (m - 1) as usize;
            YearlyMonth {
                month_name_th: thai_month_name(m),
                timestamp: month_start_bkk(today.year(), m),
                last_year_energy_used: round1(SAMPLE_LAST_YEAR_KWH[i]),
                current_year_energy_used: round1(SAMPLE_CURRENT_YEAR_KWH[i]),
            }
        })
        .collect();
    YearlyResp { energy_yearly_comparison, econ: ECON_TARGET_KWH }
}

fn sample_cards() -> Vec<EnergyCard> {
    let card = |key, title_th, value_kwh, value_display, change_percent| EnergyCard {
        key,
        title_th,
        value_kwh,
        value_display,
        unit: "kWh",
        change_percent,
        direction: "up",
        compare_to_th: "จากปีที่แล้ว",
    };
    vec![
        card("building", "พลังงานรวมทั้งอาคาร", 1_500_621.3, "1,500,621.3", 8.5),
        card("hvac", "พลังงานประเภทระบบปรับอากาศ", 828_305.9, "828,305.9", 49.0),
        card("lighting", "พลังงานประเภทระบบแสงสว่าง", 238_225.7, "238,225.7", 66.1),
    ]
}

/// GET /api/v1/energy_consumption/energy-floors
pub async fn floors() -> Json<FloorsResp> {
    Json(FloorsResp::placeholder(MonthKey::from_date(today()).prev()))
}

/// GET /api/v1/energy_consumption/energy-latest_four-quarterly
pub async fn latest_four_quarterly() -> Json<QuarterlyResp> {
    Json(quarterly_report(today()))
}

/// GET /api/v1/energy_consumption/energy-eui
pub async fn eui() -> Json<EuiResp> {
    Json(EuiResp { eui_report: eui_report(today()) })
}

/// GET /api/v1/energy_consumption/energy-yearly-comparison
pub async fn yearly_comparison() -> Json<YearlyResp> {
    Json(yearly_report(today()))
}

/// GET /api/v1/energy_consumption/energy-solar
pub async fn solar() -> Json<SolarResp> {
    Json(SolarResp {
        solar_energy_generated_kwh: 0.0,
        solar_energy_unit: "kWh",
        current_month: String::new(),
    })
}

/// GET /api/v1/energy_consumption/widget
pub async fn widget() -> Json<WidgetResp> {
    Json(WidgetResp { updated_at: Utc::now(), widgets: sample_cards() })
}

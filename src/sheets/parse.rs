// src/sheets/parse.rs
//
// CSV export → normalized `Record`s. Row-level problems never fail the parse:
// bad numbers become zero, bad dates stay as typed, blank and total rows are
// dropped.

use chrono::{Datelike, Duration, NaiveDate};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, warn};

use super::mappings::canonical_name;
use crate::models::Record;

pub fn parse_records(text: &str) -> Vec<Record> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let names: Vec<String> = match reader.headers() {
        Ok(headers) => headers.iter().map(|h| canonical_name(h).to_string()).collect(),
        Err(e) => {
            warn!("unreadable CSV header: {e}");
            return Vec::new();
        }
    };

    let mut out = Vec::new();
    let mut dropped = 0usize;
    for (line, result) in reader.records().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!(line = line + 2, "skipping unreadable CSV row: {e}");
                continue;
            }
        };
        match normalize_row(&names, &row) {
            Some(record) => out.push(record),
            None => dropped += 1,
        }
    }

    debug!(kept = out.len(), dropped, "parsed sheet rows");
    out
}

/// Labels `row` positionally with `names`; `None` for total and blank rows.
fn normalize_row(names: &[String], row: &StringRecord) -> Option<Record> {
    let mut rec = Record::default();

    for (name, value) in names.iter().zip(row.iter()) {
        match name.as_str() {
            "date" => rec.date = Some(normalize_date(value)),
            "submitted_by" => rec.submitted_by = Some(value.to_string()),
            "floor" => rec.floor = Some(value.to_string()),
            "general_waste_kg" => rec.general_waste_kg = parse_lenient(value),
            "organic_waste_kg" => rec.organic_waste_kg = parse_lenient(value),
            "recycle_waste_kg" => rec.recycle_waste_kg = parse_lenient(value),
            "hazardous_waste_kg" => rec.hazardous_waste_kg = parse_lenient(value),
            "total_waste_kg" => rec.total_waste_kg = parse_lenient(value),
            "landfill_waste_kg" => rec.landfill_waste_kg = parse_lenient(value),
            "carbon_emission_kgco2e" => rec.carbon_emission_kgco2e = parse_lenient(value),
            other => {
                rec.extra.insert(other.to_string(), value.to_string());
            }
        }
    }

    if rec.floor.as_deref().is_some_and(is_totals_floor) || rec.is_blank() {
        return None;
    }
    Some(rec)
}

/// `รวม`, or `ALL` in any case, marks a sum-of-floors row.
pub fn is_totals_floor(raw: &str) -> bool {
    let t = raw.trim();
    t == "รวม" || t.eq_ignore_ascii_case("all")
}

/// `d/m/y` → `YYYY-MM-DD`. Out-of-range days and months roll over into the
/// following month/year. Anything else is returned unchanged.
pub fn normalize_date(raw: &str) -> String {
    to_iso_date(raw).unwrap_or_else(|| raw.to_string())
}

fn to_iso_date(raw: &str) -> Option<String> {
    let mut parts = raw.split('/').map(|p| p.trim().parse::<i64>().ok());
    let day = parts.next()??;
    let month = parts.next()??;
    let year = parts.next()??;

    let months_since_zero = year.checked_mul(12)?.checked_add(month.checked_sub(1)?)?;
    let y = i32::try_from(months_since_zero.div_euclid(12)).ok()?;
    let m = u32::try_from(months_since_zero.rem_euclid(12) + 1).ok()?;

    let date = NaiveDate::from_ymd_opt(y, m, 1)?.checked_add_signed(Duration::try_days(day.checked_sub(1)?)?)?;
    Some(date.format("%Y-%m-%d").to_string())
}

/// Thousands separators are stripped; anything that is not a finite number
/// is rejected.
pub fn parse_strict(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    cleaned.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Like `parse_strict`, but failures read as zero.
pub fn parse_lenient(raw: &str) -> f64 {
    parse_strict(raw).unwrap_or(0.0)
}

/// Keeps rows dated in `month`/`year`; only applied when both are given.
pub fn filter_by_month(records: &[Record], month: Option<u32>, year: Option<i32>) -> Option<Vec<Record>> {
    let (month, year) = (month?, year?);
    Some(
        records
            .iter()
            .filter(|r| r.day().is_some_and(|d| d.month() == month && d.year() == year))
            .cloned()
            .collect(),
    )
}

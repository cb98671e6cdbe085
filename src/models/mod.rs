// src/models/mod.rs

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::period::MonthKey;

// ───────────────────────────────────────
// Sheet rows
// ───────────────────────────────────────

/// One normalized row of the waste sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>, // YYYY-MM-DD, or the raw value if it did not parse
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    pub general_waste_kg: f64,
    pub organic_waste_kg: f64,
    pub recycle_waste_kg: f64,
    pub hazardous_waste_kg: f64,
    pub total_waste_kg: f64,
    pub landfill_waste_kg: f64,
    pub carbon_emission_kgco2e: f64,
    /// Columns without a canonical name, keyed by their original header.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Record {
    pub fn day(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?;
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }

    pub fn month_key(&self) -> Option<MonthKey> {
        self.day().map(MonthKey::from_date)
    }

    fn numbers(&self) -> [f64; 7] {
        [
            self.general_waste_kg,
            self.organic_waste_kg,
            self.recycle_waste_kg,
            self.hazardous_waste_kg,
            self.total_waste_kg,
            self.landfill_waste_kg,
            self.carbon_emission_kgco2e,
        ]
    }

    /// True when nothing meaningful was entered on the row.
    pub fn is_blank(&self) -> bool {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        let floor_blank = match self.floor.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(f) => f.parse::<f64>().map_or(false, |n| n == 0.0),
        };

        blank(&self.date)
            && blank(&self.submitted_by)
            && floor_blank
            && self.numbers().iter().all(|n| *n == 0.0)
    }
}

// ───────────────────────────────────────
// Cache request / result
// ───────────────────────────────────────

/// Which tab to read and how to narrow it. The sheet itself always comes from
/// configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RowQuery {
    pub gid: Option<String>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl RowQuery {
    pub fn for_tab(gid: Option<String>) -> Self {
        Self { gid, ..Self::default() }
    }
}

#[derive(Debug, Clone)]
pub struct FetchedRows {
    pub records: Arc<Vec<Record>>,
    pub fetched_at: DateTime<Utc>,
    pub from_cache: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_row_detection() {
        assert!(Record::default().is_blank());
        assert!(Record { floor: Some("0".into()), ..Record::default() }.is_blank());

        let with_weight = Record { general_waste_kg: 1.5, ..Record::default() };
        assert!(!with_weight.is_blank());

        let with_floor = Record { floor: Some("Roof".into()), ..Record::default() };
        assert!(!with_floor.is_blank());
    }

    #[test]
    fn day_requires_canonical_date() {
        let ok = Record { date: Some("2025-06-15".into()), ..Record::default() };
        assert_eq!(ok.day(), NaiveDate::from_ymd_opt(2025, 6, 15));

        let raw = Record { date: Some("soon".into()), ..Record::default() };
        assert_eq!(raw.day(), None);
    }

    #[test]
    fn extra_columns_flatten_into_json() {
        let mut r = Record { date: Some("2025-06-15".into()), ..Record::default() };
        r.extra.insert("note".into(), "late".into());
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["note"], "late");
        assert_eq!(v["date"], "2025-06-15");
        assert!(v.get("floor").is_none());
    }
}

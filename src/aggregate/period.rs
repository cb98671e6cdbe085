// src/aggregate/period.rs
//
// Calendar month and quarter keys used to bucket sheet rows.

use std::{collections::BTreeSet, fmt};

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

use crate::models::Record;

/// How far back `latest_distinct_months` walks before giving up.
const MAX_MONTH_STEPS: usize = 24;

pub const THAI_MONTH_NAMES: [&str; 12] = [
    "มกราคม",
    "กุมภาพันธ์",
    "มีนาคม",
    "เมษายน",
    "พฤษภาคม",
    "มิถุนายน",
    "กรกฎาคม",
    "สิงหาคม",
    "กันยายน",
    "ตุลาคม",
    "พฤศจิกายน",
    "ธันวาคม",
];

// ─────────────────────────────────────────────────────────────────────────────
// Months
// ─────────────────────────────────────────────────────────────────────────────

/// A calendar month, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32, // 1..=12
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        debug_assert!((1..=12).contains(&month));
        Self { year, month }
    }

    pub fn from_date(d: NaiveDate) -> Self {
        Self::new(d.year(), d.month())
    }

    pub fn prev(self) -> Self {
        if self.month > 1 {
            Self::new(self.year, self.month - 1)
        } else {
            Self::new(self.year - 1, 12)
        }
    }

    pub fn quarter(self) -> Quarter {
        Quarter::new(self.year, quarter_of_month(self.month))
    }

    pub fn thai_name(self) -> &'static str {
        thai_month_name(self.month)
    }

    /// Thai month name followed by the Buddhist-era year, e.g. `กันยายน 2568`.
    pub fn thai_label(self) -> String {
        format!("{} {}", self.thai_name(), self.year + 543)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

pub fn thai_month_name(month: u32) -> &'static str {
    THAI_MONTH_NAMES
        .get(month.wrapping_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

/// `n` consecutive months ending at `anchor`, oldest first.
pub fn trailing_months(anchor: MonthKey, n: usize) -> Vec<MonthKey> {
    let mut out = Vec::with_capacity(n);
    let mut cur = anchor;
    for _ in 0..n {
        out.push(cur);
        cur = cur.prev();
    }
    out.reverse();
    out
}

/// The `n` most recent months that actually have rows, found by stepping back
/// from the latest row date. Returns fewer than `n` when history runs out.
pub fn latest_distinct_months(records: &[Record], n: usize) -> BTreeSet<MonthKey> {
    let mut present = BTreeSet::new();
    let mut max_date: Option<NaiveDate> = None;

    for d in records.iter().filter_map(Record::day) {
        present.insert(MonthKey::from_date(d));
        if max_date.map_or(true, |mx| d > mx) {
            max_date = Some(d);
        }
    }

    let mut wanted = BTreeSet::new();
    let Some(max_date) = max_date else {
        return wanted;
    };

    let mut cur = MonthKey::from_date(max_date);
    for _ in 0..MAX_MONTH_STEPS {
        if wanted.len() >= n {
            break;
        }
        if present.contains(&cur) {
            wanted.insert(cur);
        }
        cur = cur.prev();
    }
    wanted
}

pub fn filter_by_months<'a>(records: &'a [Record], months: &BTreeSet<MonthKey>) -> Vec<&'a Record> {
    if months.is_empty() {
        return Vec::new();
    }
    records
        .iter()
        .filter(|r| r.month_key().is_some_and(|k| months.contains(&k)))
        .collect()
}

pub fn max_date(records: &[Record]) -> Option<NaiveDate> {
    records.iter().filter_map(Record::day).max()
}

// ─────────────────────────────────────────────────────────────────────────────
// Quarters
// ─────────────────────────────────────────────────────────────────────────────

pub fn quarter_of_month(month: u32) -> u32 {
    (month.clamp(1, 12) - 1) / 3 + 1
}

/// A calendar quarter, rendered as `Q{n}/{year}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quarter {
    pub year: i32,
    pub quarter: u32, // 1..=4
}

impl Quarter {
    pub fn new(year: i32, quarter: u32) -> Self {
        debug_assert!((1..=4).contains(&quarter));
        Self { year, quarter }
    }

    pub fn of(d: NaiveDate) -> Self {
        MonthKey::from_date(d).quarter()
    }

    pub fn prev(self) -> Self {
        if self.quarter > 1 {
            Self::new(self.year, self.quarter - 1)
        } else {
            Self::new(self.year - 1, 4)
        }
    }

    pub fn months(self) -> [MonthKey; 3] {
        let first = (self.quarter - 1) * 3 + 1;
        [0, 1, 2].map(|offset| MonthKey::new(self.year, first + offset))
    }

    /// The four quarters ending at `anchor`, oldest first.
    pub fn latest_four(anchor: Quarter) -> [Quarter; 4] {
        let q3 = anchor.prev();
        let q2 = q3.prev();
        let q1 = q2.prev();
        [q1, q2, q3, anchor]
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}/{}", self.quarter, self.year)
    }
}

impl Serialize for Quarter {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dated(date: &str) -> Record {
        Record {
            date: Some(date.to_string()),
            general_waste_kg: 1.0,
            ..Record::default()
        }
    }

    #[test]
    fn month_key_formats_and_steps_back() {
        let jan = MonthKey::new(2025, 1);
        assert_eq!(jan.to_string(), "2025-01");
        assert_eq!(jan.prev(), MonthKey::new(2024, 12));
        assert_eq!(MonthKey::new(2025, 9).thai_label(), "กันยายน 2568");
    }

    #[test]
    fn quarter_mapping() {
        assert_eq!(quarter_of_month(1), 1);
        assert_eq!(quarter_of_month(3), 1);
        assert_eq!(quarter_of_month(4), 2);
        assert_eq!(quarter_of_month(12), 4);
        assert_eq!(Quarter::new(2025, 3).to_string(), "Q3/2025");
    }

    #[test]
    fn previous_quarter_crosses_year() {
        assert_eq!(Quarter::new(2025, 1).prev(), Quarter::new(2024, 4));
        assert_eq!(Quarter::new(2025, 3).prev(), Quarter::new(2025, 2));
    }

    #[test]
    fn latest_four_is_oldest_first() {
        let keys: Vec<String> = Quarter::latest_four(Quarter::new(2025, 3))
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(keys, ["Q4/2024", "Q1/2025", "Q2/2025", "Q3/2025"]);
    }

    #[test]
    fn quarter_months() {
        let months: Vec<String> = Quarter::new(2024, 4).months().iter().map(ToString::to_string).collect();
        assert_eq!(months, ["2024-10", "2024-11", "2024-12"]);
    }

    #[test]
    fn latest_months_skip_gaps() {
        let rows = vec![dated("2025-04-10"), dated("2025-06-02"), dated("2025-06-20")];
        let got = latest_distinct_months(&rows, 2);
        let expected: BTreeSet<_> = [MonthKey::new(2025, 4), MonthKey::new(2025, 6)].into();
        assert_eq!(got, expected);
    }

    #[test]
    fn latest_months_short_history() {
        let rows = vec![dated("2025-06-02"), Record { date: Some("bad".into()), ..Record::default() }];
        assert_eq!(latest_distinct_months(&rows, 2).len(), 1);
        assert!(latest_distinct_months(&[], 2).is_empty());
    }

    #[test]
    fn latest_months_stop_after_two_years() {
        let rows = vec![dated("2022-01-01"), dated("2025-06-01")];
        let got = latest_distinct_months(&rows, 2);
        assert_eq!(got.len(), 1);
        assert!(got.contains(&MonthKey::new(2025, 6)));
    }

    #[test]
    fn trailing_months_cross_year() {
        let months: Vec<String> = trailing_months(MonthKey::new(2025, 2), 3)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(months, ["2024-12", "2025-01", "2025-02"]);
    }

    #[test]
    fn filter_keeps_only_wanted_months() {
        let rows = vec![dated("2025-04-10"), dated("2025-05-10"), dated("2025-06-10")];
        let wanted: BTreeSet<_> = [MonthKey::new(2025, 4), MonthKey::new(2025, 6)].into();
        let kept = filter_by_months(&rows, &wanted);
        assert_eq!(kept.len(), 2);
        assert!(filter_by_months(&rows, &BTreeSet::new()).is_empty());
    }
}

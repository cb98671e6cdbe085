// src/aggregate/rollup.rs
//
// Sums, deltas and rounding over sheet rows. Everything here is pure.

use std::fmt::Display;

use serde::{ser::SerializeMap, Serialize, Serializer};

use super::period::{MonthKey, Quarter};
use crate::models::Record;

// ─────────────────────────────────────────────────────────────────────────────
// Rounding
// ─────────────────────────────────────────────────────────────────────────────

/// Rounds half toward positive infinity (2.5 → 3, -2.5 → -2).
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

pub fn round1(x: f64) -> f64 {
    round_half_up(x * 10.0) / 10.0
}

pub fn round2(x: f64) -> f64 {
    round_half_up(x * 100.0) / 100.0
}

/// Rounds up to one decimal place.
pub fn ceil1(x: f64) -> f64 {
    (x * 10.0).ceil() / 10.0
}

// ─────────────────────────────────────────────────────────────────────────────
// Totals
// ─────────────────────────────────────────────────────────────────────────────

/// Uses `explicit` when it is positive, otherwise the sum of `components`.
pub fn resolve_total(explicit: f64, components: &[f64]) -> f64 {
    if explicit > 0.0 {
        explicit
    } else {
        components.iter().sum()
    }
}

impl Record {
    pub fn resolved_total_waste(&self) -> f64 {
        resolve_total(
            self.total_waste_kg,
            &[
                self.general_waste_kg,
                self.organic_waste_kg,
                self.recycle_waste_kg,
                self.hazardous_waste_kg,
            ],
        )
    }

    /// Landfill falls back to the non-recoverable categories.
    pub fn resolved_landfill(&self) -> f64 {
        resolve_total(
            self.landfill_waste_kg,
            &[self.general_waste_kg, self.hazardous_waste_kg],
        )
    }
}

/// A numeric column of the waste sheet. `Total` and `Landfill` read through
/// the fallback-then-sum rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    General,
    Organic,
    Recycle,
    Hazardous,
    Total,
    Landfill,
    Carbon,
}

impl Field {
    pub fn value(self, r: &Record) -> f64 {
        match self {
            Field::General => r.general_waste_kg,
            Field::Organic => r.organic_waste_kg,
            Field::Recycle => r.recycle_waste_kg,
            Field::Hazardous => r.hazardous_waste_kg,
            Field::Total => r.resolved_total_waste(),
            Field::Landfill => r.resolved_landfill(),
            Field::Carbon => r.carbon_emission_kgco2e,
        }
    }
}

/// Sums `field` per month of interest. Months with no rows sum to zero.
pub fn sum_by_month<'a, I>(records: I, months: &[MonthKey], field: Field) -> Vec<(MonthKey, f64)>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut sums: Vec<(MonthKey, f64)> = months.iter().map(|m| (*m, 0.0)).collect();
    for r in records {
        let Some(key) = r.month_key() else { continue };
        if let Some(slot) = sums.iter_mut().find(|(m, _)| *m == key) {
            slot.1 += field.value(r);
        }
    }
    sums
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuarterTotals {
    /// Months of the quarter that have at least one row, oldest first.
    pub months_included: Vec<MonthKey>,
    pub total_general_waste_kg: f64,
    pub total_organic_waste_kg: f64,
    pub total_recycle_waste_kg: f64,
    pub total_hazardous_waste_kg: f64,
    pub total_landfill_waste_kg: f64,
    pub total_waste_kg: f64,
    pub total_carbon_emission_kgco2e: f64,
}

impl QuarterTotals {
    fn add(&mut self, month: MonthKey, r: &Record) {
        if let Err(pos) = self.months_included.binary_search(&month) {
            self.months_included.insert(pos, month);
        }
        self.total_general_waste_kg += r.general_waste_kg;
        self.total_organic_waste_kg += r.organic_waste_kg;
        self.total_recycle_waste_kg += r.recycle_waste_kg;
        self.total_hazardous_waste_kg += r.hazardous_waste_kg;
        self.total_landfill_waste_kg += r.resolved_landfill();
        self.total_waste_kg += r.resolved_total_waste();
        self.total_carbon_emission_kgco2e += r.carbon_emission_kgco2e;
    }
}

/// Buckets rows into the given quarters; rows outside them are ignored.
pub fn sum_by_quarter<'a, I>(records: I, quarters: &[Quarter]) -> Vec<(Quarter, QuarterTotals)>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut acc: Vec<(Quarter, QuarterTotals)> =
        quarters.iter().map(|q| (*q, QuarterTotals::default())).collect();
    for r in records {
        let Some(month) = r.month_key() else {
            tracing::debug!(date = ?r.date, "skipping row without a usable date");
            continue;
        };
        if let Some((_, totals)) = acc.iter_mut().find(|(q, _)| *q == month.quarter()) {
            totals.add(month, r);
        }
    }
    acc
}

// ─────────────────────────────────────────────────────────────────────────────
// Deltas
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    pub fn of(delta: f64) -> Self {
        if delta > 0.0 {
            Direction::Up
        } else if delta < 0.0 {
            Direction::Down
        } else {
            Direction::Flat
        }
    }
}

/// `(curr - prev) / prev * 100`, or `None` when `prev` is exactly zero.
pub fn percent_change(prev: f64, curr: f64) -> Option<f64> {
    if prev == 0.0 {
        None
    } else {
        Some((curr - prev) / prev * 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Delta {
    pub diff: f64,
    pub pct_change: Option<f64>,
    pub direction: Direction,
}

impl Delta {
    pub fn between(prev: f64, curr: f64) -> Self {
        let diff = curr - prev;
        Self {
            diff,
            pct_change: percent_change(prev, curr),
            direction: Direction::of(diff),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ordered JSON objects
// ─────────────────────────────────────────────────────────────────────────────

/// Serializes as a JSON object whose keys keep the order of the vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Buckets<K, V>(pub Vec<(K, V)>);

impl<K: Display, V: Serialize> Serialize for Buckets<K, V> {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(&k.to_string(), v)?;
        }
        map.end()
    }
}

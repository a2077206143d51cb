use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use serde::Serialize;

use super::model::DatasetView;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// The headline metrics shown at the top of the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Kpis {
    pub total_collisions: u64,
    pub total_injuries: u64,
    pub total_fatalities: u64,
}

/// Per-borough injury and fatality sums.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BoroughTotals {
    pub injuries: u64,
    pub fatalities: u64,
}

/// Time bucket for [`time_series`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Hour,
    Week,
    Month,
    Year,
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hour" => Ok(TimeUnit::Hour),
            "week" => Ok(TimeUnit::Week),
            "month" => Ok(TimeUnit::Month),
            "year" => Ok(TimeUnit::Year),
            other => Err(format!(
                "unknown time unit '{other}' (expected hour, week, month or year)"
            )),
        }
    }
}

/// Canonical order of the breakdown bars: pedestrians, cyclists, motorists,
/// injured before killed for each.
pub const GROUP_LABELS: [&str; 6] = [
    "Pedestrians Injured",
    "Pedestrians Killed",
    "Cyclists Injured",
    "Cyclists Killed",
    "Motorists Injured",
    "Motorists Killed",
];

// ---------------------------------------------------------------------------
// Reductions
// ---------------------------------------------------------------------------
//
// All pure, integer-arithmetic reads over a view. A sum over zero rows is
// zero, never missing, so every combination of interactive filters stays
// renderable.

/// Headline metrics: row count plus persons injured/killed sums.
pub fn kpis(view: &DatasetView) -> Kpis {
    let mut total_injuries = 0u64;
    let mut total_fatalities = 0u64;
    for record in view.records() {
        total_injuries += u64::from(record.persons_injured);
        total_fatalities += u64::from(record.persons_killed);
    }
    Kpis {
        total_collisions: view.len() as u64,
        total_injuries,
        total_fatalities,
    }
}

/// Sums of the six road-user sub-columns, in [`GROUP_LABELS`] order.
///
/// These are reported independently of the `persons_*` KPI columns; the
/// source data does not guarantee they reconcile.
pub fn group_breakdown(view: &DatasetView) -> Vec<(&'static str, u64)> {
    let mut totals = [0u64; 6];
    for record in view.records() {
        totals[0] += u64::from(record.pedestrians_injured);
        totals[1] += u64::from(record.pedestrians_killed);
        totals[2] += u64::from(record.cyclists_injured);
        totals[3] += u64::from(record.cyclists_killed);
        totals[4] += u64::from(record.motorists_injured);
        totals[5] += u64::from(record.motorists_killed);
    }
    GROUP_LABELS.iter().copied().zip(totals).collect()
}

/// Row counts bucketed by the chosen calendar unit, ascending by unit
/// value. Rows missing that unit are left out entirely.
pub fn time_series(view: &DatasetView, unit: TimeUnit) -> Vec<(i32, u64)> {
    let mut counts: BTreeMap<i32, u64> = BTreeMap::new();
    for record in view.records() {
        let value = match unit {
            TimeUnit::Hour => record.hour.map(|h| h as i32),
            TimeUnit::Week => record.week.map(|w| w as i32),
            TimeUnit::Month => record.month.map(|m| m as i32),
            TimeUnit::Year => record.year,
        };
        if let Some(v) = value {
            *counts.entry(v).or_insert(0) += 1;
        }
    }
    counts.into_iter().collect()
}

/// The `n` most frequent contributing factors, descending by count. Ties
/// keep the order the factors first appear in the view; rows without a
/// factor are skipped.
pub fn top_factors(view: &DatasetView, n: usize) -> Vec<(String, u64)> {
    let mut first_seen: Vec<String> = Vec::new();
    let mut counts: HashMap<String, u64> = HashMap::new();
    for record in view.records() {
        if let Some(factor) = &record.vehicle_factor {
            if !counts.contains_key(factor) {
                first_seen.push(factor.clone());
            }
            *counts.entry(factor.clone()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, u64)> = first_seen
        .into_iter()
        .map(|factor| {
            let count = counts.get(&factor).copied().unwrap_or(0);
            (factor, count)
        })
        .collect();
    // Stable sort keeps first-encountered order within equal counts.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(n);
    ranked
}

/// Injury and fatality sums grouped by borough. Boroughs with no rows in
/// the view are omitted rather than emitted as zeros.
pub fn borough_comparison(view: &DatasetView) -> BTreeMap<String, BoroughTotals> {
    let mut totals: BTreeMap<String, BoroughTotals> = BTreeMap::new();
    for record in view.records() {
        if let Some(borough) = &record.borough {
            let entry = totals.entry(borough.clone()).or_default();
            entry.injuries += u64::from(record.persons_injured);
            entry.fatalities += u64::from(record.persons_killed);
        }
    }
    totals
}

/// The (latitude, longitude) pairs of rows carrying both coordinates, in
/// view order, optionally capped for map rendering.
pub fn spatial_points(view: &DatasetView, limit: Option<usize>) -> Vec<(f64, f64)> {
    let mut points = Vec::new();
    for record in view.records() {
        if let Some(point) = record.coordinates() {
            points.push(point);
            if limit.is_some_and(|cap| points.len() >= cap) {
                break;
            }
        }
    }
    points
}

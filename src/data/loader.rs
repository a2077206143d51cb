use std::fs::File;
use std::io;
use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use log::{debug, info};
use thiserror::Error;

use super::model::{CollisionDataset, CollisionRecord};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Fatal load failures. Per-row problems never end up here: a malformed
/// cell degrades to a missing field and loading continues.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("required column(s) missing: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

// ---------------------------------------------------------------------------
// Column layout
// ---------------------------------------------------------------------------

/// Columns that must be present for a load to succeed.
pub const REQUIRED_COLUMNS: [&str; 3] = ["DATE", "TIME", "BOROUGH"];

/// Accepted date formats. Public exports use `MM/DD/YYYY`; re-imports of
/// our own exports and hand-edited files tend to use ISO.
const DATE_FORMATS: [&str; 3] = ["%m/%d/%Y", "%Y-%m-%d", "%m/%d/%y"];
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// Positions of the known columns in the (trimmed) header row.
/// Optional columns stay `None` and every dependent field degrades to
/// missing/zero for the whole load.
struct ColumnIndex {
    date: Option<usize>,
    time: Option<usize>,
    borough: Option<usize>,
    vehicle_type: Option<usize>,
    vehicle_factor: Option<usize>,
    persons_injured: Option<usize>,
    persons_killed: Option<usize>,
    pedestrians_injured: Option<usize>,
    pedestrians_killed: Option<usize>,
    cyclists_injured: Option<usize>,
    cyclists_killed: Option<usize>,
    motorists_injured: Option<usize>,
    motorists_killed: Option<usize>,
    latitude: Option<usize>,
    longitude: Option<usize>,
}

impl ColumnIndex {
    fn new(headers: &[String]) -> Self {
        let find = |name: &str| headers.iter().position(|h| h == name);
        ColumnIndex {
            date: find("DATE"),
            time: find("TIME"),
            borough: find("BOROUGH"),
            vehicle_type: find("VEHICLE 1 TYPE"),
            vehicle_factor: find("VEHICLE 1 FACTOR"),
            persons_injured: find("PERSONS INJURED"),
            persons_killed: find("PERSONS KILLED"),
            pedestrians_injured: find("PEDESTRIANS INJURED"),
            pedestrians_killed: find("PEDESTRIANS KILLED"),
            cyclists_injured: find("CYCLISTS INJURED"),
            cyclists_killed: find("CYCLISTS KILLED"),
            motorists_injured: find("MOTORISTS INJURED"),
            motorists_killed: find("MOTORISTS KILLED"),
            latitude: find("LATITUDE"),
            longitude: find("LONGITUDE"),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a collision dataset from a file on disk.
pub fn load_path(path: &Path) -> Result<CollisionDataset, LoadError> {
    let file = File::open(path)?;
    load_reader(file)
}

/// Load a collision dataset from any byte stream (uploads, in-memory CSV).
///
/// Headers are trimmed before any lookup. The reader runs in flexible mode:
/// ragged rows are padded with missing fields instead of failing the load.
pub fn load_reader<R: io::Read>(reader: R) -> Result<CollisionDataset, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| !headers.iter().any(|h| h == *name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns(missing));
    }

    let columns = ColumnIndex::new(&headers);
    let mut records = Vec::new();
    for (row_no, result) in csv_reader.records().enumerate() {
        let row = result?;
        records.push(parse_record(&row, &columns, headers.len(), row_no));
    }

    info!(
        "loaded {} collision records across {} columns",
        records.len(),
        headers.len()
    );
    Ok(CollisionDataset::from_records(headers, records))
}

// ---------------------------------------------------------------------------
// Row parsing
// ---------------------------------------------------------------------------

fn parse_record(
    row: &csv::StringRecord,
    columns: &ColumnIndex,
    width: usize,
    row_no: usize,
) -> CollisionRecord {
    let cell = |idx: Option<usize>| -> Option<&str> {
        idx.and_then(|i| row.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };
    let count = |idx: Option<usize>| -> u32 {
        cell(idx).and_then(|s| s.parse().ok()).unwrap_or(0)
    };
    let coordinate = |idx: Option<usize>| -> Option<f64> {
        cell(idx)
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|v| v.is_finite())
    };

    let date = cell(columns.date).and_then(|s| {
        let parsed = parse_date(s);
        if parsed.is_none() {
            debug!("row {row_no}: unparseable date {s:?}");
        }
        parsed
    });
    let time = cell(columns.time).and_then(|s| {
        let parsed = parse_time(s);
        if parsed.is_none() {
            debug!("row {row_no}: unparseable time {s:?}");
        }
        parsed
    });
    let datetime = match (date, time) {
        (Some(d), Some(t)) => Some(d.and_time(t)),
        _ => None,
    };

    let mut raw: Vec<String> = row.iter().map(str::to_string).collect();
    raw.resize(width, String::new());

    CollisionRecord {
        date,
        time,
        datetime,
        hour: datetime.map(|dt| dt.hour()),
        week: date.map(|d| d.iso_week().week()),
        month: date.map(|d| d.month()),
        year: date.map(|d| d.year()),
        borough: cell(columns.borough).map(str::to_string),
        vehicle_type: cell(columns.vehicle_type).map(str::to_string),
        vehicle_factor: cell(columns.vehicle_factor).map(str::to_string),
        persons_injured: count(columns.persons_injured),
        persons_killed: count(columns.persons_killed),
        pedestrians_injured: count(columns.pedestrians_injured),
        pedestrians_killed: count(columns.pedestrians_killed),
        cyclists_injured: count(columns.cyclists_injured),
        cyclists_killed: count(columns.cyclists_killed),
        motorists_injured: count(columns.motorists_injured),
        motorists_killed: count(columns.motorists_killed),
        latitude: coordinate(columns.latitude),
        longitude: coordinate(columns.longitude),
        raw,
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}

use std::collections::BTreeSet;
use std::fmt::Write as _;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

// ---------------------------------------------------------------------------
// CollisionRecord – one row of the source CSV
// ---------------------------------------------------------------------------

/// A single collision report (one row of the source file).
///
/// Every field except the counts is optional: a cell that is absent, blank
/// or unparseable is `None`, never an error. The count columns default to
/// zero instead, so sums over them are always defined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionRecord {
    /// Calendar date of the collision.
    pub date: Option<NaiveDate>,
    /// Local time of day.
    pub time: Option<NaiveTime>,
    /// Combined timestamp; present only when both `date` and `time` parsed.
    pub datetime: Option<NaiveDateTime>,

    // Derived at load time from `datetime` / `date`.
    pub hour: Option<u32>,
    /// ISO week number (1–53).
    pub week: Option<u32>,
    pub month: Option<u32>,
    pub year: Option<i32>,

    pub borough: Option<String>,
    pub vehicle_type: Option<String>,
    pub vehicle_factor: Option<String>,

    pub persons_injured: u32,
    pub persons_killed: u32,
    pub pedestrians_injured: u32,
    pub pedestrians_killed: u32,
    pub cyclists_injured: u32,
    pub cyclists_killed: u32,
    pub motorists_injured: u32,
    pub motorists_killed: u32,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Original cell text in header order, padded to header width.
    /// This is what export writes and what search matches against.
    pub raw: Vec<String>,
}

impl CollisionRecord {
    /// (latitude, longitude) when both are present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }

    /// Lower-cased haystack for substring search: every original cell plus
    /// the canonical renderings of the parsed date and timestamp.
    pub fn search_text(&self) -> String {
        let mut text = self.raw.join(" ");
        if let Some(date) = self.date {
            let _ = write!(text, " {}", date.format("%Y-%m-%d"));
        }
        if let Some(datetime) = self.datetime {
            let _ = write!(text, " {}", datetime.format("%Y-%m-%d %H:%M:%S"));
        }
        text.to_lowercase()
    }
}

// ---------------------------------------------------------------------------
// CollisionDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed value indices.
///
/// Immutable after load: filtering and searching hand out [`DatasetView`]s
/// (index subsets) instead of touching the records.
#[derive(Debug, Clone)]
pub struct CollisionDataset {
    /// All records in file order.
    pub records: Vec<CollisionRecord>,
    /// Trimmed header names in file order.
    pub headers: Vec<String>,
    /// Sorted unique non-missing boroughs (selector options).
    pub boroughs: BTreeSet<String>,
    /// Sorted unique non-missing vehicle types (selector options).
    pub vehicle_types: BTreeSet<String>,
    /// Earliest and latest non-missing date (date-picker bounds).
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
}

impl CollisionDataset {
    /// Build the value indices from loaded records.
    pub fn from_records(headers: Vec<String>, records: Vec<CollisionRecord>) -> Self {
        let mut boroughs = BTreeSet::new();
        let mut vehicle_types = BTreeSet::new();
        let mut date_bounds: Option<(NaiveDate, NaiveDate)> = None;

        for record in &records {
            if let Some(borough) = &record.borough {
                boroughs.insert(borough.clone());
            }
            if let Some(vehicle) = &record.vehicle_type {
                vehicle_types.insert(vehicle.clone());
            }
            if let Some(date) = record.date {
                date_bounds = Some(match date_bounds {
                    Some((min, max)) => (min.min(date), max.max(date)),
                    None => (date, date),
                });
            }
        }

        CollisionDataset {
            records,
            headers,
            boroughs,
            vehicle_types,
            date_bounds,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// A view over every record, in file order.
    pub fn full_view(&self) -> DatasetView<'_> {
        DatasetView::new(self, (0..self.records.len()).collect())
    }
}

// ---------------------------------------------------------------------------
// DatasetView – an ordered index subset of a dataset
// ---------------------------------------------------------------------------

/// A read-only, ordered subset of a dataset. Produced by the filter engine
/// and the search engine; consumed by the aggregator and the exporter.
#[derive(Debug, Clone)]
pub struct DatasetView<'a> {
    dataset: &'a CollisionDataset,
    indices: Vec<usize>,
}

impl<'a> DatasetView<'a> {
    pub fn new(dataset: &'a CollisionDataset, indices: Vec<usize>) -> Self {
        DatasetView { dataset, indices }
    }

    pub fn dataset(&self) -> &'a CollisionDataset {
        self.dataset
    }

    /// Record positions in the underlying dataset, in view order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn into_indices(self) -> Vec<usize> {
        self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate the records of this view, in view order.
    pub fn records(&self) -> impl Iterator<Item = &'a CollisionRecord> + '_ {
        self.indices.iter().map(move |&i| &self.dataset.records[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: Option<NaiveDate>, borough: Option<&str>) -> CollisionRecord {
        CollisionRecord {
            date,
            borough: borough.map(str::to_string),
            ..CollisionRecord::default()
        }
    }

    #[test]
    fn from_records_indexes_unique_values_and_date_bounds() {
        let jan = NaiveDate::from_ymd_opt(2021, 1, 5).unwrap();
        let mar = NaiveDate::from_ymd_opt(2021, 3, 9).unwrap();
        let dataset = CollisionDataset::from_records(
            vec!["DATE".into(), "BOROUGH".into()],
            vec![
                record(Some(mar), Some("QUEENS")),
                record(Some(jan), Some("BRONX")),
                record(None, None),
                record(Some(jan), Some("BRONX")),
            ],
        );

        assert_eq!(
            dataset.boroughs.iter().collect::<Vec<_>>(),
            ["BRONX", "QUEENS"]
        );
        assert!(dataset.vehicle_types.is_empty());
        assert_eq!(dataset.date_bounds, Some((jan, mar)));
    }

    #[test]
    fn coordinates_require_both_axes() {
        let mut record = CollisionRecord::default();
        assert_eq!(record.coordinates(), None);
        record.latitude = Some(40.7);
        assert_eq!(record.coordinates(), None);
        record.longitude = Some(-73.9);
        assert_eq!(record.coordinates(), Some((40.7, -73.9)));
    }

    #[test]
    fn search_text_includes_raw_cells_and_canonical_date() {
        let record = CollisionRecord {
            date: Some(NaiveDate::from_ymd_opt(2021, 1, 15).unwrap()),
            raw: vec!["01/15/2021".into(), "BRONX".into()],
            ..CollisionRecord::default()
        };
        let text = record.search_text();
        assert!(text.contains("bronx"));
        assert!(text.contains("01/15/2021"));
        assert!(text.contains("2021-01-15"));
    }

    #[test]
    fn view_iterates_in_index_order() {
        let dataset = CollisionDataset::from_records(
            vec!["BOROUGH".into()],
            vec![
                record(None, Some("A")),
                record(None, Some("B")),
                record(None, Some("C")),
            ],
        );
        let view = DatasetView::new(&dataset, vec![2, 0]);
        let boroughs: Vec<_> = view
            .records()
            .map(|r| r.borough.as_deref().unwrap())
            .collect();
        assert_eq!(boroughs, ["C", "A"]);
    }
}

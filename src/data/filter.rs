use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::{CollisionDataset, CollisionRecord, DatasetView};

// ---------------------------------------------------------------------------
// FilterSpec – the user's current selection
// ---------------------------------------------------------------------------

/// The conjunction of predicates a view is built from.
///
/// The two membership sets are deliberately asymmetric, matching the
/// dashboard widgets they back:
/// * `boroughs` is a strict selection — an empty set selects nothing.
/// * `vehicle_types` is an opt-in narrowing — an empty set means the
///   filter is inactive and every row passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    /// Inclusive date range; `None` disables date filtering.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub boroughs: BTreeSet<String>,
    pub vehicle_types: BTreeSet<String>,
}

impl FilterSpec {
    /// The dashboards' initial selection: every borough, no date or
    /// vehicle constraint.
    pub fn all_boroughs(dataset: &CollisionDataset) -> Self {
        FilterSpec {
            date_range: None,
            boroughs: dataset.boroughs.clone(),
            vehicle_types: BTreeSet::new(),
        }
    }

    fn matches(&self, record: &CollisionRecord) -> bool {
        if let Some((start, end)) = self.date_range {
            match record.date {
                Some(date) => {
                    if date < start || date > end {
                        return false;
                    }
                }
                // Missing dates are excluded whenever a date filter is active.
                None => return false,
            }
        }

        match &record.borough {
            Some(borough) => {
                if !self.boroughs.contains(borough) {
                    return false;
                }
            }
            None => return false,
        }

        if !self.vehicle_types.is_empty() {
            match &record.vehicle_type {
                Some(vehicle) => {
                    if !self.vehicle_types.contains(vehicle) {
                        return false;
                    }
                }
                None => return false,
            }
        }

        true
    }
}

// ---------------------------------------------------------------------------
// Filter application
// ---------------------------------------------------------------------------

/// Apply a [`FilterSpec`] to a dataset, producing a stable subsequence of
/// the original row order. A single linear pass; re-applying the same spec
/// yields the identical view.
pub fn apply<'a>(dataset: &'a CollisionDataset, spec: &FilterSpec) -> DatasetView<'a> {
    let indices = dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, record)| spec.matches(record))
        .map(|(i, _)| i)
        .collect();
    DatasetView::new(dataset, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregate;
    use crate::data::testutil::{date, sample_dataset};

    #[test]
    fn date_and_borough_predicates_compose() {
        // Three-row scenario: January BRONX rows pass, February QUEENS does not.
        let dataset = sample_dataset();
        let spec = FilterSpec {
            date_range: Some((date(2021, 1, 1), date(2021, 1, 31))),
            boroughs: ["BRONX".to_string()].into(),
            vehicle_types: BTreeSet::new(),
        };
        let view = apply(&dataset, &spec);
        assert_eq!(view.indices(), [0, 2]);

        let kpis = aggregate::kpis(&view);
        assert_eq!(kpis.total_collisions, 2);
        assert_eq!(kpis.total_injuries, 3);
    }

    #[test]
    fn empty_borough_selection_selects_nothing() {
        let dataset = sample_dataset();
        let spec = FilterSpec::default();
        assert!(apply(&dataset, &spec).is_empty());
    }

    #[test]
    fn empty_vehicle_selection_is_a_pass_through() {
        // The asymmetry with boroughs is intended behavior, not a bug.
        let dataset = sample_dataset();
        let mut spec = FilterSpec::all_boroughs(&dataset);
        let unconstrained = apply(&dataset, &spec).into_indices();

        spec.vehicle_types = ["TAXI".to_string()].into();
        let narrowed = apply(&dataset, &spec).into_indices();

        assert!(narrowed.len() < unconstrained.len());
        assert!(narrowed.iter().all(|i| unconstrained.contains(i)));
        for &i in &narrowed {
            assert_eq!(dataset.records[i].vehicle_type.as_deref(), Some("TAXI"));
        }
    }

    #[test]
    fn date_range_is_inclusive_on_both_ends() {
        let dataset = sample_dataset();
        let mut spec = FilterSpec::all_boroughs(&dataset);
        spec.date_range = Some((date(2021, 1, 1), date(2021, 1, 15)));
        let view = apply(&dataset, &spec);
        assert_eq!(view.indices(), [0, 2]);
    }

    #[test]
    fn active_date_filter_excludes_missing_dates() {
        let dataset = sample_dataset();
        let mut spec = FilterSpec::all_boroughs(&dataset);

        let without_date_filter = apply(&dataset, &spec).into_indices();
        assert!(without_date_filter.contains(&4)); // unparseable date, MANHATTAN

        spec.date_range = Some((date(2020, 1, 1), date(2021, 12, 31)));
        let with_date_filter = apply(&dataset, &spec).into_indices();
        assert!(!with_date_filter.contains(&4));
    }

    #[test]
    fn missing_borough_rows_never_pass() {
        let dataset = sample_dataset();
        let spec = FilterSpec::all_boroughs(&dataset);
        let indices = apply(&dataset, &spec).into_indices();
        assert!(!indices.contains(&3)); // blank borough cell
    }

    #[test]
    fn filtering_is_stable_and_idempotent() {
        let dataset = sample_dataset();
        let mut spec = FilterSpec::all_boroughs(&dataset);
        spec.vehicle_types = ["SEDAN".to_string(), "TAXI".to_string()].into();

        let first = apply(&dataset, &spec).into_indices();
        let second = apply(&dataset, &spec).into_indices();
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0] < w[1]));
    }
}

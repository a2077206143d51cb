use super::model::DatasetView;

// ---------------------------------------------------------------------------
// Free-text search across every column
// ---------------------------------------------------------------------------

/// Case-insensitive substring search across the string form of every
/// column, returning the matching subset of `view` in view order.
///
/// A blank term (empty after trimming) matches nothing: the dashboards
/// only run a search once the user has typed something. This is a full
/// scan over the view on every call; nothing is indexed.
pub fn search<'a>(view: &DatasetView<'a>, term: &str) -> DatasetView<'a> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return DatasetView::new(view.dataset(), Vec::new());
    }

    let records = &view.dataset().records;
    let indices = view
        .indices()
        .iter()
        .copied()
        .filter(|&i| records[i].search_text().contains(&needle))
        .collect();
    DatasetView::new(view.dataset(), indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{self, FilterSpec};
    use crate::data::testutil::sample_dataset;

    #[test]
    fn blank_terms_match_nothing() {
        let dataset = sample_dataset();
        let view = dataset.full_view();
        assert!(search(&view, "").is_empty());
        assert!(search(&view, "   ").is_empty());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let dataset = sample_dataset();
        let view = dataset.full_view();
        let hits = search(&view, "bronx");
        assert_eq!(hits.indices(), [0, 2, 7]);
    }

    #[test]
    fn numeric_cells_are_searchable_as_text() {
        let dataset = sample_dataset();
        let hits = search(&dataset.full_view(), "-73.92");
        assert_eq!(hits.indices(), [0]);
    }

    #[test]
    fn canonical_date_rendering_is_searchable() {
        // The raw cell says 01/15/2021; the parsed date also matches ISO form.
        let dataset = sample_dataset();
        let hits = search(&dataset.full_view(), "2021-01-15");
        assert_eq!(hits.indices(), [2]);
    }

    #[test]
    fn search_respects_the_incoming_view() {
        let dataset = sample_dataset();
        let spec = FilterSpec {
            boroughs: ["QUEENS".to_string()].into(),
            ..FilterSpec::default()
        };
        let filtered = filter::apply(&dataset, &spec);
        let hits = search(&filtered, "taxi");
        assert_eq!(hits.indices(), [1, 5]);

        let everywhere = search(&dataset.full_view(), "taxi");
        assert_eq!(everywhere.indices(), [1, 5]);
    }
}

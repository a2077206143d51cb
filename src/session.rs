use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use log::debug;

use crate::data::filter::{self, FilterSpec};
use crate::data::loader::{self, LoadError};
use crate::data::model::{CollisionDataset, DatasetView};

// ---------------------------------------------------------------------------
// Source identity
// ---------------------------------------------------------------------------

/// Cache key identifying a dataset source. A path keys by location; an
/// upload keys by content hash, so re-uploading different bytes is a
/// cache miss (the invalidation rule).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceKey {
    Path(PathBuf),
    Upload(u64),
}

impl SourceKey {
    pub fn for_upload(bytes: &[u8]) -> Self {
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        SourceKey::Upload(hasher.finish())
    }
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// One interactive session: parsed datasets memoized by source, plus the
/// current selection and its cached row indices.
///
/// Loading is the only I/O in the pipeline, so repeated filter changes
/// against the same source never re-read or re-parse the file.
#[derive(Default)]
pub struct DashboardSession {
    datasets: HashMap<SourceKey, CollisionDataset>,
    current: Option<SourceKey>,
    filter: FilterSpec,
    visible_indices: Vec<usize>,
}

impl DashboardSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a path, reusing the parsed dataset when this path was
    /// loaded before.
    pub fn load_path(&mut self, path: &Path) -> Result<&CollisionDataset, LoadError> {
        let key = SourceKey::Path(path.to_path_buf());
        if !self.datasets.contains_key(&key) {
            let dataset = loader::load_path(path)?;
            self.datasets.insert(key.clone(), dataset);
        } else {
            debug!("dataset cache hit for {}", path.display());
        }
        self.activate(&key);
        Ok(&self.datasets[&key])
    }

    /// Load from uploaded bytes, keyed by content hash.
    pub fn load_upload(&mut self, bytes: &[u8]) -> Result<&CollisionDataset, LoadError> {
        let key = SourceKey::for_upload(bytes);
        if !self.datasets.contains_key(&key) {
            let dataset = loader::load_reader(bytes)?;
            self.datasets.insert(key.clone(), dataset);
        } else {
            debug!("dataset cache hit for uploaded bytes");
        }
        self.activate(&key);
        Ok(&self.datasets[&key])
    }

    /// Make `key` the active source. Switching sources resets the filter
    /// to the initial all-boroughs selection; re-activating the current
    /// source keeps the user's filter untouched.
    fn activate(&mut self, key: &SourceKey) {
        if self.current.as_ref() == Some(key) {
            return;
        }
        let initial = FilterSpec::all_boroughs(&self.datasets[key]);
        let indices = filter::apply(&self.datasets[key], &initial).into_indices();
        self.current = Some(key.clone());
        self.filter = initial;
        self.visible_indices = indices;
    }

    /// Replace the current selection and recompute the visible rows.
    pub fn set_filter(&mut self, spec: FilterSpec) {
        self.filter = spec;
        self.refilter();
    }

    /// Recompute the cached indices for the current source and filter.
    pub fn refilter(&mut self) {
        let Some(key) = &self.current else { return };
        let Some(dataset) = self.datasets.get(key) else {
            return;
        };
        let indices = filter::apply(dataset, &self.filter).into_indices();
        self.visible_indices = indices;
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn current_dataset(&self) -> Option<&CollisionDataset> {
        self.datasets.get(self.current.as_ref()?)
    }

    /// The filtered view of the active dataset.
    pub fn view(&self) -> Option<DatasetView<'_>> {
        let dataset = self.current_dataset()?;
        Some(DatasetView::new(dataset, self.visible_indices.clone()))
    }

    /// Drop one cached dataset.
    pub fn evict(&mut self, key: &SourceKey) {
        self.datasets.remove(key);
        if self.current.as_ref() == Some(key) {
            self.current = None;
            self.visible_indices.clear();
        }
    }

    /// Drop every cached dataset.
    pub fn clear(&mut self) {
        self.datasets.clear();
        self.current = None;
        self.visible_indices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV_A: &str = "DATE,TIME,BOROUGH\n01/01/2021,10:00,BRONX\n01/02/2021,11:00,QUEENS\n";
    const CSV_B: &str = "DATE,TIME,BOROUGH\n05/05/2021,09:00,BROOKLYN\n";

    #[test]
    fn repeated_path_loads_reuse_the_parsed_dataset() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{CSV_A}").unwrap();

        let mut session = DashboardSession::new();
        let len = session.load_path(file.path()).unwrap().len();
        assert_eq!(len, 2);

        // Replace the file contents on disk; a cache hit must not notice.
        std::fs::write(file.path(), CSV_B).unwrap();
        let cached = session.load_path(file.path()).unwrap();
        assert_eq!(cached.len(), 2);
        assert_eq!(cached.records[0].borough.as_deref(), Some("BRONX"));
    }

    #[test]
    fn distinct_upload_bytes_get_distinct_keys() {
        assert_ne!(
            SourceKey::for_upload(CSV_A.as_bytes()),
            SourceKey::for_upload(CSV_B.as_bytes())
        );
        assert_eq!(
            SourceKey::for_upload(CSV_A.as_bytes()),
            SourceKey::for_upload(CSV_A.as_bytes())
        );

        let mut session = DashboardSession::new();
        session.load_upload(CSV_A.as_bytes()).unwrap();
        session.load_upload(CSV_B.as_bytes()).unwrap();
        assert_eq!(session.datasets.len(), 2);
    }

    #[test]
    fn loading_initializes_the_all_borough_view() {
        let mut session = DashboardSession::new();
        session.load_upload(CSV_A.as_bytes()).unwrap();

        let view = session.view().unwrap();
        assert_eq!(view.len(), 2);
        assert_eq!(session.filter().boroughs.len(), 2);
    }

    #[test]
    fn set_filter_recomputes_the_cached_view() {
        let mut session = DashboardSession::new();
        session.load_upload(CSV_A.as_bytes()).unwrap();

        let mut spec = session.filter().clone();
        spec.boroughs.retain(|b| b == "QUEENS");
        session.set_filter(spec);

        let view = session.view().unwrap();
        assert_eq!(view.len(), 1);
        assert_eq!(
            view.records().next().unwrap().borough.as_deref(),
            Some("QUEENS")
        );
    }

    #[test]
    fn switching_sources_resets_the_filter() {
        let mut session = DashboardSession::new();
        session.load_upload(CSV_A.as_bytes()).unwrap();
        let mut spec = session.filter().clone();
        spec.boroughs.clear();
        session.set_filter(spec);
        assert_eq!(session.view().unwrap().len(), 0);

        session.load_upload(CSV_B.as_bytes()).unwrap();
        assert_eq!(session.view().unwrap().len(), 1);
    }

    #[test]
    fn evicting_the_active_source_clears_the_view() {
        let mut session = DashboardSession::new();
        session.load_upload(CSV_A.as_bytes()).unwrap();
        let key = SourceKey::for_upload(CSV_A.as_bytes());

        session.evict(&key);
        assert!(session.view().is_none());
        assert!(session.current_dataset().is_none());
    }
}

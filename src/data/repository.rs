use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use super::loader;
use super::model::Table;
use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// Backing sources
// ---------------------------------------------------------------------------

/// Reads a named dataset into memory. Implemented by [`FileSource`]; tests
/// plug in their own to observe how often a read happens.
pub trait TableSource: Send + Sync {
    fn read(&self, source_id: &str) -> Result<Table>;
}

/// Maps source ids (`"sales"`, `"profile"`) to files on disk.
#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    paths: BTreeMap<String, PathBuf>,
}

impl SourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(source_id.into(), path.into());
        self
    }

    pub fn path(&self, source_id: &str) -> Option<&PathBuf> {
        self.paths.get(source_id)
    }

    pub fn source_ids(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }
}

/// Loads catalog entries with [`loader::load_file`].
#[derive(Debug, Clone)]
pub struct FileSource {
    catalog: SourceCatalog,
}

impl FileSource {
    pub fn new(catalog: SourceCatalog) -> Self {
        FileSource { catalog }
    }

    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }
}

impl TableSource for FileSource {
    fn read(&self, source_id: &str) -> Result<Table> {
        let path = self
            .catalog
            .path(source_id)
            .ok_or_else(|| DashboardError::SourceNotFound {
                source_id: source_id.to_string(),
                reason: "no file registered for this source".to_string(),
            })?;

        loader::load_file(path).map_err(|e| DashboardError::SourceNotFound {
            source_id: source_id.to_string(),
            reason: format!("{e:#}"),
        })
    }
}

// ---------------------------------------------------------------------------
// DatasetRepository – load-once cache
// ---------------------------------------------------------------------------

type Slot = Arc<Mutex<Option<Arc<Table>>>>;

/// Loads each source at most once and hands out the shared table afterwards.
///
/// Built once by the composition root and passed to whoever needs data.
/// Each source id has its own slot lock: concurrent first calls for the same
/// id perform a single read, different ids load independently. Failed reads
/// are not cached, so the next call tries again.
pub struct DatasetRepository {
    source: Box<dyn TableSource>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl DatasetRepository {
    pub fn new(source: impl TableSource + 'static) -> Self {
        DatasetRepository {
            source: Box::new(source),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_catalog(catalog: SourceCatalog) -> Self {
        Self::new(FileSource::new(catalog))
    }

    /// Return the table for `source_id`, reading it on first use.
    pub fn load(&self, source_id: &str) -> Result<Arc<Table>> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.entry(source_id.to_string()).or_default().clone()
        };

        let mut cached = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(table) = cached.as_ref() {
            log::debug!("dataset '{source_id}' served from cache");
            return Ok(Arc::clone(table));
        }

        match self.source.read(source_id) {
            Ok(table) => {
                log::info!(
                    "Loaded dataset '{source_id}': {} rows, columns {:?}",
                    table.len(),
                    table.columns()
                );
                let table = Arc::new(table);
                *cached = Some(Arc::clone(&table));
                Ok(table)
            }
            Err(e) => {
                log::error!("Failed to load dataset '{source_id}': {e}");
                Err(e)
            }
        }
    }

    /// Whether `source_id` has already been loaded successfully.
    pub fn is_cached(&self, source_id: &str) -> bool {
        let slot = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.get(source_id).cloned()
        };
        slot.is_some_and(|slot| {
            slot.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_some()
        })
    }
}

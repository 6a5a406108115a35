use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::repository::SourceCatalog;
use crate::views::{PROFILE_SOURCE, SALES_SOURCE};

/// Environment variable that overrides `data_dir`.
pub const DATA_DIR_ENV: &str = "LIGHTER_DATA_DIR";

/// Where the dashboard finds its datasets.
///
/// ```json
/// {
///   "data_dir": "bases_sistema_usuario",
///   "sources": { "sales": "sales_items.csv", "profile": "user_profile.csv" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_dir: PathBuf,
    /// source id → file name, relative to `data_dir` unless absolute.
    pub sources: BTreeMap<String, PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let mut sources = BTreeMap::new();
        sources.insert(SALES_SOURCE.to_string(), PathBuf::from("sales_items.csv"));
        sources.insert(PROFILE_SOURCE.to_string(), PathBuf::from("user_profile.csv"));
        DashboardConfig {
            data_dir: PathBuf::from("data"),
            sources,
        }
    }
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Config file if given (defaults otherwise), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            log::debug!("{DATA_DIR_ENV} overrides data_dir with {dir}");
            config.data_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    pub fn catalog(&self) -> SourceCatalog {
        self.sources
            .iter()
            .fold(SourceCatalog::new(), |catalog, (id, file)| {
                catalog.with_source(id.clone(), self.data_dir.join(file))
            })
    }
}

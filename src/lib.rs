//! Filtering and aggregation engine behind the lighter sales and user
//! segmentation dashboard.
//!
//! A composition root builds one [`DatasetRepository`], opens a
//! [`DashboardSession`] per [`ViewPreset`], feeds control changes into the
//! session, and renders the resulting [`ViewReport`].

pub mod config;
pub mod data;
pub mod error;
pub mod state;
pub mod views;

pub use config::DashboardConfig;
pub use data::filter::{apply, FilterSpec, FilteredView, Predicate};
pub use data::model::{ColumnKind, Record, Table, Value};
pub use data::repository::{DatasetRepository, FileSource, SourceCatalog, TableSource};
pub use error::DashboardError;
pub use state::DashboardSession;
pub use views::{PanelOutput, ViewPreset, ViewReport};

use std::path::PathBuf;

use anyhow::Result;
use lighter_insights::{
    DashboardConfig, DashboardError, DashboardSession, DatasetRepository, ViewPreset,
};
use serde_json::json;

/// Headless dashboard: loads every view's dataset, applies the default
/// "everything selected" filters and prints each view's report as JSON.
///
/// Usage: `lighter-insights [config.json]`
fn main() -> Result<()> {
    env_logger::init();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = DashboardConfig::load(config_path.as_deref())?;
    log::info!("Reading datasets from {}", config.data_dir.display());

    let repository = DatasetRepository::from_catalog(config.catalog());

    let mut sections = Vec::new();
    for preset in ViewPreset::all() {
        let view_id = preset.id.clone();
        let section = match render_section(&repository, preset) {
            Ok(report) => serde_json::to_value(report)?,
            Err(e @ (DashboardError::SourceNotFound { .. } | DashboardError::EmptyResult)) => {
                json!({ "view_id": view_id, "notice": e.to_string() })
            }
            Err(e) => {
                log::error!("View '{view_id}' failed: {e}");
                json!({ "view_id": view_id, "error": e.to_string() })
            }
        };
        sections.push(section);
    }

    println!("{}", serde_json::to_string_pretty(&sections)?);
    Ok(())
}

fn render_section(
    repository: &DatasetRepository,
    preset: ViewPreset,
) -> Result<lighter_insights::ViewReport, DashboardError> {
    let table = repository.load(&preset.source_id)?;
    let session = DashboardSession::new(table, preset)?;
    session.report()
}

use thiserror::Error;

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

/// Every failure the engine reports to the visualization layer.
///
/// `SourceNotFound` and `EmptyResult` are expected at runtime and should be
/// shown to the viewer. `InvalidArgument` and `EmptyAggregation` mean the
/// caller skipped a check it was supposed to make.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    #[error("dataset '{source_id}' is unavailable: {reason}")]
    SourceNotFound { source_id: String, reason: String },

    #[error("no data matches the current selection")]
    EmptyResult,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("cannot aggregate '{column}' over an empty selection")]
    EmptyAggregation { column: String },
}

impl DashboardError {
    pub fn missing_column(column: &str) -> Self {
        DashboardError::InvalidArgument(format!("unknown column '{column}'"))
    }

    pub fn not_numeric(column: &str) -> Self {
        DashboardError::InvalidArgument(format!("column '{column}' is not numeric"))
    }
}

pub type Result<T, E = DashboardError> = std::result::Result<T, E>;

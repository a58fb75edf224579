//! Domain error types.

use thiserror::Error;

/// Errors raised while producing reports or changing complaint state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// The underlying data source failed.
    #[error("Data source error: {0}")]
    Source(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Export error: {0}")]
    Export(String),
}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        ReportError::Export(err.to_string())
    }
}

impl ReportError {
    pub fn data_source(err: impl std::fmt::Display) -> Self {
        ReportError::Source(err.to_string())
    }
}

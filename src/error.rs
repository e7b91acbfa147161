// =============================================================================
// Domain errors
// =============================================================================
//
// Loading, feature construction and model fitting report failures through
// `ForecastError`. The CLI and the REST layer wrap these in `anyhow` and map
// them to exit codes / HTTP statuses.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for the forecasting core.
pub type Result<T> = std::result::Result<T, ForecastError>;

#[derive(Error, Debug)]
pub enum ForecastError {
    /// The price file for a symbol does not exist.
    #[error("price file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A required column is absent from the price file header.
    #[error("column {column} not found in {}", .path.display())]
    ColumnMissing { column: String, path: PathBuf },

    /// Not enough rows survive warm-up / target construction.
    #[error("insufficient data: need at least {required} rows, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// The newest bar has no complete feature row (e.g. RSI is undefined
    /// over a flat stretch), so there is nothing to forecast from.
    #[error("latest bar {latest} has no complete feature row (last complete row is {last_row})")]
    StaleFeatures {
        latest: chrono::NaiveDate,
        last_row: chrono::NaiveDate,
    },

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The least-squares system has no unique solution (e.g. a constant feature).
    #[error("singular system: {0}")]
    Singular(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ForecastError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by the caller asking for a symbol or column
    /// that is not there, as opposed to a data or numerical problem.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound(_) | Self::ColumnMissing { .. })
    }
}

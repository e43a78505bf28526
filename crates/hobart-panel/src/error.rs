//! Error types for panel operations.

use thiserror::Error;

/// Result type for panel operations.
pub type Result<T> = std::result::Result<T, PanelError>;

/// Errors that can occur while loading or transforming a firm-year panel.
#[derive(Debug, Error)]
pub enum PanelError {
    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A column the operation needs is absent from the input
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// More than one observation for the same firm and fiscal year
    #[error("Duplicate firm-year observation: {firm} in fiscal year {year}")]
    DuplicateObservation {
        /// Firm identifier
        firm: String,
        /// Fiscal year
        year: i32,
    },

    /// Winsorization percentile outside the supported range
    #[error("Invalid winsorization percentile: {0} (must be in [0, 0.5))")]
    InvalidPercentile(f64),
}

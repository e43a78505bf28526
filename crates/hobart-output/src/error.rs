//! Error types for reporting.

use crate::export::ExportError;
use hobart_panel::PanelError;
use thiserror::Error;

/// Errors that can occur while building or writing reports.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Panel error
    #[error("Panel error: {0}")]
    Panel(#[from] PanelError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Export error
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No observations left to summarize
    #[error("Empty sample: {0}")]
    EmptySample(String),
}

//! Error types for the pipeline.

use hobart_accruals::{ConfigError, EstimateError};
use hobart_output::ReportError;
use hobart_panel::PanelError;
use thiserror::Error;

/// Errors that can occur while running the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Panel error
    #[error("Panel error: {0}")]
    Panel(#[from] PanelError),

    /// Estimation error
    #[error("Estimation error: {0}")]
    Estimate(#[from] EstimateError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Report error
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

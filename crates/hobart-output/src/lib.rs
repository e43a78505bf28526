#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analysis;
pub mod correlation;
pub mod descriptive;
pub mod error;
pub mod export;
pub mod latex;
pub mod report;
pub mod stats;
pub mod summary;

pub use analysis::{ANALYSIS_VARIABLES, AnalysisConfig, analysis_sample, variable_label};
pub use correlation::{CorrelationCell, CorrelationTable};
pub use descriptive::{DescriptiveRow, DescriptiveTable};
pub use error::ReportError;
pub use export::{ExportError, ExportFormat, Exporter};
pub use report::AnalysisReport;
pub use summary::SampleInfo;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

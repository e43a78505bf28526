//! Analysis report: sample coverage, descriptive statistics and correlations.

use crate::analysis::{ANALYSIS_VARIABLES, AnalysisConfig, analysis_sample};
use crate::correlation::CorrelationTable;
use crate::descriptive::DescriptiveTable;
use crate::error::ReportError;
use crate::export::{ExportFormat, Exporter};
use crate::summary::SampleInfo;
use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Tables describing an assembled sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Report generation timestamp
    pub timestamp: DateTime<Utc>,
    /// Coverage of the analysis subsample
    pub info: SampleInfo,
    /// Descriptive statistics of the analysis variables
    pub descriptive: DescriptiveTable,
    /// Pearson / Spearman correlations of the analysis variables
    pub correlation: CorrelationTable,
}

impl AnalysisReport {
    /// Build the report from an assembled sample.
    ///
    /// # Errors
    /// * [`ReportError::EmptySample`] if no firm-year survives the filters
    pub fn build(sample: &DataFrame, config: &AnalysisConfig) -> Result<Self, ReportError> {
        let subsample = analysis_sample(sample, config)?;
        if subsample.height() == 0 {
            return Err(ReportError::EmptySample(
                "no firm-year has all analysis variables".to_string(),
            ));
        }

        let info = SampleInfo::from_frame(&subsample)?;
        let descriptive = DescriptiveTable::from_frame(&subsample, &ANALYSIS_VARIABLES)?;
        let correlation =
            CorrelationTable::from_frame(&subsample, &ANALYSIS_VARIABLES, config.significance)?;

        tracing::info!(%info, "built analysis report");

        Ok(Self {
            timestamp: Utc::now(),
            info,
            descriptive,
            correlation,
        })
    }

    /// Write all tables into `dir`, creating it if needed.
    ///
    /// Returns the paths written.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();

        for (name, content) in [
            ("descriptive.tex", self.descriptive.to_latex()),
            ("descriptive.md", self.descriptive.to_markdown()),
            ("correlation.tex", self.correlation.to_latex()),
            ("correlation.md", self.correlation.to_markdown()),
        ] {
            let path = dir.join(name);
            fs::write(&path, content)?;
            written.push(path);
        }

        let exports: [(&str, &dyn Exporter, ExportFormat); 5] = [
            ("descriptive", &self.descriptive, ExportFormat::Csv),
            ("descriptive", &self.descriptive, ExportFormat::PrettyJson),
            ("correlation", &self.correlation, ExportFormat::Csv),
            ("correlation", &self.correlation, ExportFormat::PrettyJson),
            ("sample_info", &self.info, ExportFormat::PrettyJson),
        ];
        for (stem, table, format) in exports {
            let path = dir.join(format!("{stem}.{}", format.extension()));
            table.export_to_file(&path, format)?;
            written.push(path);
        }

        tracing::info!(dir = %dir.display(), files = written.len(), "wrote analysis report");
        Ok(written)
    }
}

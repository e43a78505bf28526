//! CSV and JSON export of report tables.

use crate::correlation::CorrelationTable;
use crate::descriptive::DescriptiveTable;
use crate::summary::SampleInfo;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

/// Serialize records to CSV with a header row.
fn to_csv<T: Serialize>(records: impl IntoIterator<Item = T>) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

fn to_json<T: Serialize + ?Sized>(value: &T, format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(value)?),
        _ => Ok(serde_json::to_string(value)?),
    }
}

impl Exporter for DescriptiveTable {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => to_csv(&self.rows),
            ExportFormat::Json | ExportFormat::PrettyJson => to_json(self, format),
        }
    }
}

/// One correlation cell in long format.
#[derive(Debug, Serialize)]
struct CorrelationRecord<'a> {
    row: &'a str,
    column: &'a str,
    method: &'static str,
    coefficient: f64,
    p_value: f64,
}

impl CorrelationTable {
    fn to_records(&self) -> Vec<CorrelationRecord<'_>> {
        let mut records = Vec::new();
        for (i, row) in self.variables.iter().enumerate() {
            for (j, column) in self.variables.iter().enumerate() {
                if let Some(Some(cell)) = self.cells.get(i).and_then(|cells| cells.get(j)) {
                    records.push(CorrelationRecord {
                        row,
                        column,
                        method: if i < j { "pearson" } else { "spearman" },
                        coefficient: cell.coefficient,
                        p_value: cell.p_value,
                    });
                }
            }
        }
        records
    }
}

impl Exporter for CorrelationTable {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => to_csv(self.to_records()),
            ExportFormat::Json | ExportFormat::PrettyJson => to_json(self, format),
        }
    }
}

impl Exporter for SampleInfo {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => to_csv([self]),
            ExportFormat::Json | ExportFormat::PrettyJson => to_json(self, format),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::CorrelationCell;
    use crate::descriptive::DescriptiveRow;
    use std::io::Read;

    fn descriptive() -> DescriptiveTable {
        DescriptiveTable {
            rows: vec![
                DescriptiveRow::from_values("mj_da", &[-0.1, 0.0, 0.1]),
                DescriptiveRow::from_values("ln_ta", &[2.0, 3.0]),
            ],
        }
    }

    fn correlation() -> CorrelationTable {
        let cell = CorrelationCell {
            coefficient: 0.42,
            p_value: 0.01,
        };
        CorrelationTable {
            variables: vec!["mj_da".to_string(), "dd_da".to_string()],
            cells: vec![vec![None, Some(cell)], vec![Some(cell), None]],
            observations: 100,
            significance: 0.05,
        }
    }

    #[test]
    fn test_descriptive_export_csv() {
        let csv = descriptive().export_to_string(ExportFormat::Csv).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next(),
            Some("variable,n,mean,std_dev,min,p25,median,p75,max")
        );
        assert!(lines.next().unwrap().starts_with("mj_da,3,0"));
        assert!(csv.contains("ln_ta,2,2.5"));
    }

    #[test]
    fn test_descriptive_export_json() {
        let json = descriptive().export_to_string(ExportFormat::Json).unwrap();
        assert!(json.contains("\"variable\":\"mj_da\""));
        assert!(json.contains("\"n\":3"));
    }

    #[test]
    fn test_correlation_export_csv() {
        let csv = correlation().export_to_string(ExportFormat::Csv).unwrap();

        assert!(csv.starts_with("row,column,method,coefficient,p_value"));
        assert!(csv.contains("mj_da,dd_da,pearson,0.42,0.01"));
        assert!(csv.contains("dd_da,mj_da,spearman,0.42,0.01"));
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_pretty_json_is_indented() {
        let json = correlation().export_to_string(ExportFormat::PrettyJson).unwrap();
        assert!(json.contains("  \"observations\": 100"));
    }

    #[test]
    fn test_sample_info_export() {
        let info = SampleInfo {
            min_fyear: 1990,
            max_fyear: 2020,
            unique_firms: 812,
            observations: 9001,
        };

        let csv = info.export_to_string(ExportFormat::Csv).unwrap();
        assert_eq!(csv, "min_fyear,max_fyear,unique_firms,observations\n1990,2020,812,9001\n");
    }

    #[test]
    fn test_export_to_file() {
        let path = std::env::temp_dir().join(format!("hobart-export-{}.json", std::process::id()));

        descriptive().export_to_file(&path, ExportFormat::Json).unwrap();
        let mut content = String::new();
        File::open(&path).unwrap().read_to_string(&mut content).unwrap();
        assert!(content.contains("\"ln_ta\""));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_export_format_extension() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Json.extension(), "json");
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
    }
}

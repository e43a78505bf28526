//! Sample coverage.

use crate::error::ReportError;
use hobart_panel::columns::{FIRM, YEAR};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Fiscal year range and number of distinct firms of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleInfo {
    /// First fiscal year
    pub min_fyear: i32,
    /// Last fiscal year
    pub max_fyear: i32,
    /// Number of distinct firms
    pub unique_firms: usize,
    /// Number of firm-years
    pub observations: usize,
}

impl SampleInfo {
    /// Describe a sample with firm and fiscal year columns.
    ///
    /// # Errors
    /// * [`ReportError::EmptySample`] if the sample has no fiscal years
    pub fn from_frame(df: &DataFrame) -> Result<Self, ReportError> {
        let years = df.column(YEAR)?.cast(&DataType::Int32)?;
        let years = years.i32()?;
        let (Some(min_fyear), Some(max_fyear)) = (years.min(), years.max()) else {
            return Err(ReportError::EmptySample("no fiscal years".to_string()));
        };

        let firms = df.column(FIRM)?.cast(&DataType::String)?;
        let unique_firms = firms.str()?.into_iter().flatten().collect::<HashSet<_>>().len();

        Ok(Self {
            min_fyear,
            max_fyear,
            unique_firms,
            observations: df.height(),
        })
    }
}

impl fmt::Display for SampleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} firm-years of {} firms, fiscal years {} to {}",
            self.observations, self.unique_firms, self.min_fyear, self.max_fyear
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_info() {
        let df = df![
            "gvkey" => ["001004", "001004", "001013", "001045"],
            "fyear" => [2003, 2004, 1999, 2010],
        ]
        .unwrap();

        let info = SampleInfo::from_frame(&df).unwrap();
        assert_eq!(info.min_fyear, 1999);
        assert_eq!(info.max_fyear, 2010);
        assert_eq!(info.unique_firms, 3);
        assert_eq!(info.observations, 4);
        assert_eq!(info.to_string(), "4 firm-years of 3 firms, fiscal years 1999 to 2010");
    }

    #[test]
    fn test_empty_sample() {
        let df = df![
            "gvkey" => Vec::<String>::new(),
            "fyear" => Vec::<i32>::new(),
        ]
        .unwrap();

        assert!(matches!(SampleInfo::from_frame(&df), Err(ReportError::EmptySample(_))));
    }
}

//! Base sample preparation
//!
//! Turns a raw Compustat Fundamentals Annual extract into the firm-year base
//! sample used for accrual estimation: US industrial-format filings with
//! positive assets and sales, financial firms removed, and every firm-year
//! mapped to its Fama-French 12 and 48 industries.

use crate::columns::{
    COUNTRY, FF12, FF48, FIRM, INDUSTRY_FORMAT, SALES, SIC, SIC_HISTORICAL, TOTAL_ASSETS, YEAR,
};
use crate::error::{PanelError, Result};
use crate::transform::{require_columns, sort_panel, standardize_keys};
use polars::prelude::*;
use std::collections::HashSet;

/// SIC range of financial firms (banks, insurance, real estate).
const FINANCIAL_SIC: (i32, i32) = (6000, 6999);

/// Columns the raw extract must carry for base sample preparation.
pub const RAW_COLUMNS: [&str; 8] = [
    FIRM,
    YEAR,
    INDUSTRY_FORMAT,
    COUNTRY,
    SIC,
    SIC_HISTORICAL,
    TOTAL_ASSETS,
    SALES,
];

/// Build the base sample from a raw Compustat extract.
///
/// # Arguments
/// * `raw` - Compustat extract with at least [`RAW_COLUMNS`]
/// * `ff12` - Mapping with columns `sic` and `ff12_ind`
/// * `ff48` - Mapping with columns `sic` and `ff48_ind`
///
/// # Returns
/// * Base sample sorted by firm and fiscal year, one row per firm-year
///
/// # Errors
/// * [`PanelError::MissingColumn`] if an input lacks a required column
/// * [`PanelError::DuplicateObservation`] if a firm-year appears twice
pub fn prep_base_sample(raw: &DataFrame, ff12: &DataFrame, ff48: &DataFrame) -> Result<DataFrame> {
    require_columns(raw, &RAW_COLUMNS)?;
    require_columns(ff12, &[SIC, FF12])?;
    require_columns(ff48, &[SIC, FF48])?;

    let sample = standardize_keys(raw.clone().lazy())
        .with_columns([
            col(SIC).cast(DataType::Int32),
            col(SIC_HISTORICAL).cast(DataType::Int32),
        ])
        // Historical SIC where reported, header SIC otherwise.
        .with_column(col(SIC_HISTORICAL).fill_null(col(SIC)).alias(SIC))
        .filter(
            col(INDUSTRY_FORMAT)
                .eq(lit("INDL"))
                .and(col(COUNTRY).eq(lit("USA")))
                .and(col(TOTAL_ASSETS).gt(lit(0.0)))
                .and(col(SALES).gt(lit(0.0))),
        )
        .filter(
            col(SIC)
                .lt(lit(FINANCIAL_SIC.0))
                .or(col(SIC).gt(lit(FINANCIAL_SIC.1))),
        )
        .filter(col(SIC).is_not_null())
        .join(
            industry_map(ff48, FF48),
            [col(SIC)],
            [col(SIC)],
            JoinArgs::new(JoinType::Left),
        )
        .join(
            industry_map(ff12, FF12),
            [col(SIC)],
            [col(SIC)],
            JoinArgs::new(JoinType::Left),
        )
        .filter(col(FF48).is_not_null().and(col(FF12).is_not_null()));

    let sample = sort_panel(sample).collect()?;
    ensure_unique_firm_years(&sample)?;

    tracing::info!(
        raw_rows = raw.height(),
        base_rows = sample.height(),
        "prepared base sample"
    );

    Ok(sample)
}

/// SIC to industry mapping with integer SIC keys and string industry codes.
fn industry_map(mapping: &DataFrame, industry: &str) -> LazyFrame {
    mapping.clone().lazy().select([
        col(SIC).cast(DataType::Int32),
        col(industry).cast(DataType::String),
    ])
}

/// Fail on the first (firm, fiscal year) key that occurs more than once.
pub fn ensure_unique_firm_years(panel: &DataFrame) -> Result<()> {
    let firms = panel.column(FIRM)?.str()?;
    let years = panel.column(YEAR)?.i32()?;

    let mut seen = HashSet::with_capacity(panel.height());
    for (firm, year) in firms.into_iter().zip(years) {
        if let (Some(firm), Some(year)) = (firm, year)
            && !seen.insert((firm, year))
        {
            return Err(PanelError::DuplicateObservation {
                firm: firm.to_string(),
                year,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_extract() -> DataFrame {
        df![
            "gvkey" => [1004i64, 1004, 1013, 1045, 1050, 1062, 1078],
            "fyear" => [2002i64, 2001, 2001, 2001, 2001, 2001, 2001],
            "indfmt" => ["INDL", "INDL", "INDL", "FS", "INDL", "INDL", "INDL"],
            "fic" => ["USA", "USA", "USA", "USA", "CAN", "USA", "USA"],
            "sic" => [Some(5080i64), Some(5080), Some(6020), Some(3714), Some(3714), Some(2834), Some(2834)],
            "sich" => [None, Some(3720i64), None, None, None, None, None],
            "at" => [100.0, 90.0, 50.0, 10.0, 10.0, 0.0, 20.0],
            "sale" => [80.0, 70.0, 10.0, 5.0, 5.0, 3.0, 12.0],
        ]
        .unwrap()
    }

    fn ff48() -> DataFrame {
        df![
            "sic" => ["5080", "3720", "6020", "2834", "3714"],
            "ff48_ind" => [41i64, 24, 45, 13, 23],
        ]
        .unwrap()
    }

    fn ff12() -> DataFrame {
        df![
            "sic" => ["5080", "3720", "6020", "2834", "3714"],
            "ff12_ind" => [9i64, 2, 11, 10, 2],
        ]
        .unwrap()
    }

    #[test]
    fn test_base_sample_filters() {
        let base = prep_base_sample(&raw_extract(), &ff12(), &ff48()).unwrap();

        // Kept: 1004/2001, 1004/2002, 1078/2001. Dropped: bank (6020), FS format,
        // Canadian filer, zero assets.
        assert_eq!(base.height(), 3);

        let firms: Vec<Option<&str>> = base.column("gvkey").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(firms, vec![Some("1004"), Some("1004"), Some("1078")]);

        let years: Vec<Option<i32>> = base.column("fyear").unwrap().i32().unwrap().into_iter().collect();
        assert_eq!(years, vec![Some(2001), Some(2002), Some(2001)]);
    }

    #[test]
    fn test_historical_sic_takes_precedence() {
        let base = prep_base_sample(&raw_extract(), &ff12(), &ff48()).unwrap();
        let industries = base.column("ff48_ind").unwrap().str().unwrap();

        // 1004/2001 reports historical SIC 3720 (aircraft), 2002 falls back to 5080.
        assert_eq!(industries.get(0), Some("24"));
        assert_eq!(industries.get(1), Some("41"));
    }

    #[test]
    fn test_unmapped_sic_is_dropped() {
        let ff48 = df![
            "sic" => ["5080"],
            "ff48_ind" => [41i64],
        ]
        .unwrap();

        let base = prep_base_sample(&raw_extract(), &ff12(), &ff48).unwrap();
        assert_eq!(base.height(), 1);
    }

    #[test]
    fn test_duplicate_firm_year_is_fatal() {
        let panel = df![
            "gvkey" => ["A", "A", "B"],
            "fyear" => [2001, 2001, 2001],
        ]
        .unwrap();

        let err = ensure_unique_firm_years(&panel).unwrap_err();
        assert!(matches!(
            err,
            PanelError::DuplicateObservation { ref firm, year: 2001 } if firm == "A"
        ));
    }

    #[test]
    fn test_missing_raw_column() {
        let raw = raw_extract().drop("sich").unwrap();
        let err = prep_base_sample(&raw, &ff12(), &ff48()).unwrap_err();
        assert!(matches!(err, PanelError::MissingColumn(name) if name == "sich"));
    }
}

//! Analysis sample assembly
//!
//! Combines the base sample with the accrual estimates on the full grid of
//! firms and fiscal years, derives size, valuation and profitability ratios,
//! and keeps the firm-years with a Modified Jones discretionary accrual.

use crate::error::Result;
use hobart_accruals::{AccrualEstimates, AccrualModelKind, ConfigError};
use hobart_panel::columns::{
    ACQUISITIONS, ACQUISITIONS_SALES, COGS, COMMON_EQUITY, COMPANY_NAME, FF12, FF48, FIRM,
    GOODWILL, INCOME, INCOME_CF, INTANGIBLES, INTEREST, LIABILITIES, OPERATING_CASH_FLOW, PPE_NET,
    PRICE, SALES, SHARES, TOTAL_ASSETS, YEAR,
};
use hobart_panel::{lead_lag, require_columns, sort_panel, standardize_keys};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Acquisition amount assumed for a missing `aqs` or `acqsc` when the other is reported.
pub const DEFAULT_ACQUISITION_FILL: f64 = 0.0;

/// Base sample columns used by [`prep_smp`].
pub const BASE_COLUMNS: [&str; 21] = [
    FIRM,
    YEAR,
    COMPANY_NAME,
    FF12,
    FF48,
    TOTAL_ASSETS,
    SALES,
    SHARES,
    PRICE,
    COMMON_EQUITY,
    LIABILITIES,
    PPE_NET,
    INTANGIBLES,
    GOODWILL,
    ACQUISITIONS,
    ACQUISITIONS_SALES,
    COGS,
    INCOME,
    INTEREST,
    OPERATING_CASH_FLOW,
    INCOME_CF,
];

/// Columns of the assembled sample, in order.
pub const OUTPUT_COLUMNS: [&str; 30] = [
    FIRM,
    COMPANY_NAME,
    YEAR,
    FF12,
    FF48,
    "ta",
    "sales",
    "mktcap",
    "ln_ta",
    "ln_sales",
    "ln_mktcap",
    "mj_da",
    "dd_da",
    "mj_ada",
    "dd_ada",
    "mj_nobs",
    "dd_nobs",
    "mtb",
    "sales_growth",
    "leverage",
    "ppe_ta",
    "int_ta",
    "gwill_ta",
    "ceq_ta",
    "acq_sales",
    "cogs_sales",
    "ebit_sales",
    "ebit_avgta",
    "cfo_avgta",
    "tacc_avgta",
];

/// Models whose residual and group size columns appear in the sample.
const SAMPLE_MODELS: [AccrualModelKind; 2] = [
    AccrualModelKind::ModifiedJones,
    AccrualModelKind::DechowDichev,
];

/// Sample assembly settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Substitute `acquisition_fill` for one missing acquisition component (default: true).
    /// When unset the acquisition ratio is undefined whenever a component is missing.
    pub fill_acquisitions: bool,
    /// Value substituted for a missing acquisition component (default: 0.0)
    pub acquisition_fill: f64,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            fill_acquisitions: true,
            acquisition_fill: DEFAULT_ACQUISITION_FILL,
        }
    }
}

/// Assemble the analysis sample.
///
/// Every firm is paired with every fiscal year observed in `base`; the base
/// variables and each model's residual and group size are left-joined onto
/// that grid. Lagged values therefore come from the same firm's previous
/// fiscal year and are null when that year is missing.
///
/// # Arguments
/// * `base` - Base sample with [`BASE_COLUMNS`]
/// * `estimates` - Accrual estimates, Modified Jones required
/// * `config` - Assembly settings
///
/// # Returns
/// * One row per firm-year with a Modified Jones residual, [`OUTPUT_COLUMNS`]
///   in order; columns of a model that was not estimated are null
///
/// # Errors
/// * [`ConfigError::MissingModel`] if no Modified Jones estimates are given
/// * [`ConfigError::DuplicateModel`] if a model is given twice
/// * [`hobart_panel::PanelError::MissingColumn`] if `base` lacks a column
pub fn prep_smp(base: &DataFrame, estimates: &[AccrualEstimates], config: &AssemblyConfig) -> Result<DataFrame> {
    let mut seen = HashSet::new();
    for estimate in estimates {
        if !seen.insert(estimate.model) {
            return Err(ConfigError::DuplicateModel(estimate.model).into());
        }
    }
    if !seen.contains(&AccrualModelKind::ModifiedJones) {
        return Err(ConfigError::MissingModel(AccrualModelKind::ModifiedJones).into());
    }
    require_columns(base, &BASE_COLUMNS)?;

    let selection: Vec<Expr> = BASE_COLUMNS.iter().map(|name| col(*name)).collect();
    let base = standardize_keys(base.clone().lazy().select(selection))
        .with_columns([
            col(COMPANY_NAME).cast(DataType::String),
            col(FF12).cast(DataType::String),
            col(FF48).cast(DataType::String),
        ])
        .with_columns(
            BASE_COLUMNS[5..]
                .iter()
                .map(|name| col(*name).cast(DataType::Float64))
                .collect::<Vec<_>>(),
        )
        .collect()?;
    let base_rows = base.height();

    let mut sample = firm_year_grid(&base)?.lazy().join(
        base.lazy(),
        [col(FIRM), col(YEAR)],
        [col(FIRM), col(YEAR)],
        JoinArgs::new(JoinType::Left),
    );

    for kind in SAMPLE_MODELS {
        let prefix = kind.prefix();
        let residual = format!("{prefix}_da");
        let nobs = format!("{prefix}_nobs");

        sample = match estimates.iter().find(|estimate| estimate.model == kind) {
            Some(estimate) => sample.join(
                estimate.table.clone().lazy().select([
                    col(FIRM).cast(DataType::String),
                    col(YEAR).cast(DataType::Int32),
                    col(residual.as_str()).cast(DataType::Float64),
                    col(nobs.as_str()).cast(DataType::Int64),
                ]),
                [col(FIRM), col(YEAR)],
                [col(FIRM), col(YEAR)],
                JoinArgs::new(JoinType::Left),
            ),
            None => sample.with_columns([
                lit(NULL).cast(DataType::Float64).alias(residual.as_str()),
                lit(NULL).cast(DataType::Int64).alias(nobs.as_str()),
            ]),
        };
    }

    let sample = sort_panel(sample)
        .with_column(((col(TOTAL_ASSETS) + lead_lag(col(TOTAL_ASSETS), -1)) / lit(2.0)).alias("avgta"))
        .with_columns(derived_ratios(config))
        .filter(col("mj_da").is_not_null())
        .select(OUTPUT_COLUMNS.iter().map(|name| col(*name)).collect::<Vec<_>>())
        .collect()?;

    tracing::info!(
        base_rows,
        sample_rows = sample.height(),
        "assembled analysis sample"
    );

    Ok(sample)
}

/// All pairs of distinct firms and fiscal years, sorted by firm then year.
fn firm_year_grid(base: &DataFrame) -> Result<DataFrame> {
    let firms: BTreeSet<&str> = base.column(FIRM)?.str()?.into_iter().flatten().collect();
    let years: BTreeSet<i32> = base.column(YEAR)?.i32()?.into_iter().flatten().collect();

    let mut grid_firms = Vec::with_capacity(firms.len() * years.len());
    let mut grid_years = Vec::with_capacity(firms.len() * years.len());
    for firm in &firms {
        for year in &years {
            grid_firms.push(*firm);
            grid_years.push(*year);
        }
    }

    Ok(DataFrame::new(vec![
        Series::new(FIRM.into(), grid_firms).into(),
        Series::new(YEAR.into(), grid_years).into(),
    ])?)
}

fn derived_ratios(config: &AssemblyConfig) -> Vec<Expr> {
    let market_cap = col(SHARES) * col(PRICE);
    let ebit = col(INCOME) + col(INTEREST);

    let acquisitions = if config.fill_acquisitions {
        let fill = config.acquisition_fill;
        when(col(ACQUISITIONS).is_null().and(col(ACQUISITIONS_SALES).is_null()))
            .then(lit(NULL))
            .otherwise(col(ACQUISITIONS).fill_null(lit(fill)) + col(ACQUISITIONS_SALES).fill_null(lit(fill)))
    } else {
        col(ACQUISITIONS) + col(ACQUISITIONS_SALES)
    };

    vec![
        col(TOTAL_ASSETS).alias("ta"),
        col(SALES).alias("sales"),
        market_cap.clone().alias("mktcap"),
        ln_positive(col(TOTAL_ASSETS)).alias("ln_ta"),
        ln_positive(col(SALES)).alias("ln_sales"),
        ln_positive(market_cap.clone()).alias("ln_mktcap"),
        (market_cap / col(COMMON_EQUITY)).alias("mtb"),
        ln_positive(col(SALES) / lead_lag(col(SALES), -1)).alias("sales_growth"),
        (col(LIABILITIES) / col(TOTAL_ASSETS)).alias("leverage"),
        (col(PPE_NET) / col(TOTAL_ASSETS)).alias("ppe_ta"),
        (col(INTANGIBLES) / col(TOTAL_ASSETS)).alias("int_ta"),
        (col(GOODWILL) / col(TOTAL_ASSETS)).alias("gwill_ta"),
        (acquisitions / col(SALES)).alias("acq_sales"),
        (col(COGS) / col(SALES)).alias("cogs_sales"),
        (ebit.clone() / col(SALES)).alias("ebit_sales"),
        (ebit / col("avgta")).alias("ebit_avgta"),
        (col(OPERATING_CASH_FLOW) / col("avgta")).alias("cfo_avgta"),
        ((col(INCOME_CF) - col(OPERATING_CASH_FLOW)) / col("avgta")).alias("tacc_avgta"),
        (col(COMMON_EQUITY) / col(TOTAL_ASSETS)).alias("ceq_ta"),
        col("mj_da").abs().alias("mj_ada"),
        col("dd_da").abs().alias("dd_ada"),
    ]
}

/// Natural logarithm, null for non-positive values.
fn ln_positive(value: Expr) -> Expr {
    when(value.clone().gt(lit(0.0)))
        .then(value)
        .otherwise(lit(NULL))
        .cast(DataType::Float64)
        .log(std::f64::consts::E)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hobart_accruals::EstimationSummary;

    fn base() -> DataFrame {
        df![
            "gvkey" => ["001", "001", "001", "002", "002"],
            "fyear" => [2001, 2002, 2003, 2001, 2003],
            "conm" => ["ALPHA", "ALPHA", "ALPHA", "BETA", "BETA"],
            "ff12_ind" => ["1", "1", "1", "2", "2"],
            "ff48_ind" => ["7", "7", "7", "9", "9"],
            "at" => [100.0, 120.0, 150.0, 50.0, 60.0],
            "sale" => [200.0, 220.0, 242.0, 80.0, 90.0],
            "csho" => [10.0, 10.0, 12.0, 5.0, 5.0],
            "prcc_f" => [5.0, 6.0, 7.0, 2.0, 3.0],
            "ceq" => [40.0, 50.0, 60.0, 20.0, 25.0],
            "lt" => [60.0, 70.0, 90.0, 30.0, 35.0],
            "ppent" => [30.0, 36.0, 45.0, 10.0, 12.0],
            "intan" => [5.0, 6.0, 7.5, 0.0, 0.0],
            "gdwl" => [2.0, 2.0, 3.0, 0.0, 0.0],
            "aqs" => [Some(4.0), None, None, Some(1.0), None],
            "acqsc" => [Some(6.0), Some(11.0), None, None, None],
            "cogs" => [120.0, 130.0, 140.0, 60.0, 70.0],
            "ib" => [8.0, 9.0, 10.0, -1.0, 2.0],
            "xint" => [2.0, 2.0, 2.0, 1.0, 1.0],
            "oancf" => [12.0, 13.0, 14.0, 3.0, 4.0],
            "ibc" => [8.0, 9.0, 10.0, -1.0, 2.0],
        ]
        .unwrap()
    }

    fn estimates(model: AccrualModelKind, firms: &[&str], years: &[i32]) -> AccrualEstimates {
        let prefix = model.prefix();
        let n = firms.len();
        let table = df![
            "gvkey" => firms,
            "fyear" => years,
            "ff48_ind" => vec!["7"; n],
            format!("{prefix}_da").as_str() => (0..n).map(|i| i as f64 * 0.1 - 0.15).collect::<Vec<_>>(),
            format!("{prefix}_nobs").as_str() => vec![12i64; n],
        ]
        .unwrap();

        AccrualEstimates {
            model,
            table,
            summary: EstimationSummary::default(),
        }
    }

    fn value(df: &DataFrame, column: &str, row: usize) -> Option<f64> {
        df.column(column).unwrap().cast(&DataType::Float64).unwrap().f64().unwrap().get(row)
    }

    #[test]
    fn test_output_columns_and_filter() {
        let mj = estimates(AccrualModelKind::ModifiedJones, &["001", "001", "002"], &[2002, 2003, 2003]);
        let out = prep_smp(&base(), &[mj], &AssemblyConfig::default()).unwrap();

        let names: Vec<&str> = out.get_column_names().iter().map(|name| name.as_str()).collect();
        assert_eq!(names, OUTPUT_COLUMNS);
        assert_eq!(out.height(), 3);
        assert_eq!(out.column("dd_da").unwrap().null_count(), 3);
        assert_eq!(out.column("dd_nobs").unwrap().null_count(), 3);
    }

    #[test]
    fn test_derived_ratios() {
        let mj = estimates(AccrualModelKind::ModifiedJones, &["001", "001"], &[2002, 2003]);
        let out = prep_smp(&base(), &[mj], &AssemblyConfig::default()).unwrap();

        // Row 0 is ALPHA 2002.
        assert_relative_eq!(value(&out, "ln_ta", 0).unwrap(), 120.0_f64.ln());
        assert_relative_eq!(value(&out, "mktcap", 0).unwrap(), 60.0);
        assert_relative_eq!(value(&out, "mtb", 0).unwrap(), 60.0 / 50.0);
        assert_relative_eq!(value(&out, "sales_growth", 0).unwrap(), (220.0_f64 / 200.0).ln());
        assert_relative_eq!(value(&out, "ebit_avgta", 0).unwrap(), 11.0 / 110.0);
        assert_relative_eq!(value(&out, "tacc_avgta", 0).unwrap(), -4.0 / 110.0);
        assert_relative_eq!(value(&out, "acq_sales", 0).unwrap(), 11.0 / 220.0);
        assert_relative_eq!(value(&out, "mj_ada", 0).unwrap(), 0.15);
        assert_eq!(out.column("mj_nobs").unwrap().i64().unwrap().get(0), Some(12));

        // Both acquisition components missing in 2003.
        assert_eq!(value(&out, "acq_sales", 1), None);
    }

    #[test]
    fn test_lag_across_gap_is_null() {
        let mj = estimates(AccrualModelKind::ModifiedJones, &["002"], &[2003]);
        let out = prep_smp(&base(), &[mj], &AssemblyConfig::default()).unwrap();

        // BETA has no 2002 observation.
        assert_eq!(out.height(), 1);
        assert_eq!(value(&out, "sales_growth", 0), None);
        assert_eq!(value(&out, "ebit_avgta", 0), None);
        assert_relative_eq!(value(&out, "ln_sales", 0).unwrap(), 90.0_f64.ln());
    }

    #[test]
    fn test_acquisition_fill_disabled() {
        let mj = estimates(AccrualModelKind::ModifiedJones, &["001", "002"], &[2002, 2001]);
        let config = AssemblyConfig {
            fill_acquisitions: false,
            ..Default::default()
        };
        let out = prep_smp(&base(), &[mj], &config).unwrap();

        assert_eq!(value(&out, "acq_sales", 0), None);
        assert_eq!(value(&out, "acq_sales", 1), None);

        let mj = estimates(AccrualModelKind::ModifiedJones, &["002"], &[2001]);
        let out = prep_smp(&base(), &[mj], &AssemblyConfig::default()).unwrap();
        assert_relative_eq!(value(&out, "acq_sales", 0).unwrap(), 1.0 / 80.0);
    }

    #[test]
    fn test_dechow_dichev_columns_joined() {
        let mj = estimates(AccrualModelKind::ModifiedJones, &["001", "001"], &[2002, 2003]);
        let dd = estimates(AccrualModelKind::DechowDichev, &["001"], &[2002]);
        let out = prep_smp(&base(), &[dd, mj], &AssemblyConfig::default()).unwrap();

        assert_eq!(out.height(), 2);
        assert_relative_eq!(value(&out, "dd_da", 0).unwrap(), -0.15);
        assert_relative_eq!(value(&out, "dd_ada", 0).unwrap(), 0.15);
        assert_eq!(value(&out, "dd_da", 1), None);
    }

    #[test]
    fn test_modified_jones_required() {
        let dd = estimates(AccrualModelKind::DechowDichev, &["001"], &[2002]);
        assert!(matches!(
            prep_smp(&base(), &[dd], &AssemblyConfig::default()),
            Err(crate::PipelineError::Config(ConfigError::MissingModel(
                AccrualModelKind::ModifiedJones
            )))
        ));
    }

    #[test]
    fn test_duplicate_model_rejected() {
        let a = estimates(AccrualModelKind::ModifiedJones, &["001"], &[2002]);
        let b = estimates(AccrualModelKind::ModifiedJones, &["001"], &[2003]);
        assert!(matches!(
            prep_smp(&base(), &[a, b], &AssemblyConfig::default()),
            Err(crate::PipelineError::Config(ConfigError::DuplicateModel(_)))
        ));
    }
}

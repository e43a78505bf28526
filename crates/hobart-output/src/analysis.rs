//! Analysis subsample
//!
//! The subsample used for descriptive statistics and correlations: the
//! accrual measures and firm characteristics, restricted to firm-years where
//! every variable is finite, winsorized by fiscal year.

use crate::error::ReportError;
use hobart_panel::columns::{FF12, FIRM, YEAR};
use hobart_panel::{QuantileRule, WinsorizeConfig, require_columns, sort_panel, winsorize};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Variables summarized in the analysis, in table order.
pub const ANALYSIS_VARIABLES: [&str; 7] = [
    "mj_da",
    "dd_da",
    "ln_ta",
    "ln_mktcap",
    "mtb",
    "ebit_avgta",
    "sales_growth",
];

/// Reporting configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Winsorization tail probability per fiscal year (default: 0.01)
    pub winsorize_pct: f64,
    /// Quantile rule for winsorization bounds (default: linear interpolation)
    pub quantile_rule: QuantileRule,
    /// p-value below which correlations are highlighted (default: 0.05)
    pub significance: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            winsorize_pct: 0.01,
            quantile_rule: QuantileRule::Linear,
            significance: 0.05,
        }
    }
}

impl AnalysisConfig {
    /// Outlier settings applied within fiscal years.
    pub const fn winsorize(&self) -> WinsorizeConfig {
        WinsorizeConfig {
            percentile: self.winsorize_pct,
            truncate: false,
            rule: self.quantile_rule,
        }
    }
}

/// Human-readable label of an analysis variable.
pub fn variable_label(name: &str) -> &str {
    match name {
        "mj_da" => "Modified Jones DA",
        "dd_da" => "Dechow and Dichev DA",
        "ln_ta" => "Ln(Total assets)",
        "ln_mktcap" => "Ln(Market capitalization)",
        "mtb" => "Market to book",
        "ebit_avgta" => "Return on assets",
        "sales_growth" => "Sales growth",
        other => other,
    }
}

/// Build the analysis subsample from the assembled sample.
///
/// Keeps firm, fiscal year, FF12 industry and [`ANALYSIS_VARIABLES`], drops
/// firm-years where any variable is missing or not finite, and winsorizes
/// every variable within fiscal years.
pub fn analysis_sample(sample: &DataFrame, config: &AnalysisConfig) -> Result<DataFrame, ReportError> {
    let mut columns = vec![FIRM, YEAR, FF12];
    columns.extend(ANALYSIS_VARIABLES);
    require_columns(sample, &columns)?;

    let finite = ANALYSIS_VARIABLES
        .iter()
        .map(|name| {
            col(*name)
                .gt(lit(f64::NEG_INFINITY))
                .and(col(*name).lt(lit(f64::INFINITY)))
        })
        .reduce(|acc, cond| acc.and(cond))
        .unwrap_or_else(|| lit(true));

    let mut selection = vec![
        col(FIRM).cast(DataType::String),
        col(YEAR).cast(DataType::Int32),
        col(FF12).cast(DataType::String),
    ];
    selection.extend(ANALYSIS_VARIABLES.iter().map(|name| col(*name).cast(DataType::Float64)));

    let subsample = sample.clone().lazy().select(selection).filter(finite);
    let subsample = winsorize(subsample, &[YEAR], &[], &config.winsorize())?;
    let subsample = sort_panel(subsample).collect()?;

    tracing::info!(
        sample_rows = sample.height(),
        analysis_rows = subsample.height(),
        "prepared analysis sample"
    );

    Ok(subsample)
}

/// Non-null values of a numeric column.
pub(crate) fn column_values(df: &DataFrame, name: &str) -> Result<Vec<f64>, ReportError> {
    let values = df.column(name)?.cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().flatten().collect())
}

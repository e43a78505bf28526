//! Accrual models
//!
//! An accrual model turns the firm-year panel into regression inputs: a
//! scaled accrual target and its scaled regressors, one row per firm-year
//! with complete data. The estimator then fits the target on the regressors
//! within each industry-year and keeps the residual as the discretionary
//! accrual.
//!
//! Two models are provided:
//!
//! - [`ModifiedJones`]: total accruals on inverse lagged assets, revenue
//!   change net of receivables and gross PP&E, all scaled by lagged assets.
//! - [`DechowDichev`]: working capital accruals on past, current and future
//!   operating cash flow, scaled by average assets.

use crate::config::ConfigError;
use hobart_panel::columns::{
    FF48, FIRM, INCOME_CF, INVENTORY_CHANGE, OPERATING_CASH_FLOW, OTHER_CHANGE, PAYABLES_CHANGE,
    PPE_GROSS, RECEIVABLES_CHANGE, SALES, TAXES_CHANGE, TOTAL_ASSETS, YEAR,
};
use hobart_panel::lead_lag;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lagged total assets.
pub const LAGGED_ASSETS: &str = "lagta";
/// Lagged sales.
pub const LAGGED_SALES: &str = "lagsale";
/// Total accruals scaled by lagged assets.
pub const TOTAL_ACCRUALS: &str = "tacc";
/// Inverse of lagged assets.
pub const INVERSE_ASSETS: &str = "inverse_a";
/// Revenue change net of receivables change, scaled by lagged assets.
pub const REVENUE_CHANGE: &str = "drev";
/// Gross PP&E scaled by lagged assets.
pub const PPE: &str = "ppe";

/// Average of current and adjacent-year total assets.
pub const AVERAGE_ASSETS: &str = "avgta";
/// Operating cash flow scaled by average assets.
pub const CASH_FLOW: &str = "cfo";
/// Prior-year scaled operating cash flow.
pub const LAGGED_CASH_FLOW: &str = "lagcfo";
/// Next-year scaled operating cash flow.
pub const LEADING_CASH_FLOW: &str = "leadcfo";
/// Working capital accruals scaled by average assets.
pub const WORKING_CAPITAL_ACCRUALS: &str = "dwc";

/// A cross-sectional accrual model.
pub trait AccrualModel: Send + Sync + fmt::Debug {
    /// Which model this is.
    fn kind(&self) -> AccrualModelKind;

    /// Accrual measure being explained.
    fn target(&self) -> &'static str;

    /// Regressors, in coefficient order (the intercept is implicit).
    fn regressors(&self) -> &'static [&'static str];

    /// Panel columns the model reads.
    fn required_columns(&self) -> &'static [&'static str];

    /// Derive the regression inputs.
    ///
    /// The panel must have canonical keys and be sorted by firm and fiscal
    /// year. The result holds firm, industry, fiscal year, target and
    /// regressors for the rows where all inputs are defined.
    fn prepare(&self, panel: LazyFrame) -> LazyFrame;

    /// Number of estimated coefficients, intercept included.
    fn parameter_count(&self) -> usize {
        self.regressors().len() + 1
    }

    /// Output column prefix.
    fn prefix(&self) -> &'static str {
        self.kind().prefix()
    }
}

/// Identifies an accrual model in configuration and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccrualModelKind {
    /// Modified Jones (Dechow, Sloan and Sweeney 1995)
    ModifiedJones,
    /// Dechow and Dichev (2002)
    DechowDichev,
}

impl AccrualModelKind {
    /// Output column prefix.
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::ModifiedJones => "mj",
            Self::DechowDichev => "dd",
        }
    }

    /// Full model name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ModifiedJones => "Modified Jones",
            Self::DechowDichev => "Dechow-Dichev",
        }
    }

    /// Build the model with default settings, except for the Dechow-Dichev
    /// average assets window.
    pub fn model(&self, average_assets: AverageAssets) -> Box<dyn AccrualModel> {
        match self {
            Self::ModifiedJones => Box::new(ModifiedJones),
            Self::DechowDichev => Box::new(DechowDichev::new(average_assets)),
        }
    }
}

impl fmt::Display for AccrualModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

impl FromStr for AccrualModelKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mj" | "modified_jones" | "modified-jones" => Ok(Self::ModifiedJones),
            "dd" | "dechow_dichev" | "dechow-dichev" => Ok(Self::DechowDichev),
            _ => Err(ConfigError::UnknownModel(s.to_string())),
        }
    }
}

/// Adjacent year averaged with the current year to scale Dechow-Dichev inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AverageAssets {
    /// Average of years t-1 and t
    #[default]
    Lagged,
    /// Average of years t and t+1
    Leading,
}

impl AverageAssets {
    /// Fiscal year offset of the adjacent year.
    pub const fn offset(&self) -> i64 {
        match self {
            Self::Lagged => -1,
            Self::Leading => 1,
        }
    }
}

/// Modified Jones model.
///
/// `tacc = (ibc - oancf) / lagta` regressed on `inverse_a = 1 / lagta`,
/// `drev = (sale - lag(sale) + recch) / lagta` and `ppe = ppegt / lagta`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModifiedJones;

impl AccrualModel for ModifiedJones {
    fn kind(&self) -> AccrualModelKind {
        AccrualModelKind::ModifiedJones
    }

    fn target(&self) -> &'static str {
        TOTAL_ACCRUALS
    }

    fn regressors(&self) -> &'static [&'static str] {
        &[INVERSE_ASSETS, REVENUE_CHANGE, PPE]
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[
            FIRM,
            YEAR,
            FF48,
            TOTAL_ASSETS,
            SALES,
            INCOME_CF,
            OPERATING_CASH_FLOW,
            RECEIVABLES_CHANGE,
            PPE_GROSS,
        ]
    }

    fn prepare(&self, panel: LazyFrame) -> LazyFrame {
        let lagta = col(LAGGED_ASSETS);

        let panel = as_float(panel, &self.required_columns()[3..])
            .with_columns([
                positive_or_null(lead_lag(col(TOTAL_ASSETS), -1)).alias(LAGGED_ASSETS),
                lead_lag(col(SALES), -1).alias(LAGGED_SALES),
            ])
            .with_columns([
                ((col(INCOME_CF) - col(OPERATING_CASH_FLOW)) / lagta.clone()).alias(TOTAL_ACCRUALS),
                ((col(SALES) - col(LAGGED_SALES) + col(RECEIVABLES_CHANGE)) / lagta.clone())
                    .alias(REVENUE_CHANGE),
                (lit(1.0) / lagta.clone()).alias(INVERSE_ASSETS),
                (col(PPE_GROSS) / lagta).alias(PPE),
            ]);

        complete_inputs(panel, self.target(), self.regressors())
    }
}

/// Dechow-Dichev model.
///
/// `dwc = -(recch + invch + apalch + txach + aoloch) / avgta` regressed on
/// prior, current and next-year `cfo = oancf / avgta`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DechowDichev {
    average_assets: AverageAssets,
}

impl DechowDichev {
    /// Create the model with the given average assets window.
    pub const fn new(average_assets: AverageAssets) -> Self {
        Self { average_assets }
    }

    /// Average assets window in use.
    pub const fn average_assets(&self) -> AverageAssets {
        self.average_assets
    }
}

impl AccrualModel for DechowDichev {
    fn kind(&self) -> AccrualModelKind {
        AccrualModelKind::DechowDichev
    }

    fn target(&self) -> &'static str {
        WORKING_CAPITAL_ACCRUALS
    }

    fn regressors(&self) -> &'static [&'static str] {
        &[LAGGED_CASH_FLOW, CASH_FLOW, LEADING_CASH_FLOW]
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[
            FIRM,
            YEAR,
            FF48,
            TOTAL_ASSETS,
            OPERATING_CASH_FLOW,
            RECEIVABLES_CHANGE,
            INVENTORY_CHANGE,
            PAYABLES_CHANGE,
            TAXES_CHANGE,
            OTHER_CHANGE,
        ]
    }

    fn prepare(&self, panel: LazyFrame) -> LazyFrame {
        let avgta = col(AVERAGE_ASSETS);
        let adjacent_assets = lead_lag(col(TOTAL_ASSETS), self.average_assets.offset());
        let working_capital_change = col(RECEIVABLES_CHANGE)
            + col(INVENTORY_CHANGE)
            + col(PAYABLES_CHANGE)
            + col(TAXES_CHANGE)
            + col(OTHER_CHANGE);

        let panel = as_float(panel, &self.required_columns()[3..])
            .with_column(
                positive_or_null((col(TOTAL_ASSETS) + adjacent_assets) / lit(2.0)).alias(AVERAGE_ASSETS),
            )
            .with_columns([
                (col(OPERATING_CASH_FLOW) / avgta.clone()).alias(CASH_FLOW),
                (lit(-1.0) * working_capital_change / avgta).alias(WORKING_CAPITAL_ACCRUALS),
            ])
            .with_columns([
                lead_lag(col(CASH_FLOW), -1).alias(LAGGED_CASH_FLOW),
                lead_lag(col(CASH_FLOW), 1).alias(LEADING_CASH_FLOW),
            ]);

        complete_inputs(panel, self.target(), self.regressors())
    }
}

/// Cast to `Float64`, treating NaN and infinite values as missing.
fn as_float(panel: LazyFrame, columns: &[&str]) -> LazyFrame {
    panel.with_columns(
        columns
            .iter()
            .map(|name| {
                let value = col(*name).cast(DataType::Float64);
                when(value.clone().is_finite())
                    .then(value)
                    .otherwise(lit(NULL))
                    .alias(*name)
            })
            .collect::<Vec<_>>(),
    )
}

/// Scaling bases must be strictly positive.
fn positive_or_null(value: Expr) -> Expr {
    when(value.clone().gt(lit(0.0)))
        .then(value)
        .otherwise(lit(NULL))
}

/// Select keys and model variables, keeping rows where every variable is finite.
fn complete_inputs(panel: LazyFrame, target: &str, regressors: &[&str]) -> LazyFrame {
    let variables: Vec<&str> = std::iter::once(target).chain(regressors.iter().copied()).collect();

    let complete = variables
        .iter()
        .map(|name| col(*name).is_not_null().and(col(*name).is_finite()))
        .reduce(|acc, defined| acc.and(defined))
        .unwrap_or_else(|| lit(true));

    let selection: Vec<Expr> = [FIRM, FF48, YEAR]
        .iter()
        .chain(variables.iter())
        .map(|name| col(*name))
        .collect();

    panel.select(selection).filter(complete)
}

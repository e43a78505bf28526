//! Per industry-year estimation
//!
//! Runs an [`AccrualModel`] cross-sectionally:
//!
//! 1. derive the model inputs on the sorted firm-year panel
//! 2. drop industry-years with fewer than `min_obs` complete rows
//! 3. winsorize the inputs within each industry-year
//! 4. fit OLS per industry-year in parallel
//! 5. reassemble residuals and group statistics onto firm-years
//!
//! Groups that cannot be fit are left out of the output and counted in the
//! [`EstimationSummary`]. The output is sorted by industry, fiscal year and
//! firm regardless of the order in which fits complete.

use crate::config::{ConfigError, EstimatorConfig};
use crate::model::{AccrualModel, AccrualModelKind, DechowDichev, ModifiedJones};
use crate::ols::{FitError, OlsFit, ols, with_intercept};
use hobart_panel::columns::{FF48, FIRM, INDUSTRY_YEAR, YEAR};
use hobart_panel::{
    PanelError, ensure_unique_firm_years, filter_min_group_size, require_columns, sort_panel,
    standardize_keys, winsorize,
};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that abort an estimation run
#[derive(Debug, Error)]
pub enum EstimateError {
    /// Panel error
    #[error("Panel error: {0}")]
    Panel(#[from] PanelError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Counts of industry-year groups by outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EstimationSummary {
    /// Industry-years with at least one complete row
    pub groups: usize,
    /// Industry-years fitted
    pub fitted: usize,
    /// Industry-years below the minimum group size
    pub undersized: usize,
    /// Industry-years whose fit failed (singular design, constant target)
    pub failed: usize,
    /// Firm-years with a residual
    pub observations: usize,
}

/// Output of an estimation run.
#[derive(Debug, Clone)]
pub struct AccrualEstimates {
    /// Model that was estimated
    pub model: AccrualModelKind,
    /// Firm-year table of residuals and group statistics
    ///
    /// Columns: `gvkey`, `fyear`, `ff48_ind`, `<p>_da`, `<p>_nobs`,
    /// `<p>_adjr2`, `<p>_intercept` and `<p>_<regressor>` per regressor.
    pub table: DataFrame,
    /// Group outcome counts
    pub summary: EstimationSummary,
}

impl AccrualEstimates {
    /// Name of the discretionary accrual (residual) column.
    pub fn residual_column(&self) -> String {
        format!("{}_da", self.model.prefix())
    }

    /// Name of the group size column.
    pub fn nobs_column(&self) -> String {
        format!("{}_nobs", self.model.prefix())
    }
}

/// Estimate Modified Jones discretionary accruals.
pub fn estimate_mj_accruals(panel: &DataFrame, config: &EstimatorConfig) -> Result<AccrualEstimates, EstimateError> {
    estimate_accruals(panel, &ModifiedJones, config)
}

/// Estimate Dechow-Dichev discretionary accruals with lagged average assets.
///
/// Cash flows and working capital changes are scaled by the mean of prior and
/// current total assets. Use [`estimate_accruals`] with
/// `DechowDichev::new(AverageAssets::Leading)` for the current-and-next-year
/// average.
pub fn estimate_dd_accruals(panel: &DataFrame, config: &EstimatorConfig) -> Result<AccrualEstimates, EstimateError> {
    estimate_accruals(panel, &DechowDichev::default(), config)
}

/// Estimate discretionary accruals for `model` per industry-year.
///
/// # Arguments
/// * `panel` - Firm-year panel with the model's required columns
/// * `model` - Accrual model
/// * `config` - Minimum group size and outlier settings
///
/// # Errors
/// * [`EstimateError::Config`] if `config` is unusable for `model`
/// * [`EstimateError::Panel`] if a column is missing or a firm-year repeats
pub fn estimate_accruals(
    panel: &DataFrame,
    model: &dyn AccrualModel,
    config: &EstimatorConfig,
) -> Result<AccrualEstimates, EstimateError> {
    config.validate(model)?;
    require_columns(panel, model.required_columns())?;

    let sorted = sort_panel(
        standardize_keys(panel.clone().lazy()).with_column(col(FF48).cast(DataType::String)),
    )
    .collect()?;
    ensure_unique_firm_years(&sorted)?;

    let inputs = model.prepare(sorted.lazy()).collect()?;
    let groups = group_index(&inputs)?.len();

    let sample = winsorize(
        filter_min_group_size(inputs.lazy(), &INDUSTRY_YEAR, config.min_obs),
        &INDUSTRY_YEAR,
        &[YEAR],
        &config.winsorize,
    )?
    .collect()?;

    let slices = group_slices(&sample, model)?;
    let mut summary = EstimationSummary {
        groups,
        undersized: groups - slices.len(),
        ..Default::default()
    };

    let fits: Vec<(GroupSlice, Result<OlsFit, FitError>)> = slices
        .into_par_iter()
        .map(|slice| {
            let fit = ols(&slice.design, &slice.target);
            (slice, fit)
        })
        .collect();

    let mut table = EstimateColumns::new(model.parameter_count());
    for (slice, fit) in fits {
        match fit {
            Ok(fit) => {
                summary.fitted += 1;
                summary.observations += fit.nobs;
                table.push(&slice, &fit);
            }
            Err(err) => {
                summary.failed += 1;
                tracing::debug!(
                    model = %model.kind(),
                    industry = %slice.industry,
                    year = slice.year,
                    rows = slice.firms.len(),
                    error = %err,
                    "skipped industry-year"
                );
            }
        }
    }

    tracing::info!(
        model = %model.kind(),
        groups = summary.groups,
        fitted = summary.fitted,
        undersized = summary.undersized,
        failed = summary.failed,
        observations = summary.observations,
        "estimated accruals"
    );

    Ok(AccrualEstimates {
        model: model.kind(),
        table: table.finish(model)?,
        summary,
    })
}

/// Row indices per (industry, fiscal year), in key order.
fn group_index(df: &DataFrame) -> Result<BTreeMap<(String, i32), Vec<usize>>, EstimateError> {
    let industries = df.column(FF48)?.str()?;
    let years = df.column(YEAR)?.i32()?;

    let mut groups: BTreeMap<(String, i32), Vec<usize>> = BTreeMap::new();
    for (row, (industry, year)) in industries.into_iter().zip(years).enumerate() {
        if let (Some(industry), Some(year)) = (industry, year) {
            groups.entry((industry.to_string(), year)).or_default().push(row);
        }
    }

    Ok(groups)
}

/// One industry-year's regression inputs, owned so fits can run independently.
#[derive(Debug)]
struct GroupSlice {
    industry: String,
    year: i32,
    firms: Vec<String>,
    design: Array2<f64>,
    target: Array1<f64>,
}

/// Cut the sample into per-group design matrices.
///
/// Rows left incomplete by outlier truncation are dropped here, so a group
/// may reach the fitter with fewer than `min_obs` rows.
fn group_slices(sample: &DataFrame, model: &dyn AccrualModel) -> Result<Vec<GroupSlice>, EstimateError> {
    let firms = sample.column(FIRM)?.str()?;
    let target = float_values(sample, model.target())?;
    let regressors = model
        .regressors()
        .iter()
        .map(|name| float_values(sample, name))
        .collect::<Result<Vec<_>, _>>()?;

    let slices = group_index(sample)?
        .into_iter()
        .map(|((industry, year), rows)| {
            let complete: Vec<usize> = rows
                .into_iter()
                .filter(|&row| target[row].is_some() && regressors.iter().all(|values| values[row].is_some()))
                .collect();

            let mut x = Array2::<f64>::zeros((complete.len(), regressors.len()));
            let mut y = Array1::<f64>::zeros(complete.len());
            let mut group_firms = Vec::with_capacity(complete.len());

            for (i, &row) in complete.iter().enumerate() {
                y[i] = target[row].unwrap_or(f64::NAN);
                for (j, values) in regressors.iter().enumerate() {
                    x[[i, j]] = values[row].unwrap_or(f64::NAN);
                }
                group_firms.push(firms.get(row).unwrap_or_default().to_string());
            }

            GroupSlice {
                industry,
                year,
                firms: group_firms,
                design: with_intercept(&x),
                target: y,
            }
        })
        .collect();

    Ok(slices)
}

fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, EstimateError> {
    Ok(df.column(name)?.f64()?.into_iter().collect())
}

/// Column buffers of the output table.
#[derive(Debug)]
struct EstimateColumns {
    firms: Vec<String>,
    years: Vec<i32>,
    industries: Vec<String>,
    residuals: Vec<f64>,
    nobs: Vec<i64>,
    adj_r_squared: Vec<f64>,
    coefficients: Vec<Vec<f64>>,
}

impl EstimateColumns {
    fn new(parameters: usize) -> Self {
        Self {
            firms: Vec::new(),
            years: Vec::new(),
            industries: Vec::new(),
            residuals: Vec::new(),
            nobs: Vec::new(),
            adj_r_squared: Vec::new(),
            coefficients: vec![Vec::new(); parameters],
        }
    }

    fn push(&mut self, slice: &GroupSlice, fit: &OlsFit) {
        for (firm, residual) in slice.firms.iter().zip(fit.residuals.iter()) {
            self.firms.push(firm.clone());
            self.years.push(slice.year);
            self.industries.push(slice.industry.clone());
            self.residuals.push(*residual);
            self.nobs.push(fit.nobs as i64);
            self.adj_r_squared.push(fit.adj_r_squared);
            for (column, coefficient) in self.coefficients.iter_mut().zip(fit.coefficients.iter()) {
                column.push(*coefficient);
            }
        }
    }

    fn finish(self, model: &dyn AccrualModel) -> Result<DataFrame, EstimateError> {
        let prefix = model.prefix();
        let coefficient_names = std::iter::once("intercept").chain(model.regressors().iter().copied());

        let mut columns: Vec<Column> = vec![
            Series::new(FIRM.into(), self.firms).into(),
            Series::new(YEAR.into(), self.years).into(),
            Series::new(FF48.into(), self.industries).into(),
            Series::new(format!("{prefix}_da").into(), self.residuals).into(),
            Series::new(format!("{prefix}_nobs").into(), self.nobs).into(),
            Series::new(format!("{prefix}_adjr2").into(), self.adj_r_squared).into(),
        ];
        for (name, values) in coefficient_names.zip(self.coefficients) {
            columns.push(Series::new(format!("{prefix}_{name}").into(), values).into());
        }

        Ok(DataFrame::new(columns)?)
    }
}

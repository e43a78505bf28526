//! Pipeline runs
//!
//! - [`prepare`]: raw extract to analysis sample, estimating every configured model
//! - [`estimate`]: a single model's accrual table
//! - [`analyze`]: descriptive statistics and correlations of the analysis sample
//!
//! The file-free [`prepare_sample`] does the work of [`prepare`] on frames
//! already in memory.

use crate::config::{PathsConfig, PipelineConfig};
use crate::error::Result;
use crate::sample::prep_smp;
use hobart_accruals::{AccrualEstimates, AccrualModelKind, estimate_accruals};
use hobart_output::AnalysisReport;
use hobart_panel::{prep_base_sample, read_csv, write_csv};
use polars::prelude::DataFrame;
use std::path::PathBuf;

/// Outcome of [`prepare`].
#[derive(Debug, Clone)]
pub struct PreparedSample {
    /// Assembled analysis sample
    pub sample: DataFrame,
    /// Accrual estimates, one per configured model
    pub estimates: Vec<AccrualEstimates>,
}

/// Base sample, accrual estimates and analysis sample from in-memory inputs.
///
/// The accrual configuration is validated before any data is touched.
pub fn prepare_sample(
    raw: &DataFrame,
    ff12: &DataFrame,
    ff48: &DataFrame,
    config: &PipelineConfig,
) -> Result<PreparedSample> {
    let plans = config
        .accruals
        .plan_requiring(AccrualModelKind::ModifiedJones)?;

    let base = prep_base_sample(raw, ff12, ff48)?;

    let mut estimates = Vec::with_capacity(plans.len());
    for plan in &plans {
        estimates.push(estimate_accruals(&base, plan.model.as_ref(), &plan.config)?);
    }

    let sample = prep_smp(&base, &estimates, &config.assembly)?;
    Ok(PreparedSample { sample, estimates })
}

/// Build the analysis sample from the configured input files and write it.
///
/// Accrual tables are written too when `paths.accruals_dir` is set.
pub fn prepare(config: &PipelineConfig) -> Result<PreparedSample> {
    let paths = &config.paths;
    config.accruals.plan_requiring(AccrualModelKind::ModifiedJones)?;

    let (raw, ff12, ff48) = read_inputs(paths)?;
    let mut prepared = prepare_sample(&raw, &ff12, &ff48, config)?;

    write_csv(&mut prepared.sample, &paths.sample)?;
    tracing::info!(
        path = %paths.sample.display(),
        rows = prepared.sample.height(),
        "wrote analysis sample"
    );

    if paths.accruals_dir.is_some() {
        for estimate in &mut prepared.estimates {
            let path = accruals_path(paths, estimate.model);
            write_csv(&mut estimate.table, &path)?;
            tracing::info!(path = %path.display(), "wrote accrual estimates");
        }
    }

    Ok(prepared)
}

/// Estimate a single model from the configured input files and write its table.
///
/// The table goes to `paths.accruals_dir`, or next to the analysis sample
/// when no accruals directory is configured.
pub fn estimate(config: &PipelineConfig, kind: AccrualModelKind) -> Result<AccrualEstimates> {
    let paths = &config.paths;
    let plan = config.accruals.plan_for(kind)?;

    let (raw, ff12, ff48) = read_inputs(paths)?;
    let base = prep_base_sample(&raw, &ff12, &ff48)?;
    let mut estimates = estimate_accruals(&base, plan.model.as_ref(), &plan.config)?;

    let path = accruals_path(paths, kind);
    write_csv(&mut estimates.table, &path)?;
    tracing::info!(
        model = %kind,
        path = %path.display(),
        rows = estimates.table.height(),
        "wrote accrual estimates"
    );

    Ok(estimates)
}

/// Build the analysis report from the configured sample file and write it.
pub fn analyze(config: &PipelineConfig) -> Result<AnalysisReport> {
    let paths = &config.paths;
    let sample = read_csv(&paths.sample)?;

    let report = AnalysisReport::build(&sample, &config.analysis)?;
    report.write_to(&paths.results_dir)?;

    Ok(report)
}

fn read_inputs(paths: &PathsConfig) -> Result<(DataFrame, DataFrame, DataFrame)> {
    let raw = read_csv(&paths.compustat)?;
    let ff12 = read_csv(&paths.fama_french_12)?;
    let ff48 = read_csv(&paths.fama_french_48)?;
    tracing::info!(rows = raw.height(), "loaded compustat extract");
    Ok((raw, ff12, ff48))
}

/// Location of a model's accrual table.
pub fn accruals_path(paths: &PathsConfig, kind: AccrualModelKind) -> PathBuf {
    let file = format!("{}_accruals.csv", kind.prefix());
    match &paths.accruals_dir {
        Some(dir) => dir.join(file),
        None => paths
            .sample
            .parent()
            .map_or_else(|| PathBuf::from(&file), |dir| dir.join(&file)),
    }
}

//! Panel transforms
//!
//! Time-series and cross-sectional transforms over a firm-year panel:
//! contiguity-aware lead/lag alignment within firms, minimum group size
//! filtering, and outlier treatment within groups.
//!
//! All transforms are expressed as polars expressions over a [`LazyFrame`].
//! Lead/lag alignment runs as a window over the firm identifier and relies on
//! the panel being sorted by (firm, fiscal year); use [`sort_panel`] first.

use crate::columns::{FIRM, YEAR};
use crate::error::{PanelError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Rule used to pick a quantile between order statistics.
///
/// `Linear` matches the conventional interpolated quantile (numpy's default)
/// and pulls the extremes in for any group size, but moving the extreme
/// observation onto an interpolated bound shifts the next bound slightly.
/// `Nearest`, `Lower` and `Higher` always return an observed value, which
/// makes winsorization idempotent; at small `p` and small groups they return
/// the extremes themselves and leave them untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantileRule {
    /// Order statistic at the rounded position `p * (n - 1)`
    Nearest,
    /// Order statistic at the floor of the position
    Lower,
    /// Order statistic at the ceiling of the position
    Higher,
    /// Linear interpolation between the neighbouring order statistics
    #[default]
    Linear,
    /// Midpoint of the neighbouring order statistics
    Midpoint,
}

impl QuantileRule {
    /// Polars quantile method implementing this rule.
    pub const fn method(self) -> QuantileMethod {
        match self {
            Self::Nearest => QuantileMethod::Nearest,
            Self::Lower => QuantileMethod::Lower,
            Self::Higher => QuantileMethod::Higher,
            Self::Linear => QuantileMethod::Linear,
            Self::Midpoint => QuantileMethod::Midpoint,
        }
    }
}

/// Configuration for outlier treatment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WinsorizeConfig {
    /// Tail probability `p`; values outside `[q(p), q(1 - p)]` are treated (default: 0.01)
    pub percentile: f64,
    /// Set out-of-range values to null instead of clamping them (default: false)
    pub truncate: bool,
    /// Quantile rule for the bounds (default: linear interpolation)
    pub rule: QuantileRule,
}

impl Default for WinsorizeConfig {
    fn default() -> Self {
        Self {
            percentile: 0.01,
            truncate: false,
            rule: QuantileRule::default(),
        }
    }
}

impl WinsorizeConfig {
    /// Check the percentile is usable as a tail probability.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..0.5).contains(&self.percentile) {
            return Err(PanelError::InvalidPercentile(self.percentile));
        }
        Ok(())
    }
}

/// Sort a panel by firm and fiscal year.
pub fn sort_panel(panel: LazyFrame) -> LazyFrame {
    panel.sort([FIRM, YEAR], Default::default())
}

/// Cast the firm-year keys to their canonical types and drop rows without them.
///
/// Firm identifiers become strings (Compustat `gvkey` is often read as an
/// integer) and fiscal years become `Int32`.
pub fn standardize_keys(panel: LazyFrame) -> LazyFrame {
    panel
        .with_columns([
            col(FIRM).cast(DataType::String),
            col(YEAR).cast(DataType::Int32),
        ])
        .filter(col(FIRM).is_not_null().and(col(YEAR).is_not_null()))
}

/// Fail with [`PanelError::MissingColumn`] unless every column is present.
pub fn require_columns(df: &DataFrame, columns: &[&str]) -> Result<()> {
    match columns
        .iter()
        .find(|name| df.get_column_index(name).is_none())
    {
        Some(missing) => Err(PanelError::MissingColumn((*missing).to_string())),
        None => Ok(()),
    }
}

/// Align `value` with the same firm's observation `n` fiscal years away.
///
/// Positive `n` leads, negative `n` lags. The aligned value is only defined
/// when the row `n` positions away belongs to the same firm and its fiscal
/// year is exactly `fyear + n`; gaps in a firm's history yield null rather
/// than the nearest available year.
///
/// The panel must be sorted by (firm, fiscal year).
///
/// # Example
/// ```ignore
/// let panel = sort_panel(panel).with_column(lead_lag(col("at"), -1).alias("lagta"));
/// ```
pub fn lead_lag(value: Expr, n: i64) -> Expr {
    let adjacent_year = col(YEAR).shift(lit(-n)).over([col(FIRM)]);
    let adjacent_value = value.shift(lit(-n)).over([col(FIRM)]);

    when(adjacent_year.eq(col(YEAR) + lit(n)))
        .then(adjacent_value)
        .otherwise(lit(NULL))
}

/// Keep only rows whose group has at least `min_obs` members.
///
/// Groups below the threshold are dropped entirely.
pub fn filter_min_group_size(panel: LazyFrame, by: &[&str], min_obs: usize) -> LazyFrame {
    let keys: Vec<Expr> = by.iter().map(|key| col(*key)).collect();
    panel.filter(len().over(keys).gt_eq(lit(min_obs as IdxSize)))
}

/// Treat outliers of every numeric column within each group of `by`.
///
/// Bounds are the `p` and `1 - p` quantiles of the column inside the group,
/// so one group's tails never influence another group. Values strictly
/// outside the bounds are clamped to them, or set to null when
/// `config.truncate` is set; values equal to a bound are left unchanged.
/// Grouping keys, columns listed in `exclude` and non-numeric columns pass
/// through untouched. Treated columns are returned as `Float64`.
///
/// An empty `by` treats each column over the whole frame.
pub fn winsorize(
    panel: LazyFrame,
    by: &[&str],
    exclude: &[&str],
    config: &WinsorizeConfig,
) -> Result<LazyFrame> {
    config.validate()?;

    let mut panel = panel;
    let schema = panel.collect_schema()?;
    let targets: Vec<String> = schema
        .iter()
        .filter(|(name, dtype)| {
            (dtype.is_float() || dtype.is_integer())
                && !by.contains(&name.as_str())
                && !exclude.contains(&name.as_str())
        })
        .map(|(name, _)| name.to_string())
        .collect();

    if targets.is_empty() {
        return Ok(panel);
    }

    let keys: Vec<Expr> = by.iter().map(|key| col(*key)).collect();
    let treated: Vec<Expr> = targets
        .iter()
        .map(|name| treat_outliers(name, &keys, config))
        .collect();

    Ok(panel.with_columns(treated))
}

fn treat_outliers(name: &str, keys: &[Expr], config: &WinsorizeConfig) -> Expr {
    let value = col(name).cast(DataType::Float64);
    let method = config.rule.method();

    let mut lower = value.clone().quantile(lit(config.percentile), method);
    let mut upper = value
        .clone()
        .quantile(lit(1.0 - config.percentile), method);
    if !keys.is_empty() {
        lower = lower.over(keys);
        upper = upper.over(keys);
    }

    let treated = if config.truncate {
        when(
            value
                .clone()
                .lt(lower)
                .or(value.clone().gt(upper)),
        )
        .then(lit(NULL).cast(DataType::Float64))
        .otherwise(value)
    } else {
        when(value.clone().lt(lower.clone()))
            .then(lower)
            .when(value.clone().gt(upper.clone()))
            .then(upper)
            .otherwise(value)
    };

    treated.alias(name)
}

//! Estimation configuration
//!
//! [`EstimatorConfig`] holds the settings of a single model run.
//! [`AccrualsConfig`] is the user-facing form: a list of models with their
//! minimum group sizes and shared outlier settings, validated and resolved
//! into one [`ModelPlan`] per model before any data is read.

use crate::model::{AccrualModel, AccrualModelKind, AverageAssets};
use hobart_panel::{QuantileRule, WinsorizeConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Default minimum number of firms in an industry-year.
pub const DEFAULT_MIN_OBS: usize = 10;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Model name not recognised
    #[error("Unknown accrual model: {0:?} (expected one of mj, dd)")]
    UnknownModel(String),

    /// No model requested
    #[error("No accrual model configured")]
    NoModels,

    /// Same model requested more than once
    #[error("Accrual model configured more than once: {0}")]
    DuplicateModel(AccrualModelKind),

    /// `min_obs` list matches neither one value nor one value per model
    #[error("Expected 1 or {expected} min_obs values, got {actual}")]
    MinObsLength {
        /// Number of configured models
        expected: usize,
        /// Number of min_obs values
        actual: usize,
    },

    /// Minimum group size leaves no residual degree of freedom
    #[error("min_obs for {model} must exceed its {parameters} parameters, got {min_obs}")]
    MinObsTooSmall {
        /// Model the threshold applies to
        model: AccrualModelKind,
        /// Configured threshold
        min_obs: usize,
        /// Number of estimated coefficients
        parameters: usize,
    },

    /// Winsorization percentile outside the supported range
    #[error("Invalid winsorization percentile: {0} (must be in [0, 0.5))")]
    InvalidPercentile(f64),

    /// A model the run depends on was not configured
    #[error("Accrual model required but not configured: {0}")]
    MissingModel(AccrualModelKind),
}

/// Settings for one estimation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Minimum firms per industry-year (default: 10)
    pub min_obs: usize,
    /// Outlier treatment applied within industry-years before fitting
    pub winsorize: WinsorizeConfig,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            min_obs: DEFAULT_MIN_OBS,
            winsorize: WinsorizeConfig::default(),
        }
    }
}

impl EstimatorConfig {
    /// Check the settings are usable for `model`.
    pub fn validate(&self, model: &dyn AccrualModel) -> Result<(), ConfigError> {
        if self.winsorize.validate().is_err() {
            return Err(ConfigError::InvalidPercentile(self.winsorize.percentile));
        }

        let parameters = model.parameter_count();
        if self.min_obs <= parameters {
            return Err(ConfigError::MinObsTooSmall {
                model: model.kind(),
                min_obs: self.min_obs,
                parameters,
            });
        }

        Ok(())
    }
}

/// Accrual estimation section of the pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccrualsConfig {
    /// Models to estimate, by name (`mj`, `dd`)
    pub models: Vec<String>,
    /// One minimum group size for all models, or one per model
    pub min_obs: Vec<usize>,
    /// Winsorization tail probability (default: 0.01)
    pub winsorize_pct: f64,
    /// Null out outliers instead of clamping them (default: false)
    pub truncate: bool,
    /// Quantile rule for winsorization bounds (default: linear interpolation)
    pub quantile_rule: QuantileRule,
    /// Dechow-Dichev average assets window
    pub average_assets: AverageAssets,
}

impl Default for AccrualsConfig {
    fn default() -> Self {
        Self {
            models: vec!["mj".to_string(), "dd".to_string()],
            min_obs: vec![DEFAULT_MIN_OBS],
            winsorize_pct: 0.01,
            truncate: false,
            quantile_rule: QuantileRule::default(),
            average_assets: AverageAssets::default(),
        }
    }
}

/// A validated model together with its run settings.
#[derive(Debug)]
pub struct ModelPlan {
    /// Model to estimate
    pub model: Box<dyn AccrualModel>,
    /// Settings for this model
    pub config: EstimatorConfig,
}

impl ModelPlan {
    /// Which model is planned.
    pub fn kind(&self) -> AccrualModelKind {
        self.model.kind()
    }
}

impl AccrualsConfig {
    /// Outlier settings shared by all models.
    pub const fn winsorize(&self) -> WinsorizeConfig {
        WinsorizeConfig {
            percentile: self.winsorize_pct,
            truncate: self.truncate,
            rule: self.quantile_rule,
        }
    }

    /// Parse the configured model names.
    pub fn model_kinds(&self) -> Result<Vec<AccrualModelKind>, ConfigError> {
        if self.models.is_empty() {
            return Err(ConfigError::NoModels);
        }

        let mut seen = HashSet::new();
        self.models
            .iter()
            .map(|name| {
                let kind: AccrualModelKind = name.parse()?;
                if !seen.insert(kind) {
                    return Err(ConfigError::DuplicateModel(kind));
                }
                Ok(kind)
            })
            .collect()
    }

    /// Validate the configuration and resolve one plan per model.
    pub fn plan(&self) -> Result<Vec<ModelPlan>, ConfigError> {
        let kinds = self.model_kinds()?;

        if self.min_obs.len() != 1 && self.min_obs.len() != kinds.len() {
            return Err(ConfigError::MinObsLength {
                expected: kinds.len(),
                actual: self.min_obs.len(),
            });
        }

        let winsorize = self.winsorize();
        kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                let min_obs = if self.min_obs.len() == 1 {
                    self.min_obs[0]
                } else {
                    self.min_obs[i]
                };
                let plan = ModelPlan {
                    model: kind.model(self.average_assets),
                    config: EstimatorConfig { min_obs, winsorize },
                };
                plan.config.validate(plan.model.as_ref())?;
                Ok(plan)
            })
            .collect()
    }

    /// Like [`Self::plan`], failing unless `required` is among the models.
    pub fn plan_requiring(&self, required: AccrualModelKind) -> Result<Vec<ModelPlan>, ConfigError> {
        let plans = self.plan()?;
        if plans.iter().all(|plan| plan.kind() != required) {
            return Err(ConfigError::MissingModel(required));
        }
        Ok(plans)
    }

    /// Plan a single model run.
    ///
    /// Uses the configured settings of `kind` when it is among the models,
    /// otherwise the first `min_obs` value and the shared outlier settings.
    pub fn plan_for(&self, kind: AccrualModelKind) -> Result<ModelPlan, ConfigError> {
        if self.model_kinds()?.contains(&kind) {
            if let Some(plan) = self.plan()?.into_iter().find(|plan| plan.kind() == kind) {
                return Ok(plan);
            }
        }

        let plan = ModelPlan {
            model: kind.model(self.average_assets),
            config: EstimatorConfig {
                min_obs: self.min_obs.first().copied().unwrap_or(DEFAULT_MIN_OBS),
                winsorize: self.winsorize(),
            },
        };
        plan.config.validate(plan.model.as_ref())?;
        Ok(plan)
    }
}

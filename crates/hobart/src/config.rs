//! Pipeline configuration
//!
//! All settings of a run live in one TOML file. Every section is optional
//! and falls back to its defaults.

use crate::error::Result;
use crate::sample::AssemblyConfig;
use hobart_accruals::AccrualsConfig;
use hobart_output::AnalysisConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Input and output locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Compustat Fundamentals Annual extract
    pub compustat: PathBuf,
    /// SIC to Fama-French 12 industry mapping
    pub fama_french_12: PathBuf,
    /// SIC to Fama-French 48 industry mapping
    pub fama_french_48: PathBuf,
    /// Assembled analysis sample
    pub sample: PathBuf,
    /// Directory for the per-model accrual tables, not written when unset
    pub accruals_dir: Option<PathBuf>,
    /// Directory for report tables
    pub results_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            compustat: PathBuf::from("data/external/cstat_us_sample.csv"),
            fama_french_12: PathBuf::from("data/external/fama_french_12_industries.csv"),
            fama_french_48: PathBuf::from("data/external/fama_french_48_industries.csv"),
            sample: PathBuf::from("data/generated/acc_sample.csv"),
            accruals_dir: None,
            results_dir: PathBuf::from("output"),
        }
    }
}

/// Configuration of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// File locations
    pub paths: PathsConfig,
    /// Accrual models and estimation settings
    pub accruals: AccrualsConfig,
    /// Sample assembly settings
    pub assembly: AssemblyConfig,
    /// Report settings
    pub analysis: AnalysisConfig,
}

impl PipelineConfig {
    /// Load the configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse the configuration from TOML text and check the accrual settings.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.accruals.plan()?;
        Ok(config)
    }
}

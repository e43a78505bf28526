#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod estimate;
pub mod model;
pub mod ols;

pub use config::{AccrualsConfig, ConfigError, EstimatorConfig, ModelPlan};
pub use estimate::{
    AccrualEstimates, EstimateError, EstimationSummary, estimate_accruals, estimate_dd_accruals,
    estimate_mj_accruals,
};
pub use model::{AccrualModel, AccrualModelKind, AverageAssets, DechowDichev, ModifiedJones};
pub use ols::{FitError, OlsFit, ols};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

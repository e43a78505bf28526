#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod pipeline;
pub mod sample;

// Re-export main types from sub-crates
pub use hobart_accruals as accruals;
pub use hobart_output as output;
pub use hobart_panel as panel;

pub use config::{PathsConfig, PipelineConfig};
pub use error::{PipelineError, Result};
pub use pipeline::{PreparedSample, accruals_path, analyze, estimate, prepare, prepare_sample};
pub use sample::{AssemblyConfig, BASE_COLUMNS, DEFAULT_ACQUISITION_FILL, OUTPUT_COLUMNS, prep_smp};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

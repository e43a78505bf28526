#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod base;
pub mod columns;
pub mod error;
pub mod io;
pub mod transform;

pub use base::{ensure_unique_firm_years, prep_base_sample};
pub use error::{PanelError, Result};
pub use io::{read_csv, write_csv};
pub use transform::{
    QuantileRule, WinsorizeConfig, filter_min_group_size, lead_lag, require_columns, sort_panel,
    standardize_keys, winsorize,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Descriptive statistics table.

use crate::analysis::column_values;
use crate::error::ReportError;
use crate::latex::{escape_for_latex, format_count, format_number};
use crate::stats::{mean, quantile_sorted, std_dev};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimals shown in rendered tables.
const PRECISION: usize = 3;

/// Summary statistics of one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveRow {
    /// Variable name
    pub variable: String,
    /// Number of non-missing observations
    pub n: usize,
    /// Mean
    pub mean: f64,
    /// Sample standard deviation
    pub std_dev: f64,
    /// Minimum
    pub min: f64,
    /// First quartile
    pub p25: f64,
    /// Median
    pub median: f64,
    /// Third quartile
    pub p75: f64,
    /// Maximum
    pub max: f64,
}

impl DescriptiveRow {
    /// Summarize the values of one variable.
    ///
    /// Quartiles are linearly interpolated.
    pub fn from_values(variable: impl Into<String>, values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        Self {
            variable: variable.into(),
            n: sorted.len(),
            mean: mean(&sorted),
            std_dev: std_dev(&sorted),
            min: sorted.first().copied().unwrap_or(f64::NAN),
            p25: quantile_sorted(&sorted, 0.25),
            median: quantile_sorted(&sorted, 0.5),
            p75: quantile_sorted(&sorted, 0.75),
            max: sorted.last().copied().unwrap_or(f64::NAN),
        }
    }

    fn statistics(&self) -> [f64; 7] {
        [
            self.mean,
            self.std_dev,
            self.min,
            self.p25,
            self.median,
            self.p75,
            self.max,
        ]
    }
}

/// Descriptive statistics for a set of variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveTable {
    /// One row per variable, in the requested order
    pub rows: Vec<DescriptiveRow>,
}

impl DescriptiveTable {
    /// Column headers of the rendered table after the variable name.
    pub const HEADERS: [&'static str; 8] = [
        "N",
        "Mean",
        "Std. dev.",
        "Min.",
        "25 %",
        "Median",
        "75 %",
        "Max.",
    ];

    /// Summarize `variables` of `df`, ignoring missing values.
    pub fn from_frame(df: &DataFrame, variables: &[&str]) -> Result<Self, ReportError> {
        let rows = variables
            .iter()
            .map(|name| Ok(DescriptiveRow::from_values(*name, &column_values(df, name)?)))
            .collect::<Result<Vec<_>, ReportError>>()?;
        Ok(Self { rows })
    }

    /// Render as a LaTeX `table` environment with booktabs rules.
    pub fn to_latex(&self) -> String {
        let mut output = String::new();

        output.push_str("\\begin{table}\n");
        output.push_str("\\caption{Descriptive Statistics}\n");
        output.push_str("\\centering\n");
        output.push_str("\\begin{tabular}[t]{lrrrrrrrr}\n");
        output.push_str("\\toprule\n");
        let headers: Vec<String> = Self::HEADERS.iter().map(|h| escape_for_latex(h)).collect();
        output.push_str(&format!(" & {} \\\\\n", headers.join(" & ")));
        output.push_str("\\midrule\n");

        for row in &self.rows {
            let mut cells = vec![escape_for_latex(&row.variable), format_count(row.n)];
            cells.extend(row.statistics().iter().map(|v| format_number(*v, PRECISION)));
            output.push_str(&format!("{} \\\\\n", cells.join(" & ")));
        }

        output.push_str("\\bottomrule\n");
        output.push_str("\\end{tabular}\n");
        output.push_str("\\end{table}\n");
        output
    }

    /// Render as a Markdown table.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("| Variable | {} |\n", Self::HEADERS.join(" | ")));
        output.push_str(&format!("|----------|{}\n", "---:|".repeat(Self::HEADERS.len())));

        for row in &self.rows {
            let stats: Vec<String> = row
                .statistics()
                .iter()
                .map(|v| format_number(*v, PRECISION))
                .collect();
            output.push_str(&format!(
                "| {} | {} | {} |\n",
                row.variable,
                format_count(row.n),
                stats.join(" | ")
            ));
        }

        output
    }
}

impl fmt::Display for DescriptiveTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<14} {:>8} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "Variable", "N", "Mean", "Std. dev.", "Min.", "25 %", "Median", "75 %", "Max."
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<14} {:>8} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3}",
                row.variable, row.n, row.mean, row.std_dev, row.min, row.p25, row.median, row.p75, row.max
            )?;
        }
        Ok(())
    }
}

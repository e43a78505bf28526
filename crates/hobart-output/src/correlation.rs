//! Correlation table
//!
//! Pearson correlations above the diagonal and Spearman rank correlations
//! below it, computed over the observations where all variables are present.
//! Each cell carries a two-sided p-value from Student's t distribution.

use crate::error::ReportError;
use crate::latex::{escape_for_latex, format_count, format_number};
use crate::stats::{correlation_p_value, pearson, spearman};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// One off-diagonal cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationCell {
    /// Correlation coefficient
    pub coefficient: f64,
    /// Two-sided p-value
    pub p_value: f64,
}

impl CorrelationCell {
    fn new(coefficient: f64, n: usize) -> Self {
        Self {
            coefficient,
            p_value: correlation_p_value(coefficient, n),
        }
    }
}

/// Pearson / Spearman correlation matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationTable {
    /// Variable names, in row and column order
    pub variables: Vec<String>,
    /// `cells[i][j]`: Pearson for `i < j`, Spearman for `i > j`, none on the diagonal
    pub cells: Vec<Vec<Option<CorrelationCell>>>,
    /// Observations used
    pub observations: usize,
    /// Significance level for highlighting
    pub significance: f64,
}

impl CorrelationTable {
    /// Compute correlations between `variables` of `df`.
    ///
    /// Rows with a missing value in any of the variables are dropped first.
    pub fn from_frame(df: &DataFrame, variables: &[&str], significance: f64) -> Result<Self, ReportError> {
        let columns = complete_columns(df, variables)?;
        let observations = columns.first().map_or(0, Vec::len);
        let k = variables.len();

        let mut cells = vec![vec![None; k]; k];
        for i in 0..k {
            for j in 0..k {
                cells[i][j] = match i.cmp(&j) {
                    std::cmp::Ordering::Less => Some(CorrelationCell::new(
                        pearson(&columns[i], &columns[j]),
                        observations,
                    )),
                    std::cmp::Ordering::Greater => Some(CorrelationCell::new(
                        spearman(&columns[i], &columns[j]),
                        observations,
                    )),
                    std::cmp::Ordering::Equal => None,
                };
            }
        }

        Ok(Self {
            variables: variables.iter().map(|v| v.to_string()).collect(),
            cells,
            observations,
            significance,
        })
    }

    /// Pearson correlation of variables `i` and `j`.
    pub fn pearson(&self, i: usize, j: usize) -> Option<CorrelationCell> {
        let (row, col) = if i < j { (i, j) } else { (j, i) };
        self.cells.get(row)?.get(col).copied().flatten()
    }

    /// Spearman correlation of variables `i` and `j`.
    pub fn spearman(&self, i: usize, j: usize) -> Option<CorrelationCell> {
        let (row, col) = if i > j { (i, j) } else { (j, i) };
        self.cells.get(row)?.get(col).copied().flatten()
    }

    fn is_significant(&self, cell: &CorrelationCell) -> bool {
        cell.p_value < self.significance
    }

    /// Render as a LaTeX `threeparttable` with significant cells in bold.
    ///
    /// Columns are labelled A, B, ... and rows `A: variable`.
    pub fn to_latex(&self) -> String {
        let letters = column_letters(self.variables.len());
        let mut output = String::new();

        output.push_str("\\begin{threeparttable}\n");
        output.push_str(&format!("\\begin{{tabular}}{{l{}}}\n", "r".repeat(letters.len())));
        output.push_str("\\toprule\n");
        output.push_str(&format!(" & {} \\\\\n", letters.join(" & ")));
        output.push_str("\\midrule\n");

        for (i, variable) in self.variables.iter().enumerate() {
            let mut cells = vec![format!("{}: {}", letters[i], escape_for_latex(variable))];
            for cell in &self.cells[i] {
                cells.push(match cell {
                    Some(cell) if self.is_significant(cell) => {
                        format!("\\bfseries {}", format_number(cell.coefficient, 2))
                    }
                    Some(cell) => format_number(cell.coefficient, 2),
                    None => String::new(),
                });
            }
            output.push_str(&format!("{} \\\\\n", cells.join(" & ")));
        }

        output.push_str("\\bottomrule\n");
        output.push_str("\\end{tabular}\n");
        output.push_str("\\begin{tablenotes}\n");
        output.push_str(&format!(
            "\\item This table reports Pearson correlations above and Spearman correlations below the diagonal. \
             Number of observations: {}. Correlations with significance levels below {}\\% appear in bold print.\n",
            format_count(self.observations),
            (self.significance * 100.0).round()
        ));
        output.push_str("\\end{tablenotes}\n");
        output.push_str("\\end{threeparttable}\n");
        output
    }

    /// Render as a Markdown table with significant cells in bold.
    pub fn to_markdown(&self) -> String {
        let letters = column_letters(self.variables.len());
        let mut output = String::new();

        output.push_str(&format!("| | {} |\n", letters.join(" | ")));
        output.push_str(&format!("|---|{}\n", "---:|".repeat(letters.len())));

        for (i, variable) in self.variables.iter().enumerate() {
            let cells: Vec<String> = self.cells[i]
                .iter()
                .map(|cell| match cell {
                    Some(cell) if self.is_significant(cell) => {
                        format!("**{}**", format_number(cell.coefficient, 2))
                    }
                    Some(cell) => format_number(cell.coefficient, 2),
                    None => String::new(),
                })
                .collect();
            output.push_str(&format!("| {}: {} | {} |\n", letters[i], variable, cells.join(" | ")));
        }

        output.push_str(&format!(
            "\nPearson above, Spearman below the diagonal. N = {}. Bold: p < {}.\n",
            format_count(self.observations),
            self.significance
        ));
        output
    }
}

/// Columns of `variables` restricted to rows where all of them are present.
fn complete_columns(df: &DataFrame, variables: &[&str]) -> Result<Vec<Vec<f64>>, ReportError> {
    let raw = variables
        .iter()
        .map(|name| {
            let values = df.column(name)?.cast(&DataType::Float64)?;
            Ok(values.f64()?.into_iter().collect::<Vec<Option<f64>>>())
        })
        .collect::<Result<Vec<_>, ReportError>>()?;

    let complete: Vec<usize> = (0..df.height())
        .filter(|&row| raw.iter().all(|column| column[row].is_some_and(f64::is_finite)))
        .collect();

    Ok(raw
        .iter()
        .map(|column| complete.iter().filter_map(|&row| column[row]).collect())
        .collect())
}

fn column_letters(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            let letter = char::from(b'A' + (i % 26) as u8);
            if i < 26 { letter.to_string() } else { format!("{letter}{}", i / 26) }
        })
        .collect()
}

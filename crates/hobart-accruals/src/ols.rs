//! Ordinary least squares
//!
//! Fits `y = X b + e` through a Householder QR decomposition of the design
//! matrix. The decomposition doubles as a rank check: a column whose norm
//! collapses after projecting out the preceding columns is a linear
//! combination of them, and the fit is refused instead of returning
//! arbitrary coefficients.
//!
//! The design matrix is expected to carry an intercept column (see
//! [`with_intercept`]); R² is measured against the mean of `y`.

use ndarray::{Array1, Array2, s};
use thiserror::Error;

/// Relative column norm below which a column counts as linearly dependent.
const RANK_TOLERANCE: f64 = 1e-10;

/// Errors that can occur while fitting a regression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// Fewer observations than needed for a positive residual degree of freedom
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Design matrix columns are linearly dependent
    #[error("Rank deficient design matrix: column {rank} depends on the preceding columns ({columns} columns)")]
    RankDeficient {
        /// Number of independent columns found before the dependent one
        rank: usize,
        /// Number of columns
        columns: usize,
    },

    /// Length of `y` differs from the rows of `X`
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Dependent variable is constant, so R² is undefined
    #[error("Dependent variable has zero variance")]
    ZeroVariance,

    /// NaN or infinite value in the inputs
    #[error("Non-finite value in regression inputs")]
    NonFinite,
}

/// Result of an OLS fit.
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    /// Estimated coefficients, one per design matrix column
    pub coefficients: Array1<f64>,
    /// Residuals `y - X b`, in the row order of the inputs
    pub residuals: Array1<f64>,
    /// Number of observations
    pub nobs: usize,
    /// Residual degrees of freedom (`nobs - columns`)
    pub df_resid: usize,
    /// Coefficient of determination
    pub r_squared: f64,
    /// R² adjusted for the number of regressors
    pub adj_r_squared: f64,
}

/// Prepend a column of ones to a regressor matrix.
pub fn with_intercept(regressors: &Array2<f64>) -> Array2<f64> {
    let (n, k) = regressors.dim();
    let mut design = Array2::<f64>::ones((n, k + 1));
    design.slice_mut(s![.., 1..]).assign(regressors);
    design
}

/// Fit `y` on the columns of `x` by least squares.
///
/// # Arguments
/// * `x` - Design matrix (n x k), including the intercept column
/// * `y` - Dependent variable (n)
///
/// # Errors
/// * [`FitError::InsufficientData`] if `n <= k`
/// * [`FitError::RankDeficient`] if the columns of `x` are collinear
/// * [`FitError::ZeroVariance`] if `y` is constant
/// * [`FitError::NonFinite`] if any input is NaN or infinite
pub fn ols(x: &Array2<f64>, y: &Array1<f64>) -> Result<OlsFit, FitError> {
    let (n, k) = x.dim();
    if y.len() != n {
        return Err(FitError::DimensionMismatch {
            expected: n,
            actual: y.len(),
        });
    }
    if n <= k {
        return Err(FitError::InsufficientData {
            required: k + 1,
            actual: n,
        });
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(FitError::NonFinite);
    }

    let (r, qty) = householder_qr(x, y)?;
    let coefficients = back_substitute(&r, &qty);
    let residuals = y - &x.dot(&coefficients);

    let mean = y.sum() / n as f64;
    let tss: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    if tss <= f64::EPSILON * y.dot(y) {
        return Err(FitError::ZeroVariance);
    }

    let ssr = residuals.dot(&residuals);
    let df_resid = n - k;
    let r_squared = 1.0 - ssr / tss;
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n - 1) as f64 / df_resid as f64;

    Ok(OlsFit {
        coefficients,
        residuals,
        nobs: n,
        df_resid,
        r_squared,
        adj_r_squared,
    })
}

/// Reduce `x` to upper-triangular `R` and apply the same reflections to `y`.
///
/// Returns the leading k x k block of `R` and the first k entries of `Q'y`.
fn householder_qr(x: &Array2<f64>, y: &Array1<f64>) -> Result<(Array2<f64>, Array1<f64>), FitError> {
    let k = x.ncols();
    let column_norms: Vec<f64> = x.columns().into_iter().map(|c| c.dot(&c).sqrt()).collect();

    let mut a = x.to_owned();
    let mut b = y.to_owned();

    for j in 0..k {
        let norm = {
            let tail = a.slice(s![j.., j]);
            tail.dot(&tail).sqrt()
        };
        if norm <= RANK_TOLERANCE * column_norms[j].max(f64::MIN_POSITIVE) {
            return Err(FitError::RankDeficient {
                rank: j,
                columns: k,
            });
        }

        // Reflect onto -sign(a_jj) * norm to avoid cancellation.
        let alpha = if a[[j, j]] > 0.0 { -norm } else { norm };
        let mut v = a.slice(s![j.., j]).to_owned();
        v[0] -= alpha;
        let v_norm_sq = v.dot(&v);

        for c in j..k {
            let mut column = a.slice_mut(s![j.., c]);
            let scale = 2.0 * v.dot(&column) / v_norm_sq;
            column.scaled_add(-scale, &v);
        }

        let mut tail = b.slice_mut(s![j..]);
        let scale = 2.0 * v.dot(&tail) / v_norm_sq;
        tail.scaled_add(-scale, &v);
    }

    Ok((a.slice(s![..k, ..]).to_owned(), b.slice(s![..k]).to_owned()))
}

/// Solve `R b = c` for upper-triangular `R`.
fn back_substitute(r: &Array2<f64>, c: &Array1<f64>) -> Array1<f64> {
    let k = c.len();
    let mut b = Array1::<f64>::zeros(k);

    for i in (0..k).rev() {
        let mut acc = c[i];
        for j in (i + 1)..k {
            acc -= r[[i, j]] * b[j];
        }
        b[i] = acc / r[[i, i]];
    }

    b
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ndarray::array;

    #[test]
    fn test_simple_regression() {
        let x = with_intercept(&array![[1.0], [2.0], [3.0], [4.0], [5.0]]);
        let y = array![2.0, 4.0, 5.0, 4.0, 5.0];

        let fit = ols(&x, &y).unwrap();

        assert_relative_eq!(fit.coefficients[0], 2.2, epsilon = 1e-12);
        assert_relative_eq!(fit.coefficients[1], 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.residuals[0], -0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.residuals[2], 1.0, epsilon = 1e-12);
        assert_eq!(fit.nobs, 5);
        assert_eq!(fit.df_resid, 3);
        // SSR = 2.4, TSS = 6
        assert_relative_eq!(fit.r_squared, 0.6, epsilon = 1e-12);
        assert_relative_eq!(fit.adj_r_squared, 1.0 - 0.4 * 4.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_exact_linear_relation() {
        let regressors = array![
            [1.0, 2.0],
            [2.0, 1.0],
            [3.0, 4.0],
            [4.0, 3.0],
            [5.0, 6.0],
            [6.0, 5.0]
        ];
        let x = with_intercept(&regressors);
        let y = regressors.column(0).mapv(|v| 2.0 * v) - regressors.column(1).mapv(|v| 3.0 * v) + 1.0;

        let fit = ols(&x, &y).unwrap();

        assert_abs_diff_eq!(fit.coefficients[0], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(fit.coefficients[1], 2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(fit.coefficients[2], -3.0, epsilon = 1e-10);
        assert!(fit.residuals.iter().all(|r| r.abs() < 1e-10));
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_residuals_sum_to_zero_with_intercept() {
        let x = with_intercept(&array![[0.3, 1.0], [1.2, -0.5], [2.8, 0.7], [-1.1, 2.2], [0.9, 0.1], [1.7, -1.4]]);
        let y = array![0.5, -0.2, 1.9, 0.4, 0.0, -0.8];

        let fit = ols(&x, &y).unwrap();

        assert_abs_diff_eq!(fit.residuals.sum(), 0.0, epsilon = 1e-12);
        assert!(fit.adj_r_squared <= 1.0);
    }

    #[test]
    fn test_collinear_columns_are_rejected() {
        let x = with_intercept(&array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0], [4.0, 8.0], [5.0, 10.0]]);
        let y = array![1.0, 3.0, 2.0, 5.0, 4.0];

        let err = ols(&x, &y).unwrap_err();
        assert_eq!(err, FitError::RankDeficient { rank: 2, columns: 3 });
    }

    #[test]
    fn test_constant_regressor_is_rejected() {
        let x = with_intercept(&array![[0.5], [0.5], [0.5], [0.5]]);
        let y = array![1.0, 2.0, 3.0, 4.0];

        assert!(matches!(ols(&x, &y), Err(FitError::RankDeficient { rank: 1, .. })));
    }

    #[test]
    fn test_insufficient_observations() {
        let x = with_intercept(&array![[1.0], [2.0]]);
        let y = array![1.0, 2.0];

        assert_eq!(
            ols(&x, &y).unwrap_err(),
            FitError::InsufficientData {
                required: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_constant_target_is_rejected() {
        let x = with_intercept(&array![[1.0], [2.0], [3.0], [4.0]]);
        let y = array![0.7, 0.7, 0.7, 0.7];

        assert_eq!(ols(&x, &y).unwrap_err(), FitError::ZeroVariance);
    }

    #[test]
    fn test_non_finite_input_is_rejected() {
        let x = with_intercept(&array![[1.0], [f64::NAN], [3.0], [4.0]]);
        let y = array![1.0, 2.0, 3.0, 5.0];

        assert_eq!(ols(&x, &y).unwrap_err(), FitError::NonFinite);
    }

    #[test]
    fn test_dimension_mismatch() {
        let x = with_intercept(&array![[1.0], [2.0], [3.0]]);
        let y = array![1.0, 2.0];

        assert!(matches!(ols(&x, &y), Err(FitError::DimensionMismatch { expected: 3, actual: 2 })));
    }

    #[test]
    fn test_with_intercept_layout() {
        let design = with_intercept(&array![[4.0, 5.0], [6.0, 7.0]]);
        assert_eq!(design, array![[1.0, 4.0, 5.0], [1.0, 6.0, 7.0]]);
    }
}

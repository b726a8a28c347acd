//! # Covariance Matrix Calculations
//!
//! Covariance of fitted parameters from the Jacobian of the residuals.

use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

use crate::error::{EchemError, Result};

/// Unscaled covariance `inv(J^T J)`.
///
/// With residuals already divided by their standard deviations this is the
/// parameter covariance when the supplied errors are taken at face value.
pub fn unscaled_covariance(jacobian: &Array2<f64>) -> Result<Array2<f64>> {
    let jtj = jacobian.t().dot(jacobian);
    let n = jtj.nrows();
    let m = DMatrix::from_fn(n, n, |i, j| jtj[[i, j]]);

    let inv = m.try_inverse().ok_or_else(|| {
        EchemError::InvalidParameter(
            "J^T J is singular; the fitted parameters are not identifiable".to_string(),
        )
    })?;
    if inv.iter().any(|v| !v.is_finite()) {
        return Err(EchemError::InvalidParameter(
            "covariance matrix is not finite".to_string(),
        ));
    }

    Ok(Array2::from_shape_fn((n, n), |(i, j)| inv[(i, j)]))
}

/// Calculate covariance matrix from Jacobian matrix.
///
/// For nonlinear least-squares problems, the covariance matrix is estimated as:
///   covar = redchi * inv(J^T * J)
/// where redchi is the reduced chi-square (chi^2 / dof).
pub fn calculate_covariance(jacobian: &Array2<f64>, redchi: f64) -> Result<Array2<f64>> {
    Ok(unscaled_covariance(jacobian)? * redchi)
}

/// Calculate correlation matrix from covariance matrix.
///
///   correl[i,j] = covar[i,j] / sqrt(covar[i,i] * covar[j,j])
pub fn calculate_correlation(covar: &Array2<f64>) -> Array2<f64> {
    let n = covar.nrows();
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            return 1.0;
        }
        let denom = (covar[[i, i]] * covar[[j, j]]).sqrt();
        if denom > 0.0 {
            covar[[i, j]] / denom
        } else {
            0.0
        }
    })
}

/// Standard errors are the square roots of the diagonal; negative or NaN
/// diagonal entries give 0.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    covar
        .diag()
        .mapv(|v| if v > 0.0 { v.sqrt() } else { 0.0 })
}

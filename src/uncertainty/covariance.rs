//! # Covariance Matrix Calculations
//!
//! This module provides functions for calculating and manipulating covariance
//! matrices from Jacobian matrices in nonlinear least-squares optimization.

use crate::error::{ProfileFitError, Result};
use crate::utils::matrix_convert::{nalgebra_to_ndarray, ndarray_to_nalgebra};
use ndarray::{Array1, Array2};

/// Calculate covariance matrix from Jacobian matrix.
///
/// For nonlinear least-squares problems, the covariance matrix is estimated as:
///   covar = redchi * inv(J^T * J)
/// where:
///   - J is the Jacobian matrix of the model w.r.t. the varying parameters
///   - redchi is the reduced chi-square (chi^2 / dof)
///
/// `J^T J` is inverted through its Cholesky factor, with a general LU inverse
/// as fallback for matrices that are only marginally positive definite.
///
/// # Errors
///
/// * `SingularMatrix` if `J^T J` cannot be inverted or the inverse is not finite
pub fn calculate_covariance(jacobian: &Array2<f64>, redchi: f64) -> Result<Array2<f64>> {
    let j = ndarray_to_nalgebra(jacobian.view());
    let jtj = j.transpose() * &j;

    let inverse = match jtj.clone().cholesky() {
        Some(cholesky) => cholesky.inverse(),
        None => jtj.try_inverse().ok_or(ProfileFitError::SingularMatrix)?,
    };

    let covar = nalgebra_to_ndarray(&inverse) * redchi;
    if covar.iter().any(|c| !c.is_finite()) {
        return Err(ProfileFitError::SingularMatrix);
    }

    Ok(covar)
}

/// Calculate correlation matrix from covariance matrix.
///
/// The correlation matrix is calculated as:
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

/// Extract standard errors from the covariance matrix.
///
/// Standard errors are the square roots of the diagonal elements
/// of the covariance matrix.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    covar.diag().mapv(|v| if v > 0.0 { v.sqrt() } else { 0.0 })
}

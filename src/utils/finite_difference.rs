//! Finite difference methods for numerical differentiation.
//!
//! This module provides functions for computing Jacobians using finite
//! difference approximations, both for a residual [`Problem`] and for any
//! vector-valued closure.

use crate::error::{ProfileFitError, Result};
use crate::problem::Problem;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Relative step for forward differences (≈ sqrt of machine epsilon).
const FORWARD_EPSILON: f64 = 1.49e-8;

/// Relative step for central differences (≈ cube root of machine epsilon).
const CENTRAL_EPSILON: f64 = 6.06e-6;

/// Method for approximating the Jacobian matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffMethod {
    /// One extra evaluation per parameter, first-order accurate
    Forward,

    /// Two extra evaluations per parameter, second-order accurate
    #[default]
    Central,
}

impl DiffMethod {
    /// Number of function evaluations needed for one Jacobian of `n` parameters.
    pub fn evaluations(&self, n: usize) -> usize {
        match self {
            DiffMethod::Forward => n + 1,
            DiffMethod::Central => 2 * n,
        }
    }
}

/// Step size for a parameter of the given magnitude.
fn step_for(value: f64, method: DiffMethod) -> f64 {
    let eps = match method {
        DiffMethod::Forward => FORWARD_EPSILON,
        DiffMethod::Central => CENTRAL_EPSILON,
    };
    eps * value.abs().max(1.0)
}

/// Compute the Jacobian matrix of the residuals of `problem`.
///
/// The Jacobian is the matrix of partial derivatives of the residuals with
/// respect to the parameters: J[i,j] = ∂residual[i]/∂param[j].
///
/// # Arguments
///
/// * `problem` - The problem to evaluate
/// * `params` - The parameter values at which to evaluate the Jacobian
/// * `method` - Forward or central differences
pub fn jacobian<P: Problem + ?Sized>(
    problem: &P,
    params: &Array1<f64>,
    method: DiffMethod,
) -> Result<Array2<f64>> {
    let n_residuals = problem.residual_count();
    let jac = jacobian_of(|p| problem.eval(p), params, method)?;

    if jac.nrows() != n_residuals {
        return Err(ProfileFitError::DimensionMismatch(format!(
            "Expected {} residuals, got {}",
            n_residuals,
            jac.nrows()
        )));
    }

    Ok(jac)
}

/// Compute the Jacobian of an arbitrary vector function `f` at `params`.
pub fn jacobian_of<F>(f: F, params: &Array1<f64>, method: DiffMethod) -> Result<Array2<f64>>
where
    F: Fn(&Array1<f64>) -> Result<Array1<f64>>,
{
    let n_params = params.len();
    let base = match method {
        DiffMethod::Forward => Some(f(params)?),
        DiffMethod::Central => None,
    };

    let mut jac: Option<Array2<f64>> = None;

    for j in 0..n_params {
        let h = step_for(params[j], method);

        let column = match (&base, method) {
            (Some(f0), DiffMethod::Forward) => {
                let mut forward = params.clone();
                forward[j] += h;
                (f(&forward)? - f0) / h
            }
            _ => {
                let mut forward = params.clone();
                let mut backward = params.clone();
                forward[j] += h;
                backward[j] -= h;
                (f(&forward)? - f(&backward)?) / (2.0 * h)
            }
        };

        let jac = jac.get_or_insert_with(|| Array2::zeros((column.len(), n_params)));
        if column.len() != jac.nrows() {
            return Err(ProfileFitError::DimensionMismatch(format!(
                "Function output changed length from {} to {}",
                jac.nrows(),
                column.len()
            )));
        }
        jac.column_mut(j).assign(&column);
    }

    match jac {
        Some(jac) => Ok(jac),
        None => {
            // no parameters: the Jacobian has zero columns
            let rows = match base {
                Some(f0) => f0.len(),
                None => f(params)?.len(),
            };
            Ok(Array2::zeros((rows, 0)))
        }
    }
}

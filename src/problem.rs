//! Problem definition trait.
//!
//! This module defines the `Problem` trait, which represents a nonlinear
//! least squares problem to be solved with the Levenberg-Marquardt algorithm.

use crate::error::Result;
use crate::utils::finite_difference::{self, DiffMethod};
use ndarray::{Array1, Array2};

/// A trait representing a nonlinear least squares problem.
///
/// The solver minimizes `sum(eval(p)²)` over the parameter vector `p`.
pub trait Problem {
    /// Evaluate the residuals at the given parameters.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameter values at which to evaluate the residuals
    ///
    /// # Returns
    ///
    /// * A vector of residuals, or an error if the evaluation fails
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Get the number of parameters in the problem.
    fn parameter_count(&self) -> usize;

    /// Get the number of residuals in the problem.
    fn residual_count(&self) -> usize;

    /// Evaluate the Jacobian matrix `J[i, j] = d residual_i / d param_j`.
    ///
    /// The default implementation uses finite differences.
    fn jacobian(&self, params: &Array1<f64>, method: DiffMethod) -> Result<Array2<f64>>
    where
        Self: Sized,
    {
        finite_difference::jacobian(self, params, method)
    }

    /// Evaluate the sum of squared residuals at the given parameters.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(residuals.iter().map(|r| r.powi(2)).sum())
    }
}

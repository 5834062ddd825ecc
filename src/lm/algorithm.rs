//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! This module contains the core implementation of the Levenberg-Marquardt
//! algorithm for nonlinear least-squares optimization. Each iteration solves
//! the Marquardt-scaled normal equations
//!
//! ```text
//! (JᵀJ + λ·diag(JᵀJ)) δ = −Jᵀr
//! ```
//!
//! with a Cholesky factorization and adapts λ depending on whether the trial
//! step reduced the cost. The scale `diag(JᵀJ)` never shrinks between
//! iterations.

use log::debug;
use nalgebra::{DMatrix, DVector};
use ndarray::Array1;
use std::fmt;

use crate::error::{ProfileFitError, Result};
use crate::problem::Problem;
use crate::utils::matrix_convert::{
    nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra,
};

use super::config::LmConfig;

/// Smallest diagonal scale used for the damping term.
const MIN_DIAGONAL: f64 = 1e-12;

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of accepted steps
    pub iterations: usize,

    /// Number of residual evaluations, including those for the Jacobian
    pub nfev: usize,

    /// Whether one of the convergence criteria was met
    pub success: bool,

    /// A message describing the result
    pub message: String,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.nfev)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// Status of the iteration.
enum IterationStatus {
    /// Continue iteration
    Continue,

    /// Converged successfully
    Converged(String),

    /// Failed to converge
    Failed(String),
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    /// Configuration options
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self {
            config: LmConfig::default(),
        }
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the tolerance for relative reduction of the cost.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    /// Set the tolerance for relative change in parameter values.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    /// Minimize the sum of squared residuals for the given problem.
    ///
    /// # Arguments
    ///
    /// * `problem` - The problem to solve
    /// * `initial_params` - Initial guess for the parameter values
    ///
    /// # Returns
    ///
    /// * `Result<LmResult>` - The result of the optimization. Running out of
    ///   iterations is reported through `success == false`, not as an error.
    ///
    /// # Errors
    ///
    /// * `DimensionMismatch` if `initial_params` has the wrong length
    /// * `FitConvergenceError` if the residuals are not finite at the start
    pub fn minimize<P: Problem>(&self, problem: &P, initial_params: Array1<f64>) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(ProfileFitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let mut params = initial_params;
        let mut residuals = problem.eval(&params)?;
        let mut cost: f64 = residuals.iter().map(|r| r.powi(2)).sum();
        let mut nfev = 1;

        if !cost.is_finite() {
            return Err(ProfileFitError::FitConvergenceError(
                "Residuals are not finite at the initial parameters".to_string(),
            ));
        }

        if n_params == 0 {
            return Ok(LmResult {
                params,
                residuals,
                cost,
                iterations: 0,
                nfev,
                success: true,
                message: "No varying parameters".to_string(),
            });
        }

        let mut lambda = self.config.initial_lambda;
        let mut iterations = 0;
        // Column scales only grow, as in MINPACK; a column that flattens near
        // a bound keeps the damping it had before.
        let mut scale: Vec<f64> = Vec::new();

        let status = loop {
            if iterations >= self.config.max_iterations {
                break IterationStatus::Failed(format!(
                    "Maximum iterations ({}) reached",
                    self.config.max_iterations
                ));
            }

            if cost == 0.0 {
                break IterationStatus::Converged("Residuals are exactly zero".to_string());
            }

            let jacobian = problem.jacobian(&params, self.config.diff_method)?;
            nfev += self.config.diff_method.evaluations(n_params);

            let j = ndarray_to_nalgebra(jacobian.view());
            let r = ndarray_vec_to_nalgebra(residuals.view());
            let jtj = j.transpose() * &j;
            let g = j.transpose() * &r;

            let gnorm = scaled_gradient_norm(&jtj, &g, cost);
            if gnorm <= self.config.gtol {
                break IterationStatus::Converged(format!(
                    "Gradient convergence: |g| = {:.2e} <= {:.2e}",
                    gnorm, self.config.gtol
                ));
            }

            if scale.is_empty() {
                scale = jtj.diagonal().iter().map(|d| d.max(MIN_DIAGONAL)).collect();
            } else {
                for (s, d) in scale.iter_mut().zip(jtj.diagonal().iter()) {
                    *s = s.max(*d);
                }
            }
            let pnorm = params.iter().map(|p| p * p).sum::<f64>().sqrt();

            // Inner loop: raise lambda until a step lowers the cost
            let step_status = loop {
                let step = match self.calculate_step(&jtj, &g, &scale, lambda) {
                    Some(step) => step,
                    None => {
                        lambda *= self.config.lambda_up_factor;
                        if lambda > self.config.max_lambda {
                            break IterationStatus::Failed(
                                "Failed to calculate step, and lambda reached maximum".to_string(),
                            );
                        }
                        continue;
                    }
                };

                let step_norm = step.norm();
                let small_step = step_norm <= self.config.xtol * (pnorm + self.config.xtol);

                let trial = &params + &nalgebra_vec_to_ndarray(&step);
                let trial_residuals = problem.eval(&trial)?;
                nfev += 1;
                let trial_cost: f64 = trial_residuals.iter().map(|r| r.powi(2)).sum();

                if trial_cost.is_finite() && trial_cost < cost {
                    // Step accepted
                    let actual = (cost - trial_cost) / cost;
                    let predicted = predicted_reduction(&jtj, &g, &step) / cost;

                    params = trial;
                    residuals = trial_residuals;
                    cost = trial_cost;
                    lambda = (lambda * self.config.lambda_down_factor).max(self.config.min_lambda);
                    iterations += 1;

                    debug!(
                        "lm iteration {}: cost = {:.6e}, lambda = {:.2e}, |step| = {:.2e}",
                        iterations, cost, lambda, step_norm
                    );

                    if actual <= self.config.ftol && predicted <= self.config.ftol {
                        break IterationStatus::Converged(format!(
                            "Cost convergence: |df|/f = {:.2e} <= {:.2e}",
                            actual, self.config.ftol
                        ));
                    }
                    if small_step {
                        break IterationStatus::Converged(format!(
                            "Parameter convergence: |dx| = {:.2e} <= xtol * |x|",
                            step_norm
                        ));
                    }
                    break IterationStatus::Continue;
                }

                // Step rejected. The cost test still applies: when neither the
                // actual nor the predicted change is significant the current
                // point is a minimum, typically with a parameter on its bound.
                if trial_cost.is_finite() {
                    let actual = (cost - trial_cost) / cost;
                    let predicted = predicted_reduction(&jtj, &g, &step) / cost;
                    if actual.abs() <= self.config.ftol && predicted <= self.config.ftol {
                        break IterationStatus::Converged(format!(
                            "Cost convergence: |df|/f = {:.2e} <= {:.2e}",
                            actual.abs(),
                            self.config.ftol
                        ));
                    }
                }
                if small_step {
                    break IterationStatus::Converged(format!(
                        "Parameter convergence: |dx| = {:.2e} <= xtol * |x|",
                        step_norm
                    ));
                }

                lambda *= self.config.lambda_up_factor;
                if lambda > self.config.max_lambda {
                    break IterationStatus::Failed(
                        "Failed to decrease cost, and lambda reached maximum".to_string(),
                    );
                }
            };

            match step_status {
                IterationStatus::Continue => (),
                done => break done,
            }
        };

        let (success, message) = match status {
            IterationStatus::Converged(message) => (true, message),
            IterationStatus::Failed(message) => (false, message),
            IterationStatus::Continue => (false, "Stopped".to_string()),
        };

        debug!(
            "lm finished after {} iterations ({} evaluations): {}",
            iterations, nfev, message
        );

        Ok(LmResult {
            params,
            residuals,
            cost,
            iterations,
            nfev,
            success,
            message,
        })
    }

    /// Calculate the Levenberg-Marquardt step.
    ///
    /// Solves `(JᵀJ + λ·D) δ = −Jᵀr` where `D` is the running maximum of the
    /// floored diagonal of `JᵀJ`. Returns `None` if the damped matrix is not
    /// positive definite.
    fn calculate_step(
        &self,
        jtj: &DMatrix<f64>,
        g: &DVector<f64>,
        diag: &[f64],
        lambda: f64,
    ) -> Option<DVector<f64>> {
        let mut a = jtj.clone();
        for (i, d) in diag.iter().enumerate() {
            a[(i, i)] += lambda * d;
        }

        let cholesky = a.cholesky()?;
        let step = cholesky.solve(&(-g));
        step.iter().all(|s| s.is_finite()).then_some(step)
    }
}

/// MINPACK's scaled gradient: max |(Jᵀr)_j| / (|J_j| · |r|).
fn scaled_gradient_norm(jtj: &DMatrix<f64>, g: &DVector<f64>, cost: f64) -> f64 {
    let rnorm = cost.sqrt();
    g.iter()
        .enumerate()
        .filter_map(|(j, gj)| {
            let column_norm = jtj[(j, j)].sqrt();
            (column_norm > 0.0).then(|| gj.abs() / (column_norm * rnorm))
        })
        .fold(0.0, f64::max)
}

/// Reduction of the cost predicted by the linearized model for `step`.
fn predicted_reduction(jtj: &DMatrix<f64>, g: &DVector<f64>, step: &DVector<f64>) -> f64 {
    let quadratic = (jtj * step).dot(step);
    -(2.0 * g.dot(step) + quadratic)
}

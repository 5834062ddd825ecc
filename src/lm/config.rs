//! Configuration options for the Levenberg-Marquardt algorithm.
//!
//! This module defines the stopping criteria and damping schedule of the
//! solver. The defaults follow MINPACK's `lmdif` as used by lmfit.

use serde::{Deserialize, Serialize};

pub use crate::utils::finite_difference::DiffMethod;

/// Configuration options for the Levenberg-Marquardt algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmConfig {
    /// Maximum number of iterations. Default: 1000
    pub max_iterations: usize,

    /// Tolerance for relative reduction of the cost. Default: 1.5e-8
    pub ftol: f64,

    /// Tolerance for relative change in parameter values. Default: 1.5e-8
    pub xtol: f64,

    /// Tolerance for the scaled gradient. Default: 1e-10
    pub gtol: f64,

    /// Initial value for the damping parameter. Default: 1e-3
    pub initial_lambda: f64,

    /// Factor by which to increase lambda. Default: 10.0
    pub lambda_up_factor: f64,

    /// Factor by which to decrease lambda. Default: 0.1
    pub lambda_down_factor: f64,

    /// Minimum value for lambda. Default: 1e-12
    pub min_lambda: f64,

    /// Maximum value for lambda. Default: 1e10
    pub max_lambda: f64,

    /// Finite-difference scheme for the Jacobian. Default: Central
    pub diff_method: DiffMethod,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            ftol: 1.5e-8,
            xtol: 1.5e-8,
            gtol: 1e-10,
            initial_lambda: 1e-3,
            lambda_up_factor: 10.0,
            lambda_down_factor: 0.1,
            min_lambda: 1e-12,
            max_lambda: 1e10,
            diff_method: DiffMethod::default(),
        }
    }
}

impl LmConfig {
    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the tolerance for relative reduction of the cost.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.ftol = ftol;
        self
    }

    /// Set the tolerance for relative change in parameter values.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.xtol = xtol;
        self
    }

    /// Set the tolerance for the scaled gradient.
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.gtol = gtol;
        self
    }

    /// Set the initial value for the damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.initial_lambda = lambda;
        self
    }

    /// Set the finite-difference scheme.
    pub fn with_diff_method(mut self, method: DiffMethod) -> Self {
        self.diff_method = method;
        self
    }
}

//! # Uncertainty Calculation
//!
//! This module provides functionality for calculating uncertainties in parameter
//! estimates from nonlinear least-squares optimization results. It includes:
//!
//! - Covariance matrix estimation from the model Jacobian
//! - Standard error calculation for parameter estimates
//! - Fit statistics (reduced chi-square, AIC, BIC)
//! - Propagation of the covariance to the fitted curve, giving the
//!   `k`-sigma uncertainty band around the best fit
//!
//! The implementation approach is similar to that of lmfit-py.

pub mod covariance;

use crate::error::Result;
use crate::model::Model;
use crate::parameters::Parameters;
use crate::utils::finite_difference::{jacobian_of, DiffMethod};
use ndarray::{Array1, Array2};

pub use covariance::{
    calculate_correlation, calculate_covariance, standard_errors_from_covariance,
};

/// Relative step used when a parameter has no usable standard error.
const FALLBACK_REL_STEP: f64 = 1e-6;

/// Smallest relative step, below which differences drown in rounding.
const MIN_REL_STEP: f64 = 1e-9;

/// Calculator for parameter uncertainties and goodness-of-fit statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct UncertaintyCalculator {
    /// Number of data points
    pub ndata: usize,
    /// Number of varying parameters
    pub nvarys: usize,
    /// Degrees of freedom (n_points - n_parameters)
    pub nfree: usize,
    /// Chi-square value at minimum
    pub chisqr: f64,
    /// Reduced chi-square (chi^2 / nfree)
    pub redchi: f64,
}

impl UncertaintyCalculator {
    /// Create a new UncertaintyCalculator.
    ///
    /// `redchi` divides by at least one degree of freedom so that a fit with
    /// as many parameters as points still reports a finite value.
    pub fn new(ndata: usize, nvarys: usize, chisqr: f64) -> Self {
        let nfree = ndata.saturating_sub(nvarys);
        let redchi = chisqr / nfree.max(1) as f64;

        Self {
            ndata,
            nvarys,
            nfree,
            chisqr,
            redchi,
        }
    }

    /// Akaike information criterion: `n ln(chisqr/n) + 2 nvarys`.
    pub fn aic(&self) -> f64 {
        self.neg2_log_likelihood() + 2.0 * self.nvarys as f64
    }

    /// Bayesian information criterion: `n ln(chisqr/n) + ln(n) nvarys`.
    pub fn bic(&self) -> f64 {
        let n = self.ndata as f64;
        self.neg2_log_likelihood() + n.ln() * self.nvarys as f64
    }

    fn neg2_log_likelihood(&self) -> f64 {
        let n = self.ndata as f64;
        // guard against ln(0) for an exact fit
        n * (self.chisqr.max(f64::MIN_POSITIVE) / n).ln()
    }

    /// Calculate the covariance matrix from the model Jacobian.
    pub fn calculate_covariance(&self, jacobian: &Array2<f64>) -> Result<Array2<f64>> {
        covariance::calculate_covariance(jacobian, self.redchi)
    }

    /// Write standard errors from `covar` onto the varying parameters.
    pub fn apply_standard_errors(&self, covar: &Array2<f64>, params: &mut Parameters) {
        let errors = standard_errors_from_covariance(covar);
        let names = params.varying_names();

        for (name, err) in names.iter().zip(errors.iter()) {
            if let Some(param) = params.get_mut(name) {
                param.set_stderr(Some(*err));
            }
        }
    }

    /// Calculate correlation matrix from covariance matrix.
    pub fn calculate_correlation(&self, covar: &Array2<f64>) -> Array2<f64> {
        covariance::calculate_correlation(covar)
    }
}

/// Copy of `params` with every bound removed, so finite-difference probes
/// can step across a bound the best fit sits on.
fn unbounded_copy(params: &Parameters) -> Result<Parameters> {
    let mut free = params.clone();
    for name in params.names() {
        free.require_mut(&name)?
            .set_bounds(f64::NEG_INFINITY, f64::INFINITY)?;
    }
    Ok(free)
}

/// Jacobian of the model values w.r.t. the external values of the varying
/// parameters, `J[k, i] = df(x_k)/dp_i`, by central differences.
pub fn model_jacobian<M: Model + ?Sized>(
    model: &M,
    params: &Parameters,
    x: &Array1<f64>,
) -> Result<Array2<f64>> {
    let probe = unbounded_copy(params)?;
    let values = Array1::from(params.varying_values());

    jacobian_of(
        |p| {
            let mut trial = probe.clone();
            trial.update_from_values(&p.to_vec())?;
            model.eval_with(&trial, x)
        },
        &values,
        DiffMethod::Central,
    )
}

/// Standard error of the model curve at each `x`.
///
/// Propagates the parameter covariance through the model:
/// `df2(x) = Σ_ij ∂f/∂p_i ∂f/∂p_j C_ij`, with each derivative taken by central
/// differences using a step of one third of the parameter's standard error.
/// The result is `sqrt(df2)`, which is never negative.
pub fn curve_stderr<M: Model + ?Sized>(
    model: &M,
    params: &Parameters,
    x: &Array1<f64>,
    covar: &Array2<f64>,
) -> Result<Array1<f64>> {
    let probe = unbounded_copy(params)?;
    let varying = params.varying();
    let nvarys = varying.len();

    let mut dfdp = Array2::<f64>::zeros((nvarys, x.len()));
    for (i, param) in varying.iter().enumerate() {
        let value = param.value();
        let step = match param.stderr() {
            Some(err) if err > 0.0 && err.is_finite() => {
                (err / 3.0).max(MIN_REL_STEP * value.abs().max(1.0))
            }
            _ => FALLBACK_REL_STEP * value.abs().max(1.0),
        };

        let mut trial = probe.clone();
        let target = trial.require_mut(param.name())?;
        target.set_value(value + step)?;
        let forward = model.eval_with(&trial, x)?;

        trial.require_mut(param.name())?.set_value(value - step)?;
        let backward = model.eval_with(&trial, x)?;

        dfdp.row_mut(i).assign(&((forward - backward) / (2.0 * step)));
    }

    let mut df2 = Array1::<f64>::zeros(x.len());
    for i in 0..nvarys {
        for j in 0..nvarys {
            df2.scaled_add(covar[[i, j]], &(&dfdp.row(i) * &dfdp.row(j)));
        }
    }

    Ok(df2.mapv(|v| v.max(0.0).sqrt()))
}

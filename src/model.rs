//! Model trait and model fitting.
//!
//! This module defines the Model trait, which provides a common interface for
//! fitting models to data, the adapter that turns a model into a least-squares
//! [`Problem`], and [`fit`], which runs the Levenberg-Marquardt solver and
//! collects the fitted parameters, statistics and uncertainties in a
//! [`ModelFit`].

use crate::error::{ProfileFitError, Result};
use crate::lm::{LevenbergMarquardt, LmConfig};
use crate::parameters::Parameters;
use crate::problem::Problem;
use crate::uncertainty::{self, UncertaintyCalculator};
use log::{info, warn};
use ndarray::{Array1, Array2};
use serde::Serialize;
use std::fmt;

/// A trait representing a model that can be fit to data.
///
/// A model owns a [`Parameters`] collection whose names carry the model's
/// prefix (for example `g1_center`). Evaluation is a pure function of a
/// parameter collection, so composite models can share one collection
/// between their components.
pub trait Model: Send + Sync {
    /// Prefix prepended to every parameter name of this model.
    fn prefix(&self) -> &str;

    /// Returns a reference to the model's parameters.
    fn parameters(&self) -> &Parameters;

    /// Returns a mutable reference to the model's parameters.
    fn parameters_mut(&mut self) -> &mut Parameters;

    /// Evaluates the model at `x` using the values in `params`.
    ///
    /// `params` may hold more parameters than the model uses; only the names
    /// belonging to this model are read.
    fn eval_with(&self, params: &Parameters, x: &Array1<f64>) -> Result<Array1<f64>>;

    /// Evaluates the model at the given x values using the current parameter values.
    fn eval(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        self.eval_with(self.parameters(), x)
    }

    /// Calculates the residuals (y_obs - y_pred) using the current parameter values.
    fn residuals(&self, x: &Array1<f64>, y: &Array1<f64>) -> Result<Array1<f64>> {
        let y_pred = self.eval(x)?;

        if y.len() != y_pred.len() {
            return Err(ProfileFitError::DimensionMismatch(format!(
                "Expected {} observed values, got {}",
                y_pred.len(),
                y.len()
            )));
        }

        Ok(y - &y_pred)
    }

    /// Initialize the model's parameters from data.
    ///
    /// Only parameter values are changed; bounds and vary flags are kept.
    fn guess_parameters(&mut self, _x: &Array1<f64>, _y: &Array1<f64>) -> Result<()> {
        Ok(())
    }

    /// Returns the names of all parameters in the model.
    fn parameter_names(&self) -> Vec<String> {
        self.parameters().names()
    }

    /// Returns the names of varying parameters in the model.
    fn varying_parameter_names(&self) -> Vec<String> {
        self.parameters().varying_names()
    }

    /// Returns the number of varying parameters in the model.
    fn varying_parameter_count(&self) -> usize {
        self.parameters().varying().len()
    }
}

/// Full parameter name for `suffix` under the model's prefix.
pub(crate) fn prefixed(prefix: &str, suffix: &str) -> String {
    format!("{}{}", prefix, suffix)
}

/// Look up `prefix + suffix` in `params`.
pub(crate) fn prefixed_value(params: &Parameters, prefix: &str, suffix: &str) -> Result<f64> {
    Ok(params.value(&prefixed(prefix, suffix))?)
}

/// Seed a parameter with a guessed value, clamped into its bounds.
///
/// The guess becomes the parameter's initial value; bounds are kept.
pub(crate) fn set_guess(params: &mut Parameters, name: &str, value: f64) -> Result<()> {
    let param = params.require_mut(name)?;
    let (min, max) = (param.min(), param.max());
    param.set(value, min, max)?;
    Ok(())
}

/// An adapter that implements [`Problem`] for Model implementations.
///
/// The solver works on the internal (bounds-transformed) values of the
/// varying parameters; the adapter maps them back to external values before
/// evaluating the model, so every evaluation respects the bounds.
pub struct ModelProblem<'a, M: Model + ?Sized> {
    /// The model being adapted
    model: &'a M,
    /// Parameter template; varying values are overwritten per evaluation
    params: Parameters,
    /// The x data for the fit
    x_data: Array1<f64>,
    /// The y data for the fit
    y_data: Array1<f64>,
}

impl<'a, M: Model + ?Sized> ModelProblem<'a, M> {
    /// Create a new ModelProblem adapter for a Model implementation.
    pub fn new(model: &'a M, params: Parameters, x_data: Array1<f64>, y_data: Array1<f64>) -> Self {
        Self {
            model,
            params,
            x_data,
            y_data,
        }
    }

    /// Parameters with the varying values replaced by the given internal values.
    pub fn parameters_at(&self, internal: &Array1<f64>) -> Result<Parameters> {
        let mut params = self.params.clone();
        params.update_from_internal(&internal.to_vec())?;
        Ok(params)
    }

    /// Get the number of data points
    pub fn ndata(&self) -> usize {
        self.x_data.len()
    }

    /// Get the number of varying parameters
    pub fn nvarys(&self) -> usize {
        self.params.varying().len()
    }
}

impl<'a, M: Model + ?Sized> Problem for ModelProblem<'a, M> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let params = self.parameters_at(params)?;
        let y_pred = self.model.eval_with(&params, &self.x_data)?;
        Ok(&self.y_data - &y_pred)
    }

    fn parameter_count(&self) -> usize {
        self.nvarys()
    }

    fn residual_count(&self) -> usize {
        self.ndata()
    }
}

/// Result of fitting a model to data.
///
/// Mirrors lmfit's `ModelResult`: the fitted parameters carry their standard
/// errors, and the curve standard error is kept so uncertainty bands of any
/// width can be produced after the fit.
#[derive(Debug, Clone)]
pub struct ModelFit {
    /// Best-fit parameters, with standard errors when the covariance exists
    pub params: Parameters,
    /// Parameters the fit started from
    pub init_params: Parameters,
    /// Independent variable
    pub x: Array1<f64>,
    /// Observed data
    pub data: Array1<f64>,
    /// Model evaluated at the initial parameters
    pub init_fit: Array1<f64>,
    /// Model evaluated at the best-fit parameters
    pub best_fit: Array1<f64>,
    /// data - best_fit
    pub residuals: Array1<f64>,
    /// Names of the varying parameters, in covariance order
    pub var_names: Vec<String>,
    /// Covariance of the varying parameters (None if it could not be estimated)
    pub covariance: Option<Array2<f64>>,
    /// Correlation of the varying parameters
    pub correlation: Option<Array2<f64>>,
    /// Standard error of the best-fit curve at each x
    pub curve_stderr: Option<Array1<f64>>,
    /// Sum of squared residuals
    pub chisqr: f64,
    /// chisqr / nfree
    pub redchi: f64,
    /// Akaike information criterion
    pub aic: f64,
    /// Bayesian information criterion
    pub bic: f64,
    /// Number of data points
    pub ndata: usize,
    /// Number of varying parameters
    pub nvarys: usize,
    /// Degrees of freedom
    pub nfree: usize,
    /// Number of residual evaluations
    pub nfev: usize,
    /// Number of accepted solver steps
    pub iterations: usize,
    /// Whether the solver converged
    pub success: bool,
    /// Solver message
    pub message: String,
}

impl ModelFit {
    /// Uncertainty of the best-fit curve at `sigma` standard errors.
    ///
    /// Returns `sigma * stderr(x)`. When the covariance could not be
    /// estimated the band has zero width.
    pub fn eval_uncertainty(&self, sigma: f64) -> Array1<f64> {
        match &self.curve_stderr {
            Some(stderr) => stderr * sigma.abs(),
            None => Array1::zeros(self.best_fit.len()),
        }
    }

    /// Lower and upper edges of the `sigma` band around the best fit.
    pub fn confidence_band(&self, sigma: f64) -> (Array1<f64>, Array1<f64>) {
        let dely = self.eval_uncertainty(sigma);
        (&self.best_fit - &dely, &self.best_fit + &dely)
    }

    /// Serializable summary of the fit.
    pub fn summary(&self) -> FitSummary {
        FitSummary {
            params: self.params.clone(),
            var_names: self.var_names.clone(),
            chisqr: self.chisqr,
            redchi: self.redchi,
            aic: self.aic,
            bic: self.bic,
            ndata: self.ndata,
            nvarys: self.nvarys,
            nfree: self.nfree,
            nfev: self.nfev,
            success: self.success,
            message: self.message.clone(),
        }
    }

    /// Text report of the fit, in the layout of lmfit's `fit_report`.
    pub fn fit_report(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ModelFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[[Fit Statistics]]")?;
        writeln!(f, "    # function evals   = {}", self.nfev)?;
        writeln!(f, "    # data points      = {}", self.ndata)?;
        writeln!(f, "    # variables        = {}", self.nvarys)?;
        writeln!(f, "    chi-square         = {:.6e}", self.chisqr)?;
        writeln!(f, "    reduced chi-square = {:.6e}", self.redchi)?;
        writeln!(f, "    Akaike info crit   = {:.4}", self.aic)?;
        writeln!(f, "    Bayesian info crit = {:.4}", self.bic)?;
        writeln!(f, "    success            = {}", self.success)?;
        writeln!(f, "    message            = {}", self.message)?;
        writeln!(f, "[[Variables]]")?;
        for param in self.params.iter() {
            write!(f, "    {:<14} {:>14.7}", format!("{}:", param.name()), param.value())?;
            match param.stderr() {
                Some(err) if param.value() != 0.0 => write!(
                    f,
                    " +/- {:.7} ({:.2}%)",
                    err,
                    (err / param.value()).abs() * 100.0
                )?,
                Some(err) => write!(f, " +/- {:.7}", err)?,
                None if !param.vary() => write!(f, " (fixed)")?,
                None => write!(f, " (stderr unavailable)")?,
            }
            writeln!(f, " (init = {})", param.init_value())?;
        }
        if let Some(correl) = &self.correlation {
            writeln!(f, "[[Correlations]] (unreported correlations are < 0.100)")?;
            let mut pairs = Vec::new();
            for i in 0..self.var_names.len() {
                for j in (i + 1)..self.var_names.len() {
                    if correl[[i, j]].abs() >= 0.1 {
                        pairs.push((i, j, correl[[i, j]]));
                    }
                }
            }
            pairs.sort_by(|a, b| b.2.abs().total_cmp(&a.2.abs()));
            for (i, j, c) in pairs {
                writeln!(
                    f,
                    "    C({}, {}) = {:+.4}",
                    self.var_names[i], self.var_names[j], c
                )?;
            }
        }
        Ok(())
    }
}

/// JSON-friendly summary of a [`ModelFit`].
#[derive(Debug, Clone, Serialize)]
pub struct FitSummary {
    /// Best-fit parameters with bounds and standard errors
    pub params: Parameters,
    /// Names of the varying parameters
    pub var_names: Vec<String>,
    pub chisqr: f64,
    pub redchi: f64,
    pub aic: f64,
    pub bic: f64,
    pub ndata: usize,
    pub nvarys: usize,
    pub nfree: usize,
    pub nfev: usize,
    pub success: bool,
    pub message: String,
}

/// Helper function to fit a model to data with the default solver settings.
///
/// See [`fit_with_config`].
pub fn fit<M: Model + ?Sized>(
    model: &mut M,
    x_data: Array1<f64>,
    y_data: Array1<f64>,
) -> Result<ModelFit> {
    fit_with_config(model, x_data, y_data, &LmConfig::default())
}

/// Fit a model to data.
///
/// The fit starts from the model's current parameters. On return the model
/// holds the best-fit values (with standard errors), like an lmfit model
/// after `fit`. A solver that stops without converging is reported through
/// `ModelFit::success`; only evaluation and shape problems are errors.
///
/// # Arguments
///
/// * `model` - The model to fit
/// * `x_data` - The independent variable values
/// * `y_data` - The observed dependent variable values
/// * `config` - Solver configuration
pub fn fit_with_config<M: Model + ?Sized>(
    model: &mut M,
    x_data: Array1<f64>,
    y_data: Array1<f64>,
    config: &LmConfig,
) -> Result<ModelFit> {
    if x_data.len() != y_data.len() {
        return Err(ProfileFitError::DimensionMismatch(format!(
            "Expected x and y data to have the same length, got {} and {}",
            x_data.len(),
            y_data.len()
        )));
    }
    if x_data.is_empty() {
        return Err(ProfileFitError::InvalidInput(
            "Cannot fit a model to empty data".to_string(),
        ));
    }

    let init_params = model.parameters().clone();
    let init_fit = model.eval_with(&init_params, &x_data)?;
    let var_names = init_params.varying_names();

    let result = {
        let problem = ModelProblem::new(&*model, init_params.clone(), x_data.clone(), y_data.clone());
        let initial = Array1::from(init_params.varying_internal_values()?);
        LevenbergMarquardt::with_config(config.clone()).minimize(&problem, initial)?
    };

    let mut params = init_params.clone();
    params.update_from_internal(&result.params.to_vec())?;

    let best_fit = model.eval_with(&params, &x_data)?;
    let residuals = &y_data - &best_fit;
    let chisqr: f64 = residuals.iter().map(|r| r * r).sum();

    let ndata = x_data.len();
    let nvarys = var_names.len();
    let calc = UncertaintyCalculator::new(ndata, nvarys, chisqr);

    let covariance = if nvarys > 0 {
        let jacobian = uncertainty::model_jacobian(&*model, &params, &x_data)?;
        match calc.calculate_covariance(&jacobian) {
            Ok(covar) => Some(covar),
            Err(ProfileFitError::SingularMatrix) => {
                warn!("Could not estimate the covariance matrix: J^T J is singular");
                None
            }
            Err(e) => return Err(e),
        }
    } else {
        None
    };

    let (correlation, curve_stderr) = match &covariance {
        Some(covar) => {
            calc.apply_standard_errors(covar, &mut params);
            let stderr = uncertainty::curve_stderr(&*model, &params, &x_data, covar)?;
            (Some(calc.calculate_correlation(covar)), Some(stderr))
        }
        None => (None, None),
    };

    *model.parameters_mut() = params.clone();

    info!(
        "fit finished: success = {}, chisqr = {:.6e}, nfev = {}",
        result.success, chisqr, result.nfev
    );

    Ok(ModelFit {
        params,
        init_params,
        x: x_data,
        data: y_data,
        init_fit,
        best_fit,
        residuals,
        var_names,
        covariance,
        correlation,
        curve_stderr,
        chisqr,
        redchi: calc.redchi,
        aic: calc.aic(),
        bic: calc.bic(),
        ndata,
        nvarys,
        nfree: calc.nfree,
        nfev: result.nfev,
        iterations: result.iterations,
        success: result.success,
        message: result.message,
    })
}

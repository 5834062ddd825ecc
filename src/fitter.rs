//! The profile fitting pipeline.
//!
//! [`ProfileFitter`] reduces a 2D matrix to a 1D profile, fits it with a
//! Gaussian peak (prefix `g1_`) on an exponential baseline (prefix `exp_`),
//! and returns the fitted parameters with the best-fit curve, residuals and
//! uncertainty band in a [`ProfileFit`].
//!
//! ```rust
//! use ndarray::Array2;
//! use profilefit_rs::fitter::ProfileFitter;
//!
//! let matrix = Array2::from_shape_fn((4, 50), |(_, c)| {
//!     let x = c as f64;
//!     let peak = 200.0 / (3.0 * (2.0 * std::f64::consts::PI).sqrt())
//!         * (-(x - 25.0).powi(2) / 18.0).exp();
//!     (peak + 100.0 * (-x / 10.0).exp()) / 4.0
//! });
//!
//! let fit = ProfileFitter::new().fit(matrix.view()).unwrap();
//! let values = fit.fitted().unwrap();
//! assert!((values.g1_center - 25.0).abs() < 1e-3);
//! ```

use crate::error::{ProfileFitError, Result};
use crate::lm::LmConfig;
use crate::model::{fit_with_config, FitSummary, Model, ModelFit};
use crate::models::{add, CompositeModel, ExponentialModel, GaussianModel};
use crate::parameters::{Parameter, Parameters};
use crate::profile::{Profile, ProjectionAxis};
use crate::report::FitReporter;
use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::path::Path;

/// Parameter prefix of the Gaussian peak.
pub const GAUSSIAN_PREFIX: &str = "g1_";

/// Parameter prefix of the exponential baseline.
pub const EXPONENTIAL_PREFIX: &str = "exp_";

/// Initial value and bounds for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamBounds {
    /// Initial value; clamped into `[min, max]`
    pub value: f64,
    /// Lower bound
    pub min: f64,
    /// Upper bound, unbounded when `None`
    #[serde(default)]
    pub max: Option<f64>,
}

impl ParamBounds {
    /// Create a bounds record.
    pub fn new(value: f64, min: f64, max: Option<f64>) -> Self {
        Self { value, min, max }
    }

    /// Default for the Gaussian center: 25 in [20, 30].
    pub fn center_default() -> Self {
        Self::new(25.0, 20.0, Some(30.0))
    }

    /// Default for the Gaussian sigma: 3 in [2, ∞).
    pub fn sigma_default() -> Self {
        Self::new(3.0, 2.0, None)
    }

    /// Upper bound with `None` mapped to +∞.
    pub fn upper(&self) -> f64 {
        self.max.unwrap_or(f64::INFINITY)
    }

    /// Seed `param` with this record.
    fn apply(&self, param: &mut Parameter) -> Result<()> {
        param.set(self.value, self.min, self.upper())?;
        Ok(())
    }
}

/// Where the Gaussian sigma takes its initial value and lower bound from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigmaSeed {
    /// value, min and max from the sigma bounds
    #[default]
    FromSigmaBounds,
    /// value and min from the center bounds, no upper bound.
    ///
    /// Reproduces fits made with the historical seeding, where sigma started
    /// at the center value.
    FromCenterBounds,
}

/// Configuration of a [`ProfileFitter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitterConfig {
    /// Initial value and bounds of `g1_center`
    pub center: ParamBounds,
    /// Initial value and bounds of `g1_sigma`
    pub sigma: ParamBounds,
    /// Initial `g1_amplitude`, positive; estimated from the data when `None`
    pub amplitude: Option<f64>,
    /// Seeding rule for `g1_sigma`
    pub sigma_seed: SigmaSeed,
    /// Axis summed away by the reduction
    pub axis: ProjectionAxis,
    /// Width of the uncertainty band in standard errors
    pub band_sigma: f64,
    /// Solver settings
    pub lm: LmConfig,
}

impl Default for FitterConfig {
    fn default() -> Self {
        Self {
            center: ParamBounds::center_default(),
            sigma: ParamBounds::sigma_default(),
            amplitude: None,
            sigma_seed: SigmaSeed::default(),
            axis: ProjectionAxis::default(),
            band_sigma: 3.0,
            lm: LmConfig::default(),
        }
    }
}

impl FitterConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serialize the configuration to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check values that would only fail later, inside the fit.
    pub fn validate(&self) -> Result<()> {
        if !self.band_sigma.is_finite() || self.band_sigma < 0.0 {
            return Err(ProfileFitError::InvalidInput(format!(
                "band_sigma must be a finite, non-negative number, got {}",
                self.band_sigma
            )));
        }
        if let Some(amplitude) = self.amplitude {
            // zero is the amplitude's lower bound, where the solver cannot move it
            if !amplitude.is_finite() || amplitude <= 0.0 {
                return Err(ProfileFitError::InvalidInput(format!(
                    "amplitude seed must be a finite, positive number, got {}",
                    amplitude
                )));
            }
        }
        for (name, bounds) in [("center", &self.center), ("sigma", &self.sigma)] {
            if bounds.min.is_nan() || bounds.value.is_nan() || bounds.min > bounds.upper() {
                return Err(ProfileFitError::BoundsError(format!(
                    "{} bounds are invalid: value {}, min {}, max {}",
                    name,
                    bounds.value,
                    bounds.min,
                    bounds.upper()
                )));
            }
        }
        if self.lm.max_iterations == 0 {
            return Err(ProfileFitError::InvalidInput(
                "lm.max_iterations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fits Gaussian + exponential profiles to sum-projected matrices.
///
/// The fitter only holds configuration, so one instance can be shared across
/// threads and reused for any number of inputs.
#[derive(Debug, Clone, Default)]
pub struct ProfileFitter {
    config: FitterConfig,
}

impl ProfileFitter {
    /// Create a fitter with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fitter with the given configuration.
    pub fn with_config(config: FitterConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &FitterConfig {
        &self.config
    }

    /// Set the initial value and bounds of the Gaussian center.
    pub fn with_center_bounds(mut self, center: ParamBounds) -> Self {
        self.config.center = center;
        self
    }

    /// Set the initial value and bounds of the Gaussian sigma.
    pub fn with_sigma_bounds(mut self, sigma: ParamBounds) -> Self {
        self.config.sigma = sigma;
        self
    }

    /// Set the initial Gaussian amplitude instead of estimating it.
    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.config.amplitude = Some(amplitude);
        self
    }

    /// Set the seeding rule for the Gaussian sigma.
    pub fn with_sigma_seed(mut self, seed: SigmaSeed) -> Self {
        self.config.sigma_seed = seed;
        self
    }

    /// Set the axis summed away by the reduction.
    pub fn with_axis(mut self, axis: ProjectionAxis) -> Self {
        self.config.axis = axis;
        self
    }

    /// Set the width of the uncertainty band in standard errors.
    pub fn with_band_sigma(mut self, band_sigma: f64) -> Self {
        self.config.band_sigma = band_sigma;
        self
    }

    /// Set the solver configuration.
    pub fn with_lm_config(mut self, lm: LmConfig) -> Self {
        self.config.lm = lm;
        self
    }

    /// Build the composite model with its initial parameters for `profile`.
    pub fn build_model(&self, profile: &Profile) -> Result<CompositeModel> {
        let (x, y) = (profile.x(), profile.y());

        let mut exponential = ExponentialModel::new(EXPONENTIAL_PREFIX);
        exponential.guess_parameters(x, y)?;

        let mut gaussian = GaussianModel::new(GAUSSIAN_PREFIX);
        let center_name = format!("{}center", GAUSSIAN_PREFIX);
        let sigma_name = format!("{}sigma", GAUSSIAN_PREFIX);
        let amplitude_name = format!("{}amplitude", GAUSSIAN_PREFIX);

        let params = gaussian.parameters_mut();
        self.config.center.apply(params.require_mut(&center_name)?)?;
        let sigma_seed = match self.config.sigma_seed {
            SigmaSeed::FromSigmaBounds => self.config.sigma,
            SigmaSeed::FromCenterBounds => {
                ParamBounds::new(self.config.center.value, self.config.center.min, None)
            }
        };
        sigma_seed.apply(params.require_mut(&sigma_name)?)?;

        let sigma = params.value(&sigma_name)?;
        let amplitude = match self.config.amplitude {
            Some(amplitude) => amplitude,
            None => estimate_amplitude(&exponential, x, y, sigma)?,
        };
        let amplitude_param = params.require_mut(&amplitude_name)?;
        amplitude_param.set(amplitude, amplitude_param.min(), amplitude_param.max())?;

        add(gaussian, exponential)
    }

    /// Reduce `matrix` and fit the profile.
    ///
    /// # Errors
    ///
    /// * `ShapeError` if the matrix has no rows or no columns
    /// * `InvalidInput` if the profile contains NaN or infinite values
    /// * `FitConvergenceError` if the solver does not converge or returns
    ///   non-finite parameters
    pub fn fit(&self, matrix: ArrayView2<'_, f64>) -> Result<ProfileFit> {
        self.config.validate()?;

        let profile = Profile::reduce(matrix, self.config.axis)?;
        if let Some(i) = profile.y().iter().position(|v| !v.is_finite()) {
            return Err(ProfileFitError::InvalidInput(format!(
                "profile value at {} is not finite",
                i
            )));
        }
        let mut model = self.build_model(&profile)?;
        debug!(
            "fitting profile of {} samples from {:?}",
            profile.len(),
            model.parameters().iter().map(|p| (p.name(), p.value())).collect::<Vec<_>>()
        );

        let fit = fit_with_config(
            &mut model,
            profile.x().clone(),
            profile.y().clone(),
            &self.config.lm,
        )?;

        if !fit.success {
            return Err(ProfileFitError::FitConvergenceError(fit.message));
        }
        if let Some(param) = fit.params.iter().find(|p| !p.value().is_finite()) {
            return Err(ProfileFitError::FitConvergenceError(format!(
                "{} is not finite after the fit",
                param.name()
            )));
        }

        info!(
            "profile fit converged in {} iterations: redchi = {:.6e}",
            fit.iterations, fit.redchi
        );
        debug!("{}", fit);

        Ok(ProfileFit {
            profile,
            fit,
            band_sigma: self.config.band_sigma,
            axis: self.config.axis,
        })
    }

    /// Fit `matrix` and hand the result to `reporter`.
    ///
    /// The reporter is not called when the fit fails.
    pub fn fit_and_report(
        &self,
        matrix: ArrayView2<'_, f64>,
        reporter: &mut dyn FitReporter,
    ) -> Result<ProfileFit> {
        let fit = self.fit(matrix)?;
        reporter.report(matrix, &fit)?;
        Ok(fit)
    }

    /// Fit independent matrices in parallel.
    ///
    /// Returns one result per input, in input order.
    pub fn fit_batch(&self, matrices: &[Array2<f64>]) -> Vec<Result<ProfileFit>> {
        matrices.par_iter().map(|m| self.fit(m.view())).collect()
    }
}

/// Seed for the Gaussian amplitude: the largest excess of the profile over
/// the exponential guess, converted to an area with the seeded sigma.
///
/// Falls back to 1.0 when the profile never rises above the baseline.
fn estimate_amplitude(
    exponential: &ExponentialModel,
    x: &Array1<f64>,
    y: &Array1<f64>,
    sigma: f64,
) -> Result<f64> {
    let baseline = exponential.eval(x)?;
    let excess = (y - &baseline).fold(f64::NEG_INFINITY, |a, &b| a.max(b));

    if excess.is_finite() && excess > 0.0 {
        Ok(excess * sigma * (2.0 * PI).sqrt())
    } else {
        Ok(1.0)
    }
}

/// Best-fit values of the five profile parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedParameters {
    pub g1_amplitude: f64,
    pub g1_center: f64,
    pub g1_sigma: f64,
    pub exp_amplitude: f64,
    pub exp_decay: f64,
}

impl FittedParameters {
    fn from_params(params: &Parameters) -> Result<Self> {
        let get = |suffix: &str, prefix: &str| params.value(&format!("{}{}", prefix, suffix));
        Ok(Self {
            g1_amplitude: get("amplitude", GAUSSIAN_PREFIX)?,
            g1_center: get("center", GAUSSIAN_PREFIX)?,
            g1_sigma: get("sigma", GAUSSIAN_PREFIX)?,
            exp_amplitude: get("amplitude", EXPONENTIAL_PREFIX)?,
            exp_decay: get("decay", EXPONENTIAL_PREFIX)?,
        })
    }
}

/// The outcome of [`ProfileFitter::fit`].
#[derive(Debug, Clone)]
pub struct ProfileFit {
    profile: Profile,
    fit: ModelFit,
    band_sigma: f64,
    axis: ProjectionAxis,
}

impl ProfileFit {
    /// The reduced profile that was fitted.
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// The full model fit with statistics and covariance.
    pub fn model_fit(&self) -> &ModelFit {
        &self.fit
    }

    /// Best-fit parameters with bounds and standard errors.
    pub fn params(&self) -> &Parameters {
        &self.fit.params
    }

    /// Best-fit values by name.
    pub fn fitted(&self) -> Result<FittedParameters> {
        FittedParameters::from_params(&self.fit.params)
    }

    /// Sample positions shared by the reduction, the fit and the figure.
    pub fn x(&self) -> &Array1<f64> {
        self.profile.x()
    }

    /// Model at the best-fit parameters.
    pub fn best_fit(&self) -> &Array1<f64> {
        &self.fit.best_fit
    }

    /// Model at the initial parameters.
    pub fn init_fit(&self) -> &Array1<f64> {
        &self.fit.init_fit
    }

    /// data - best fit.
    pub fn residuals(&self) -> &Array1<f64> {
        &self.fit.residuals
    }

    /// Width of the uncertainty band in standard errors.
    pub fn band_sigma(&self) -> f64 {
        self.band_sigma
    }

    /// The axis that was summed away.
    pub fn axis(&self) -> ProjectionAxis {
        self.axis
    }

    /// Half-width of the uncertainty band: `band_sigma * stderr(x)`.
    pub fn uncertainty(&self) -> Array1<f64> {
        self.fit.eval_uncertainty(self.band_sigma)
    }

    /// Lower and upper edges of the uncertainty band.
    pub fn band(&self) -> (Array1<f64>, Array1<f64>) {
        self.fit.confidence_band(self.band_sigma)
    }

    /// Full width at half maximum of the fitted peak.
    pub fn fwhm(&self) -> Result<f64> {
        GaussianModel::new(GAUSSIAN_PREFIX).fwhm(&self.fit.params)
    }

    /// Height of the fitted peak.
    pub fn height(&self) -> Result<f64> {
        GaussianModel::new(GAUSSIAN_PREFIX).height(&self.fit.params)
    }

    /// Serializable summary of the fit.
    pub fn summary(&self) -> FitSummary {
        self.fit.summary()
    }

    /// Text report of the fit.
    pub fn fit_report(&self) -> String {
        self.fit.fit_report()
    }
}

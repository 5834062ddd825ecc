//! Peak models for fitting.
//!
//! This module provides the Gaussian peak model in the lmfit convention,
//! where the amplitude is the area under the peak.

use crate::error::{ProfileFitError, Result};
use crate::model::{prefixed, prefixed_value, set_guess, Model};
use crate::parameters::Parameters;
use ndarray::Array1;
use std::f64::consts::PI;

/// FWHM / sigma for a Gaussian: 2 * sqrt(2 * ln 2).
pub const FWHM_FACTOR: f64 = 2.354_820_045_030_949_3;

/// Smallest sigma used in evaluation, to avoid dividing by zero.
const TINY: f64 = 1.0e-15;

/// Gaussian peak model
///
/// The Gaussian function is defined as:
///
/// f(x) = amplitude / (sigma * sqrt(2π)) * exp(-(x - center)² / (2 sigma²))
///
/// Where:
/// - amplitude: the area under the peak, bounded below by 0
/// - center: the position of the peak
/// - sigma: the standard deviation, bounded below by 0
///
/// The derived full width at half maximum and peak height are available from
/// [`GaussianModel::fwhm`] and [`GaussianModel::height`].
#[derive(Debug, Clone)]
pub struct GaussianModel {
    params: Parameters,
    prefix: String,
}

impl GaussianModel {
    /// Create a new Gaussian model.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Prefix for parameter names
    ///
    /// # Returns
    ///
    /// * A new GaussianModel with amplitude 1, center 0 and sigma 1, where
    ///   amplitude and sigma are bounded to `[0, ∞)`
    pub fn new(prefix: &str) -> Self {
        let mut params = Parameters::new();

        params
            .add_param_with_bounds(&prefixed(prefix, "amplitude"), 1.0, 0.0, f64::INFINITY)
            .unwrap();
        params.add_param(&prefixed(prefix, "center"), 0.0).unwrap();
        params
            .add_param_with_bounds(&prefixed(prefix, "sigma"), 1.0, 0.0, f64::INFINITY)
            .unwrap();

        Self {
            params,
            prefix: prefix.to_string(),
        }
    }

    /// Full width at half maximum for the sigma in `params`.
    pub fn fwhm(&self, params: &Parameters) -> Result<f64> {
        let sigma = prefixed_value(params, &self.prefix, "sigma")?;
        Ok(FWHM_FACTOR * sigma)
    }

    /// Peak height for the amplitude and sigma in `params`.
    pub fn height(&self, params: &Parameters) -> Result<f64> {
        let amplitude = prefixed_value(params, &self.prefix, "amplitude")?;
        let sigma = prefixed_value(params, &self.prefix, "sigma")?;
        Ok(amplitude / ((2.0 * PI).sqrt() * sigma.max(TINY)))
    }
}

impl Model for GaussianModel {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn parameters(&self) -> &Parameters {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }

    fn eval_with(&self, params: &Parameters, x: &Array1<f64>) -> Result<Array1<f64>> {
        let amplitude = prefixed_value(params, &self.prefix, "amplitude")?;
        let center = prefixed_value(params, &self.prefix, "center")?;
        let sigma = prefixed_value(params, &self.prefix, "sigma")?.max(TINY);

        let norm = amplitude / ((2.0 * PI).sqrt() * sigma);
        Ok(x.mapv(|x_val| {
            let arg = (x_val - center) / sigma;
            norm * (-0.5 * arg * arg).exp()
        }))
    }

    /// Estimate the peak from the maximum of `y` and its half-height width.
    fn guess_parameters(&mut self, x: &Array1<f64>, y: &Array1<f64>) -> Result<()> {
        if x.len() != y.len() || x.is_empty() {
            return Err(ProfileFitError::DimensionMismatch(
                "x and y must have the same non-zero length".to_string(),
            ));
        }

        let (max_idx, max_y) = y
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, v)| {
                if v > best.1 {
                    (i, v)
                } else {
                    best
                }
            });
        let min_y = y.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let height = max_y - min_y;
        let half_height = min_y + height / 2.0;

        // Walk out from the maximum to the half-height crossings
        let mut left_idx = max_idx;
        while left_idx > 0 && y[left_idx] > half_height {
            left_idx -= 1;
        }
        let mut right_idx = max_idx;
        while right_idx < y.len() - 1 && y[right_idx] > half_height {
            right_idx += 1;
        }

        let fwhm = if left_idx < right_idx {
            (x[right_idx] - x[left_idx]).abs()
        } else {
            let span = x.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b))
                - x.iter().fold(f64::INFINITY, |a, &b| a.min(b));
            span / 5.0
        };
        let sigma = if fwhm > 0.0 { fwhm / FWHM_FACTOR } else { 1.0 };

        let amplitude = height * sigma * (2.0 * PI).sqrt();

        let prefix = self.prefix.clone();
        set_guess(&mut self.params, &prefixed(&prefix, "amplitude"), amplitude)?;
        set_guess(&mut self.params, &prefixed(&prefix, "center"), x[max_idx])?;
        set_guess(&mut self.params, &prefixed(&prefix, "sigma"), sigma)?;

        Ok(())
    }
}

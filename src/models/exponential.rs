//! Exponential decay model.

use crate::error::{ProfileFitError, Result};
use crate::model::{prefixed, prefixed_value, set_guess, Model};
use crate::parameters::Parameters;
use log::warn;
use ndarray::Array1;

/// Offset added to |y| before taking the logarithm in the guess.
const LOG_FLOOR: f64 = 1e-15;

/// An exponential model for fitting exponential decay or growth
///
/// The exponential function is defined as:
///
/// f(x) = amplitude * exp(-x/decay)
///
/// Where:
/// - amplitude: the value at x = 0
/// - decay: the decay constant (positive for decay, negative for growth)
#[derive(Debug, Clone)]
pub struct ExponentialModel {
    params: Parameters,
    prefix: String,
}

impl ExponentialModel {
    /// Create a new exponential model with the specified parameter prefix.
    ///
    /// Both parameters start at 1.0 and are unbounded.
    pub fn new(prefix: &str) -> Self {
        let mut params = Parameters::new();
        params.add_param(&prefixed(prefix, "amplitude"), 1.0).unwrap();
        params.add_param(&prefixed(prefix, "decay"), 1.0).unwrap();

        Self {
            params,
            prefix: prefix.to_string(),
        }
    }
}

/// Straight-line fit of `ln(|y| + 1e-15)` against `x`.
///
/// Returns `(slope, intercept)`, or `None` when the line is undetermined
/// (fewer than two points or no spread in `x`).
fn log_linear_fit(x: &Array1<f64>, y: &Array1<f64>) -> Option<(f64, f64)> {
    let n = x.len() as f64;
    if x.len() < 2 {
        return None;
    }

    let ln_y = y.mapv(|v| (v.abs() + LOG_FLOOR).ln());
    let mean_x = x.sum() / n;
    let mean_y = ln_y.sum() / n;

    let sxx: f64 = x.iter().map(|&xi| (xi - mean_x).powi(2)).sum();
    let sxy: f64 = x
        .iter()
        .zip(ln_y.iter())
        .map(|(&xi, &yi)| (xi - mean_x) * (yi - mean_y))
        .sum();

    if sxx <= 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

impl Model for ExponentialModel {
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
        let decay = prefixed_value(params, &self.prefix, "decay")?;

        Ok(x.mapv(|x_val| amplitude * (-x_val / decay).exp()))
    }

    /// Log-linear estimate: `amplitude = exp(intercept)`, `decay = -1/slope`.
    ///
    /// When the slope is zero or the line cannot be fitted, the decay falls
    /// back to the span of `x` (or 1.0 for a single point).
    fn guess_parameters(&mut self, x: &Array1<f64>, y: &Array1<f64>) -> Result<()> {
        if x.len() != y.len() || x.is_empty() {
            return Err(ProfileFitError::DimensionMismatch(
                "x and y must have the same non-zero length".to_string(),
            ));
        }

        let (amplitude, decay) = match log_linear_fit(x, y) {
            Some((slope, intercept)) => (intercept.exp(), -1.0 / slope),
            None => {
                let max_abs = y.iter().fold(0.0f64, |a, &b| a.max(b.abs()));
                (max_abs + 1e-9, f64::NAN)
            }
        };

        let decay = if decay.is_finite() {
            decay
        } else {
            let span = x.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b))
                - x.iter().fold(f64::INFINITY, |a, &b| a.min(b));
            let fallback = if span > 0.0 { span } else { 1.0 };
            warn!(
                "{}decay guess is not finite; falling back to {}",
                self.prefix, fallback
            );
            fallback
        };

        let amplitude_name = prefixed(&self.prefix, "amplitude");
        let decay_name = prefixed(&self.prefix, "decay");
        set_guess(&mut self.params, &amplitude_name, amplitude)?;
        set_guess(&mut self.params, &decay_name, decay)?;

        Ok(())
    }
}

//! Parameter definition and implementation
//!
//! This module provides the Parameter struct, the named, optionally bounded
//! quantity a model is fitted over.

use crate::parameters::bounds::{Bounds, BoundsError, BoundsTransform};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when working with parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Bounds error: {0}")]
    BoundsError(#[from] BoundsError),

    #[error("Parameter '{name}' not found")]
    ParameterNotFound { name: String },

    #[error("Parameter '{name}' already exists")]
    DuplicateParameter { name: String },

    #[error("Expected {expected} values for varying parameters, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// A parameter for optimization problems
///
/// Parameters can be varied during optimization and can have bounds
/// constraints. After a fit the standard error is stored alongside the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Name of the parameter
    name: String,

    /// Current value of the parameter
    value: f64,

    /// Initial value when created (for reset operations)
    init_value: f64,

    /// Whether this parameter can be varied during optimization
    vary: bool,

    /// Minimum and maximum bounds for the parameter value
    bounds: Bounds,

    /// Standard error of the parameter (set after fitting)
    stderr: Option<f64>,
}

impl Parameter {
    /// Create a new unbounded, varying parameter.
    ///
    /// # Examples
    ///
    /// ```
    /// use profilefit_rs::parameters::Parameter;
    ///
    /// let param = Parameter::new("g1_amplitude", 10.0);
    /// assert_eq!(param.name(), "g1_amplitude");
    /// assert_eq!(param.value(), 10.0);
    /// assert!(param.vary());
    /// ```
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            init_value: value,
            vary: true,
            bounds: Bounds::default(),
            stderr: None,
        }
    }

    /// Create a new parameter with the given name, value, and bounds.
    ///
    /// The value is clamped into the bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use profilefit_rs::parameters::Parameter;
    ///
    /// let param = Parameter::with_bounds("g1_center", 25.0, 20.0, 30.0).unwrap();
    /// assert_eq!(param.min(), 20.0);
    /// assert_eq!(param.max(), 30.0);
    /// ```
    pub fn with_bounds(name: &str, value: f64, min: f64, max: f64) -> Result<Self, ParameterError> {
        let bounds = Bounds::new(min, max)?;
        let value = bounds.clamp(value);

        Ok(Self {
            name: name.to_string(),
            value,
            init_value: value,
            vary: true,
            bounds,
            stderr: None,
        })
    }

    /// Get the current value of the parameter
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Set the value of the parameter
    ///
    /// Returns an error if the value is outside bounds; the current value is
    /// left untouched in that case.
    pub fn set_value(&mut self, value: f64) -> Result<(), ParameterError> {
        if !self.bounds.is_within_bounds(value) {
            return Err(ParameterError::BoundsError(BoundsError::ValueOutsideBounds {
                value,
                min: self.bounds.min,
                max: self.bounds.max,
            }));
        }

        self.value = value;
        Ok(())
    }

    /// Set value and bounds together, the way a caller seeds a parameter
    /// from an initial-guess record. The value is clamped into the new bounds
    /// and becomes the parameter's initial value.
    pub fn set(&mut self, value: f64, min: f64, max: f64) -> Result<(), ParameterError> {
        let bounds = Bounds::new(min, max)?;
        self.bounds = bounds;
        self.value = bounds.clamp(value);
        self.init_value = self.value;
        Ok(())
    }

    /// Get the initial value of the parameter
    pub fn init_value(&self) -> f64 {
        self.init_value
    }

    /// Reset the parameter to its initial value
    pub fn reset(&mut self) {
        self.value = self.bounds.clamp(self.init_value);
        self.stderr = None;
    }

    /// Get the name of the parameter
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if the parameter is varied during optimization
    pub fn vary(&self) -> bool {
        self.vary
    }

    /// Set whether the parameter is varied during optimization
    pub fn set_vary(&mut self, vary: bool) {
        self.vary = vary;
    }

    /// Get the minimum allowed value for the parameter
    pub fn min(&self) -> f64 {
        self.bounds.min
    }

    /// Get the maximum allowed value for the parameter
    pub fn max(&self) -> f64 {
        self.bounds.max
    }

    /// Set the bounds for the parameter
    ///
    /// Returns an error if min > max. The current value is clamped into the
    /// new bounds.
    pub fn set_bounds(&mut self, min: f64, max: f64) -> Result<(), ParameterError> {
        let bounds = Bounds::new(min, max)?;
        self.bounds = bounds;
        self.value = bounds.clamp(self.value);
        Ok(())
    }

    /// Set the minimum bound for the parameter
    pub fn set_min(&mut self, min: f64) -> Result<(), ParameterError> {
        self.set_bounds(min, self.bounds.max)
    }

    /// Set the maximum bound for the parameter
    pub fn set_max(&mut self, max: f64) -> Result<(), ParameterError> {
        self.set_bounds(self.bounds.min, max)
    }

    /// Get the bounds of the parameter
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Get the standard error of the parameter (if available)
    pub fn stderr(&self) -> Option<f64> {
        self.stderr
    }

    /// Set the standard error of the parameter
    pub fn set_stderr(&mut self, stderr: Option<f64>) {
        self.stderr = stderr;
    }

    /// Create a bounds transform for this parameter
    pub fn bounds_transform(&self) -> BoundsTransform {
        BoundsTransform::new(self.bounds)
    }

    /// Convert the parameter value to an internal value for the optimizer
    pub fn to_internal(&self) -> Result<f64, ParameterError> {
        self.bounds_transform()
            .to_internal(self.value)
            .map_err(ParameterError::from)
    }

    /// Convert an internal value from the optimizer to a parameter value
    pub fn from_internal(&self, internal_value: f64) -> f64 {
        self.bounds_transform().to_external(internal_value)
    }
}

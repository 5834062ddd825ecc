//! Parameters collection implementation
//!
//! This module provides the Parameters struct, an insertion-ordered collection
//! of Parameter objects. The order is the order in which varying parameters
//! are handed to the solver and the order of the covariance matrix.

use crate::parameters::parameter::{Parameter, ParameterError};
use serde::{Deserialize, Serialize};

/// A collection of parameters for optimization problems
///
/// This struct is similar to the Parameters class in lmfit-py: parameters are
/// addressed by name and keep the order they were added in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters {
    params: Vec<Parameter>,
}

impl Parameters {
    /// Create a new empty parameters collection
    ///
    /// # Examples
    ///
    /// ```
    /// use profilefit_rs::parameters::Parameters;
    ///
    /// let params = Parameters::new();
    /// assert_eq!(params.len(), 0);
    /// ```
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter to the collection
    ///
    /// Returns an error if a parameter with the same name already exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use profilefit_rs::parameters::{Parameter, Parameters};
    ///
    /// let mut params = Parameters::new();
    /// params.add(Parameter::new("g1_amplitude", 10.0)).unwrap();
    /// assert!(params.add(Parameter::new("g1_amplitude", 1.0)).is_err());
    /// assert_eq!(params.len(), 1);
    /// ```
    pub fn add(&mut self, param: Parameter) -> Result<(), ParameterError> {
        if self.contains(param.name()) {
            return Err(ParameterError::DuplicateParameter {
                name: param.name().to_string(),
            });
        }

        self.params.push(param);
        Ok(())
    }

    /// Add a new unbounded parameter with the given name and value
    pub fn add_param(&mut self, name: &str, value: f64) -> Result<(), ParameterError> {
        self.add(Parameter::new(name, value))
    }

    /// Add a new parameter with the given name, value, and bounds
    pub fn add_param_with_bounds(
        &mut self,
        name: &str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Result<(), ParameterError> {
        self.add(Parameter::with_bounds(name, value, min, max)?)
    }

    /// Merge another collection into this one, keeping its order.
    ///
    /// Fails without modifying `self` if any name is already present.
    pub fn extend(&mut self, other: Parameters) -> Result<(), ParameterError> {
        if let Some(dup) = other.params.iter().find(|p| self.contains(p.name())) {
            return Err(ParameterError::DuplicateParameter {
                name: dup.name().to_string(),
            });
        }

        self.params.extend(other.params);
        Ok(())
    }

    /// Get a parameter by name
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name() == name)
    }

    /// Get a mutable reference to a parameter by name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.params.iter_mut().find(|p| p.name() == name)
    }

    /// Get a parameter by name, or a `ParameterNotFound` error
    pub fn require(&self, name: &str) -> Result<&Parameter, ParameterError> {
        self.get(name).ok_or_else(|| ParameterError::ParameterNotFound {
            name: name.to_string(),
        })
    }

    /// Get a mutable parameter by name, or a `ParameterNotFound` error
    pub fn require_mut(&mut self, name: &str) -> Result<&mut Parameter, ParameterError> {
        self.get_mut(name).ok_or_else(|| ParameterError::ParameterNotFound {
            name: name.to_string(),
        })
    }

    /// Get the value of a parameter by name
    pub fn value(&self, name: &str) -> Result<f64, ParameterError> {
        self.require(name).map(Parameter::value)
    }

    /// Check if a parameter with the given name exists
    pub fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name() == name)
    }

    /// Number of parameters in the collection
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameter names in insertion order
    pub fn names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name().to_string()).collect()
    }

    /// Iterate over the parameters in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    /// Parameters that vary during optimization, in insertion order
    pub fn varying(&self) -> Vec<&Parameter> {
        self.params.iter().filter(|p| p.vary()).collect()
    }

    /// Names of parameters that vary during optimization
    pub fn varying_names(&self) -> Vec<String> {
        self.params
            .iter()
            .filter(|p| p.vary())
            .map(|p| p.name().to_string())
            .collect()
    }

    /// External values of the varying parameters
    pub fn varying_values(&self) -> Vec<f64> {
        self.params
            .iter()
            .filter(|p| p.vary())
            .map(Parameter::value)
            .collect()
    }

    /// Internal (bounds-transformed) values of the varying parameters
    ///
    /// Fails if any value is outside its bounds or not finite.
    pub fn varying_internal_values(&self) -> Result<Vec<f64>, ParameterError> {
        self.params
            .iter()
            .filter(|p| p.vary())
            .map(Parameter::to_internal)
            .collect()
    }

    /// Update the varying parameters from a slice of internal values
    ///
    /// The internal values are mapped back through each parameter's bounds
    /// transform, so the result always lies within bounds.
    pub fn update_from_internal(&mut self, values: &[f64]) -> Result<(), ParameterError> {
        self.check_varying_len(values.len())?;

        for (param, &internal) in self.params.iter_mut().filter(|p| p.vary()).zip(values) {
            let external = param.from_internal(internal);
            param.set_value(external)?;
        }

        Ok(())
    }

    /// Update the varying parameters from a slice of external values
    pub fn update_from_values(&mut self, values: &[f64]) -> Result<(), ParameterError> {
        self.check_varying_len(values.len())?;

        for (param, &value) in self.params.iter_mut().filter(|p| p.vary()).zip(values) {
            param.set_value(value)?;
        }

        Ok(())
    }

    /// Reset all parameters to their initial values
    pub fn reset(&mut self) {
        for param in &mut self.params {
            param.reset();
        }
    }

    /// Serialize the collection to a pretty-printed JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a collection from a JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn check_varying_len(&self, actual: usize) -> Result<(), ParameterError> {
        let expected = self.params.iter().filter(|p| p.vary()).count();
        if actual != expected {
            return Err(ParameterError::LengthMismatch { expected, actual });
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}

//! Composite models built from two component models.
//!
//! A composite shares one parameter collection between its components; the
//! component prefixes keep the names apart, and a name collision is an error
//! at construction time.

use crate::error::Result;
use crate::model::{set_guess, Model};
use crate::parameters::Parameters;
use ndarray::Array1;
use std::fmt;

/// How the component values are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// left + right
    Add,
    /// left * right
    Multiply,
}

impl Operation {
    fn apply(&self, left: Array1<f64>, right: &Array1<f64>) -> Array1<f64> {
        match self {
            Operation::Add => left + right,
            Operation::Multiply => left * right,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Add => write!(f, "+"),
            Operation::Multiply => write!(f, "*"),
        }
    }
}

/// A model combining two models with an [`Operation`].
pub struct CompositeModel {
    left: Box<dyn Model>,
    right: Box<dyn Model>,
    op: Operation,
    params: Parameters,
}

impl fmt::Debug for CompositeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeModel")
            .field("left", &self.left.prefix())
            .field("op", &self.op)
            .field("right", &self.right.prefix())
            .field("params", &self.params.names())
            .finish()
    }
}

impl CompositeModel {
    /// Combine two models.
    ///
    /// The parameters of `left` come first, then those of `right`. Fails with a
    /// `ParameterError` if both models define a parameter of the same name.
    pub fn new(left: Box<dyn Model>, right: Box<dyn Model>, op: Operation) -> Result<Self> {
        let mut params = left.parameters().clone();
        params.extend(right.parameters().clone())?;

        Ok(Self {
            left,
            right,
            op,
            params,
        })
    }

    /// The left-hand component.
    pub fn left(&self) -> &dyn Model {
        self.left.as_ref()
    }

    /// The right-hand component.
    pub fn right(&self) -> &dyn Model {
        self.right.as_ref()
    }

    /// The combining operation.
    pub fn operation(&self) -> Operation {
        self.op
    }

    /// Evaluate each component separately, keyed by component prefix.
    pub fn eval_components_with(
        &self,
        params: &Parameters,
        x: &Array1<f64>,
    ) -> Result<Vec<(String, Array1<f64>)>> {
        Ok(vec![
            (self.left.prefix().to_string(), self.left.eval_with(params, x)?),
            (self.right.prefix().to_string(), self.right.eval_with(params, x)?),
        ])
    }

    /// Copy the composite's view of each component parameter into the component.
    fn push_to_components(&mut self) -> Result<()> {
        for component in [&mut self.left, &mut self.right] {
            for name in component.parameter_names() {
                let shared = self.params.require(&name)?.clone();
                *component.parameters_mut().require_mut(&name)? = shared;
            }
        }
        Ok(())
    }
}

impl Model for CompositeModel {
    /// Composites have no prefix of their own.
    fn prefix(&self) -> &str {
        ""
    }

    fn parameters(&self) -> &Parameters {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }

    fn eval_with(&self, params: &Parameters, x: &Array1<f64>) -> Result<Array1<f64>> {
        let left = self.left.eval_with(params, x)?;
        let right = self.right.eval_with(params, x)?;
        Ok(self.op.apply(left, &right))
    }

    /// Let each component guess from the full data, then take over the values.
    fn guess_parameters(&mut self, x: &Array1<f64>, y: &Array1<f64>) -> Result<()> {
        self.push_to_components()?;
        self.left.guess_parameters(x, y)?;
        self.right.guess_parameters(x, y)?;

        for component in [&self.left, &self.right] {
            for param in component.parameters().iter() {
                set_guess(&mut self.params, param.name(), param.value())?;
            }
        }
        Ok(())
    }
}

/// `left + right`
pub fn add<L, R>(left: L, right: R) -> Result<CompositeModel>
where
    L: Model + 'static,
    R: Model + 'static,
{
    CompositeModel::new(Box::new(left), Box::new(right), Operation::Add)
}

/// `left * right`
pub fn multiply<L, R>(left: L, right: R) -> Result<CompositeModel>
where
    L: Model + 'static,
    R: Model + 'static,
{
    CompositeModel::new(Box::new(left), Box::new(right), Operation::Multiply)
}

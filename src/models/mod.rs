//! Built-in model implementations.
//!
//! This module provides the model functions the profile fit is built from:
//! a Gaussian peak, an exponential decay, and composites of the two.
//!
//! ```rust
//! use profilefit_rs::model::Model;
//! use profilefit_rs::models::{add, ExponentialModel, GaussianModel};
//!
//! let model = add(GaussianModel::new("g1_"), ExponentialModel::new("exp_")).unwrap();
//! assert_eq!(model.parameters().len(), 5);
//! ```

mod composite;
mod exponential;
mod peak;

pub use composite::{add, multiply, CompositeModel, Operation};
pub use exponential::ExponentialModel;
pub use peak::{GaussianModel, FWHM_FACTOR};

/// Create a Gaussian peak model with the given parameter prefix
pub fn gaussian_model(prefix: &str) -> GaussianModel {
    GaussianModel::new(prefix)
}

/// Create an exponential decay model with the given parameter prefix
pub fn exponential_model(prefix: &str) -> ExponentialModel {
    ExponentialModel::new(prefix)
}

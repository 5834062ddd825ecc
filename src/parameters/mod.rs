//! # Parameter System
//!
//! Named fit parameters with bounds, similar to lmfit-py.
//!
//! - [`Parameter`]: a single value with bounds, a vary flag and a standard error
//! - [`Parameters`]: an insertion-ordered collection addressed by name
//! - [`Bounds`] and [`BoundsTransform`]: min/max limits and the Minuit-style
//!   mapping the solver uses to honour them
//!
//! ## Example Usage
//!
//! ```rust
//! use profilefit_rs::parameters::Parameters;
//!
//! let mut params = Parameters::new();
//! params.add_param("exp_decay", 10.0).unwrap();
//! params.add_param_with_bounds("g1_center", 25.0, 20.0, 30.0).unwrap();
//! params.add_param_with_bounds("g1_sigma", 3.0, 2.0, f64::INFINITY).unwrap();
//!
//! // Internal values for the optimizer (only varying parameters)
//! let internal = params.varying_internal_values().unwrap();
//! params.update_from_internal(&internal).unwrap();
//! assert!((params.value("g1_center").unwrap() - 25.0).abs() < 1e-12);
//! ```

pub mod bounds;
pub mod parameter;
pub mod parameters;


pub use bounds::{Bounds, BoundsError, BoundsTransform};
pub use parameter::{Parameter, ParameterError};
pub use parameters::Parameters;

//! # profilefit-rs
//!
//! `profilefit-rs` fits a Gaussian peak on an exponential baseline to the
//! sum-projection of a 2D intensity matrix, using a Levenberg-Marquardt
//! solver with bounded parameters, and reports the fit with a k-σ
//! uncertainty band.
//!
//! The library provides:
//! - Reduction of a matrix to a 1D profile ([`Profile`])
//! - A Levenberg-Marquardt implementation with finite-difference Jacobians
//! - A parameter system with bounds, and composable models in the lmfit style
//! - Covariance, standard errors and curve uncertainty after the fit
//! - A three-panel SVG diagnostic figure behind the `report` feature
//!
//! ## Basic Usage
//!
//! ```
//! use ndarray::Array2;
//! use profilefit_rs::{ParamBounds, ProfileFitter};
//!
//! let matrix = Array2::from_shape_fn((3, 50), |(_, c)| {
//!     let x = c as f64;
//!     10.0 * (-(x - 24.0).powi(2) / 18.0).exp() + 30.0 * (-x / 12.0).exp()
//! });
//!
//! let fit = ProfileFitter::new()
//!     .with_center_bounds(ParamBounds::new(25.0, 20.0, Some(30.0)))
//!     .fit(matrix.view())
//!     .unwrap();
//!
//! let values = fit.fitted().unwrap();
//! assert!((values.g1_center - 24.0).abs() < 1e-3);
//! println!("{}", fit.fit_report());
//! ```

// Public modules
pub mod error;

// Parameter system
pub mod parameters;

// Solver
pub mod lm;
pub mod problem;
pub mod utils;

// Models and fitting
pub mod model;
pub mod models;
pub mod uncertainty;

// Profile pipeline
pub mod fitter;
pub mod profile;
pub mod report;

// Re-exports for convenience
pub use error::{ProfileFitError, Result};
pub use fitter::{
    FitterConfig, FittedParameters, ParamBounds, ProfileFit, ProfileFitter, SigmaSeed,
    EXPONENTIAL_PREFIX, GAUSSIAN_PREFIX,
};
pub use lm::{LevenbergMarquardt, LmConfig};
pub use model::{fit, Model, ModelFit};
pub use parameters::{Parameter, Parameters};
pub use problem::Problem;
pub use profile::{matrix_from_rows, Profile, ProjectionAxis};
pub use report::{FitReporter, LogReporter, NoopReporter};

#[cfg(feature = "report")]
pub use report::{render_svg, SvgReporter};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

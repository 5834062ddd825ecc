//! Levenberg-Marquardt algorithm implementation.
//!
//! This module provides an implementation of the Levenberg-Marquardt algorithm
//! for nonlinear least-squares optimization, with MINPACK-style stopping
//! criteria and a finite-difference Jacobian.

pub mod algorithm;
pub mod config;

pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::{DiffMethod, LmConfig};

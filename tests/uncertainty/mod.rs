//! Integration tests for parameter and curve uncertainties

mod band_tests;
mod covariance_tests;

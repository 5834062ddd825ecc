//! Integration tests for the Parameter struct
//!
//! These tests verify that the Parameter struct behaves correctly in various scenarios.

use profilefit_rs::parameters::{Bounds, BoundsTransform, Parameter};
use std::f64::{INFINITY, NEG_INFINITY};

#[test]
fn test_parameter_lifecycle() {
    // Create a parameter
    let mut param = Parameter::new("g1_amplitude", 10.0);

    // Check initial state
    assert_eq!(param.name(), "g1_amplitude");
    assert_eq!(param.value(), 10.0);
    assert!(param.vary());
    assert_eq!(param.min(), NEG_INFINITY);
    assert_eq!(param.max(), INFINITY);
    assert!(param.stderr().is_none());

    // Change value
    param.set_value(15.0).unwrap();
    assert_eq!(param.value(), 15.0);
    assert_eq!(param.init_value(), 10.0);

    // Reset to initial value
    param.reset();
    assert_eq!(param.value(), 10.0);

    // Set bounds
    param.set_bounds(0.0, 20.0).unwrap();
    assert_eq!(param.min(), 0.0);
    assert_eq!(param.max(), 20.0);

    // Set value outside bounds (should fail and keep the old value)
    assert!(param.set_value(-5.0).is_err());
    assert!(param.set_value(25.0).is_err());
    assert_eq!(param.value(), 10.0);

    // Fix and free the parameter
    param.set_vary(false);
    assert!(!param.vary());
    param.set_vary(true);
    assert!(param.vary());

    param.set_stderr(Some(0.5));
    assert_eq!(param.stderr(), Some(0.5));
    param.reset();
    assert!(param.stderr().is_none());
}

#[test]
fn test_seeding_from_bounds_record() {
    // A center seeded as value 25 in [20, 30]
    let mut center = Parameter::new("g1_center", 0.0);
    center.set(25.0, 20.0, 30.0).unwrap();
    assert_eq!((center.value(), center.min(), center.max()), (25.0, 20.0, 30.0));
    assert_eq!(center.init_value(), 25.0);

    // Values outside the record are clamped
    center.set(35.0, 20.0, 30.0).unwrap();
    assert_eq!(center.value(), 30.0);

    // Inverted bounds are rejected
    assert!(center.set(25.0, 30.0, 20.0).is_err());
}

#[test]
fn test_parameter_with_bounds() {
    let param = Parameter::with_bounds("g1_sigma", 3.0, 2.0, INFINITY).unwrap();
    assert_eq!(param.min(), 2.0);
    assert_eq!(param.max(), INFINITY);

    // Invalid bounds should return an error
    assert!(Parameter::with_bounds("g1_sigma", 3.0, 20.0, 0.0).is_err());

    // Value outside bounds should be clamped to bounds
    let param = Parameter::with_bounds("g1_sigma", 1.0, 2.0, INFINITY).unwrap();
    assert_eq!(param.value(), 2.0);
}

#[test]
fn test_parameter_bounds_transform() {
    // For unbounded parameters, internal and external values are the same
    let param = Parameter::new("exp_amplitude", 10.0);
    assert_eq!(param.to_internal().unwrap(), 10.0);
    assert_eq!(param.from_internal(15.0), 15.0);

    // Lower bound only
    let param = Parameter::with_bounds("g1_sigma", 10.0, 2.0, INFINITY).unwrap();
    let internal = param.to_internal().unwrap();
    assert!((param.from_internal(internal) - 10.0).abs() < 1e-10);
    assert!(param.from_internal(-1e6) >= 2.0);

    // Two-sided bounds
    let param = Parameter::with_bounds("g1_center", 25.0, 20.0, 30.0).unwrap();
    let internal = param.to_internal().unwrap();
    assert!((param.from_internal(internal) - 25.0).abs() < 1e-10);
    for trial in [-100.0, -1.0, 0.3, 7.0, 1e4] {
        let external = param.from_internal(trial);
        assert!((20.0..=30.0).contains(&external));
    }
}

#[test]
fn test_transform_derivative_is_finite() {
    let transform = BoundsTransform::new(Bounds::new(20.0, 30.0).unwrap());
    for internal in [-2.0, 0.0, 0.5, 2.0] {
        assert!(transform.derivative(internal).is_finite());
    }
}

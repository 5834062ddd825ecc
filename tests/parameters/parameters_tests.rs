//! Integration tests for the Parameters collection
//!
//! These tests verify that the Parameters collection behaves correctly in various scenarios.

use profilefit_rs::parameters::{Parameter, ParameterError, Parameters};
use std::f64::INFINITY;

fn profile_params() -> Parameters {
    let mut params = Parameters::new();
    params.add_param("g1_amplitude", 1.0).unwrap();
    params
        .add_param_with_bounds("g1_center", 25.0, 20.0, 30.0)
        .unwrap();
    params
        .add_param_with_bounds("g1_sigma", 3.0, 2.0, INFINITY)
        .unwrap();
    params.add_param("exp_amplitude", 100.0).unwrap();
    params.add_param("exp_decay", 10.0).unwrap();
    params
}

#[test]
fn test_parameters_basic_operations() {
    // Create an empty parameters collection
    let mut params = Parameters::new();
    assert_eq!(params.len(), 0);
    assert!(params.is_empty());

    params.add(Parameter::new("g1_amplitude", 10.0)).unwrap();
    assert_eq!(params.len(), 1);
    assert!(params.contains("g1_amplitude"));

    // Duplicate names are rejected
    let err = params.add_param("g1_amplitude", 2.0).unwrap_err();
    assert!(matches!(err, ParameterError::DuplicateParameter { .. }));

    // Get a parameter that doesn't exist
    assert!(params.get("nonexistent").is_none());
    assert!(matches!(
        params.require("nonexistent"),
        Err(ParameterError::ParameterNotFound { .. })
    ));

    // Get a mutable reference to a parameter
    params.get_mut("g1_amplitude").unwrap().set_value(7.5).unwrap();
    assert_eq!(params.value("g1_amplitude").unwrap(), 7.5);
}

#[test]
fn test_insertion_order_is_kept() {
    let params = profile_params();
    assert_eq!(
        params.names(),
        vec!["g1_amplitude", "g1_center", "g1_sigma", "exp_amplitude", "exp_decay"]
    );
}

#[test]
fn test_varying_parameters() {
    let mut params = profile_params();
    params.get_mut("exp_decay").unwrap().set_vary(false);

    assert_eq!(params.varying().len(), 4);
    assert_eq!(
        params.varying_names(),
        vec!["g1_amplitude", "g1_center", "g1_sigma", "exp_amplitude"]
    );
    assert_eq!(params.varying_values(), vec![1.0, 25.0, 3.0, 100.0]);

    // Updating from external values only touches varying parameters
    params.update_from_values(&[2.0, 26.0, 4.0, 90.0]).unwrap();
    assert_eq!(params.value("g1_center").unwrap(), 26.0);
    assert_eq!(params.value("exp_decay").unwrap(), 10.0);

    // Wrong length is an error
    let err = params.update_from_values(&[1.0]).unwrap_err();
    assert!(matches!(
        err,
        ParameterError::LengthMismatch {
            expected: 4,
            actual: 1
        }
    ));
}

#[test]
fn test_internal_round_trip_respects_bounds() {
    let mut params = profile_params();
    let internal = params.varying_internal_values().unwrap();
    params.update_from_internal(&internal).unwrap();
    assert!((params.value("g1_center").unwrap() - 25.0).abs() < 1e-10);

    // Any internal vector maps inside the bounds
    params
        .update_from_internal(&[0.0, 1e3, -1e3, 0.0, 0.0])
        .unwrap();
    let center = params.value("g1_center").unwrap();
    let sigma = params.value("g1_sigma").unwrap();
    assert!((20.0..=30.0).contains(&center));
    assert!(sigma >= 2.0);
}

#[test]
fn test_reset() {
    let mut params = profile_params();
    params.update_from_values(&[5.0, 21.0, 9.0, 1.0, 2.0]).unwrap();
    params.reset();
    assert_eq!(params.varying_values(), vec![1.0, 25.0, 3.0, 100.0, 10.0]);
}

#[test]
fn test_json_serialization() {
    let mut params = profile_params();
    params.get_mut("g1_center").unwrap().set_stderr(Some(0.02));

    let json = params.to_json().unwrap();
    // Infinite bounds are written as null
    assert!(json.contains("null"));

    let restored = Parameters::from_json(&json).unwrap();
    assert_eq!(restored, params);
    assert_eq!(restored.get("g1_sigma").unwrap().max(), INFINITY);
}

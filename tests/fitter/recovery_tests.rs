//! Fits of synthetic profiles with known parameters.

use crate::test_helpers::{approx_eq, Truth};
use approx::assert_relative_eq;
use ndarray::Array2;
use profilefit_rs::{
    Model, ParamBounds, Profile, ProfileFit, ProfileFitError, ProfileFitter, ProjectionAxis,
    SigmaSeed,
};

#[test]
fn test_zero_noise_recovery() {
    let truth = Truth::default();
    let fit = ProfileFitter::new().fit(truth.matrix(5, 50).view()).unwrap();
    let values = fit.fitted().unwrap();

    assert_relative_eq!(values.g1_amplitude, truth.g1_amplitude, max_relative = 1e-3);
    assert_relative_eq!(values.g1_center, truth.g1_center, max_relative = 1e-3);
    assert_relative_eq!(values.g1_sigma, truth.g1_sigma, max_relative = 1e-3);
    assert_relative_eq!(values.exp_amplitude, truth.exp_amplitude, max_relative = 1e-3);
    assert_relative_eq!(values.exp_decay, truth.exp_decay, max_relative = 1e-3);

    // best fit reproduces the profile and the residuals are data - fit
    let profile = truth.profile(50);
    for i in 0..50 {
        assert!(approx_eq(fit.best_fit()[i], profile[i], 1e-3));
        assert!(approx_eq(
            fit.residuals()[i],
            fit.profile().y()[i] - fit.best_fit()[i],
            1e-12
        ));
    }
}

#[test]
fn test_peak_away_from_default_center() {
    let truth = Truth {
        g1_center: 38.0,
        ..Truth::default()
    };
    let fit = ProfileFitter::new()
        .with_center_bounds(ParamBounds::new(40.0, 35.0, Some(45.0)))
        .fit(truth.matrix(2, 60).view())
        .unwrap();

    assert_relative_eq!(fit.fitted().unwrap().g1_center, 38.0, max_relative = 1e-3);
}

/// Fit a peak outside the default center range [20, 30].
fn fit_with_peak_at(center: f64) -> ProfileFit {
    let truth = Truth {
        g1_center: center,
        ..Truth::default()
    };
    ProfileFitter::new().fit(truth.matrix(3, 50).view()).unwrap()
}

#[test]
fn test_peak_above_range_clips_to_upper_bound() {
    let fit = fit_with_peak_at(35.0);
    let values = fit.fitted().unwrap();

    assert_relative_eq!(values.g1_center, 30.0, epsilon = 1e-3);
    assert!(values.g1_amplitude >= 0.0, "amplitude = {}", values.g1_amplitude);
    let param = fit.params().get("g1_center").unwrap();
    assert_eq!((param.min(), param.max()), (20.0, 30.0));
}

#[test]
fn test_peak_below_range_clips_to_lower_bound() {
    let fit = fit_with_peak_at(15.0);
    let values = fit.fitted().unwrap();

    assert_relative_eq!(values.g1_center, 20.0, epsilon = 1e-3);
    assert!(values.g1_amplitude >= 0.0, "amplitude = {}", values.g1_amplitude);
}

#[test]
fn test_sigma_respects_lower_bound() {
    let truth = Truth {
        g1_sigma: 3.0,
        ..Truth::default()
    };
    let fit = ProfileFitter::new()
        .with_sigma_bounds(ParamBounds::new(5.0, 4.0, None))
        .fit(truth.matrix(3, 50).view())
        .unwrap();

    assert!(fit.fitted().unwrap().g1_sigma >= 4.0);
}

#[test]
fn test_legacy_sigma_seed() {
    let truth = Truth::default();
    let profile = Profile::reduce(truth.matrix(2, 50).view(), ProjectionAxis::Rows).unwrap();

    let model = ProfileFitter::new()
        .with_sigma_seed(SigmaSeed::FromCenterBounds)
        .build_model(&profile)
        .unwrap();
    let sigma = model.parameters().get("g1_sigma").unwrap();

    assert_eq!(sigma.value(), 25.0);
    assert_eq!(sigma.min(), 20.0);
    assert_eq!(sigma.max(), f64::INFINITY);
}

#[test]
fn test_columns_axis() {
    let truth = Truth::default();
    let matrix = truth.matrix(4, 50).reversed_axes();

    let fit = ProfileFitter::new()
        .with_axis(ProjectionAxis::Columns)
        .fit(matrix.view())
        .unwrap();

    assert_eq!(fit.x().len(), 50);
    assert_relative_eq!(fit.fitted().unwrap().g1_center, 25.0, max_relative = 1e-3);
}

#[test]
fn test_empty_matrix() {
    let err = ProfileFitter::new()
        .fit(Array2::<f64>::zeros((0, 10)).view())
        .unwrap_err();
    assert!(matches!(err, ProfileFitError::ShapeError(_)));
}

#[test]
fn test_non_finite_data_is_rejected() {
    let mut matrix = Truth::default().matrix(2, 50);
    matrix[[0, 10]] = f64::NAN;

    let err = ProfileFitter::new().fit(matrix.view()).unwrap_err();
    assert!(matches!(err, ProfileFitError::InvalidInput(_)), "{}", err);
    assert!(err.to_string().contains("10"));
}

#[test]
fn test_batch_matches_sequential_fits() {
    let inputs: Vec<Array2<f64>> = (0..4)
        .map(|seed| Truth::default().noisy_matrix(3, 50, 0.5, seed))
        .collect();
    let fitter = ProfileFitter::new();

    let batch = fitter.fit_batch(&inputs);
    assert_eq!(batch.len(), inputs.len());

    for (input, result) in inputs.iter().zip(batch) {
        let sequential = fitter.fit(input.view()).unwrap();
        let parallel = result.unwrap();
        assert_eq!(parallel.fitted().unwrap(), sequential.fitted().unwrap());
    }
}

//! Loading and applying fitter configuration.

use crate::test_helpers::Truth;
use approx::assert_relative_eq;
use profilefit_rs::lm::DiffMethod;
use profilefit_rs::{FitterConfig, ParamBounds, ProfileFitError, ProfileFitter, ProjectionAxis};

#[test]
fn test_config_file_round_trip() {
    let config = FitterConfig {
        center: ParamBounds::new(30.0, 25.0, Some(35.0)),
        band_sigma: 2.0,
        axis: ProjectionAxis::Columns,
        ..FitterConfig::default()
    };

    let path = std::env::temp_dir().join("profilefit_config_round_trip.json");
    std::fs::write(&path, config.to_json().unwrap()).unwrap();
    let loaded = FitterConfig::from_json_file(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded, config);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = FitterConfig::from_json_file("/nonexistent/profilefit.json").unwrap_err();
    assert!(matches!(err, ProfileFitError::IoError(_)));
}

#[test]
fn test_malformed_json_is_json_error() {
    let err = FitterConfig::from_json_str("{ center: ").unwrap_err();
    assert!(matches!(err, ProfileFitError::JsonError(_)));
}

#[test]
fn test_solver_settings_from_json() {
    let config = FitterConfig::from_json_str(
        r#"{"band_sigma": 1.0, "lm": {"max_iterations": 200, "diff_method": "forward"}}"#,
    )
    .unwrap();
    assert_eq!(config.lm.max_iterations, 200);
    assert_eq!(config.lm.diff_method, DiffMethod::Forward);

    let truth = Truth::default();
    let fit = ProfileFitter::with_config(config)
        .fit(truth.matrix(2, 50).view())
        .unwrap();
    assert_eq!(fit.band_sigma(), 1.0);
    assert_relative_eq!(fit.fitted().unwrap().g1_center, 25.0, max_relative = 1e-3);
}

#[test]
fn test_invalid_config_is_rejected_before_fitting() {
    let fitter = ProfileFitter::new().with_band_sigma(f64::NAN);
    let err = fitter.fit(Truth::default().matrix(2, 50).view()).unwrap_err();
    assert!(matches!(err, ProfileFitError::InvalidInput(_)));
}

#[test]
fn test_non_positive_amplitude_seed_is_rejected() {
    for amplitude in [0.0, -50.0] {
        let fitter = ProfileFitter::new().with_amplitude(amplitude);
        let err = fitter.fit(Truth::default().matrix(2, 50).view()).unwrap_err();
        assert!(matches!(err, ProfileFitError::InvalidInput(_)), "{}", amplitude);
    }

    let err = FitterConfig::from_json_str(r#"{"amplitude": -1.0}"#).unwrap_err();
    assert!(matches!(err, ProfileFitError::InvalidInput(_)));
}

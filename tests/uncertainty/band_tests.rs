//! The uncertainty band is `k * stderr(x)` around the best fit.

use crate::test_helpers::Truth;
use approx::assert_relative_eq;
use profilefit_rs::ProfileFitter;

#[test]
fn test_band_is_scaled_curve_stderr() {
    let matrix = Truth::default().noisy_matrix(4, 50, 0.4, 11);
    let fit = ProfileFitter::new().fit(matrix.view()).unwrap();

    let stderr = fit
        .model_fit()
        .curve_stderr
        .clone()
        .expect("covariance should be available for a well-posed fit");
    let half_width = fit.uncertainty();

    assert_eq!(half_width.len(), 50);
    for (w, s) in half_width.iter().zip(stderr.iter()) {
        assert!(*w >= 0.0);
        assert_relative_eq!(*w, 3.0 * s, max_relative = 1e-12);
    }

    let (lower, upper) = fit.band();
    for i in 0..50 {
        assert_relative_eq!(upper[i] - fit.best_fit()[i], half_width[i], epsilon = 1e-9);
        assert_relative_eq!(fit.best_fit()[i] - lower[i], half_width[i], epsilon = 1e-9);
    }
}

#[test]
fn test_band_scales_linearly_with_sigma() {
    let matrix = Truth::default().noisy_matrix(4, 50, 0.4, 12);
    let fit = ProfileFitter::new().fit(matrix.view()).unwrap();

    let one = fit.model_fit().eval_uncertainty(1.0);
    let two = fit.model_fit().eval_uncertainty(2.0);
    for (a, b) in one.iter().zip(two.iter()) {
        assert_relative_eq!(2.0 * a, *b, max_relative = 1e-12);
    }
    assert!(fit.model_fit().eval_uncertainty(0.0).iter().all(|w| *w == 0.0));
}

#[test]
fn test_noisy_fit_parameters_within_a_few_stderr() {
    let truth = Truth::default();
    let matrix = truth.noisy_matrix(4, 50, 0.5, 3);
    let fit = ProfileFitter::new().fit(matrix.view()).unwrap();

    let expected = [
        ("g1_amplitude", truth.g1_amplitude),
        ("g1_center", truth.g1_center),
        ("g1_sigma", truth.g1_sigma),
        ("exp_amplitude", truth.exp_amplitude),
        ("exp_decay", truth.exp_decay),
    ];
    for (name, value) in expected {
        let param = fit.params().get(name).unwrap();
        let stderr = param.stderr().unwrap();
        assert!(stderr > 0.0, "{} has no standard error", name);
        assert!(
            (param.value() - value).abs() < 5.0 * stderr,
            "{} = {} ± {}, expected {}",
            name,
            param.value(),
            stderr,
            value
        );
    }
}

#[test]
fn test_band_is_narrow_where_data_is_exact() {
    // Without noise the reduced chi-square is tiny and so is the band
    let fit = ProfileFitter::new()
        .fit(Truth::default().matrix(2, 50).view())
        .unwrap();
    assert!(fit.uncertainty().iter().all(|w| *w < 1e-3));
}

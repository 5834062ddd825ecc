//! Tests for covariance, correlation and fit statistics

use approx::assert_relative_eq;
use ndarray::{arr2, Array2};
use profilefit_rs::parameters::Parameters;
use profilefit_rs::uncertainty::{
    calculate_covariance, standard_errors_from_covariance, UncertaintyCalculator,
};
use profilefit_rs::ProfileFitError;

/// Jacobian of a straight-line fit y = m*x + b at x = 1..4
fn create_mock_jacobian() -> Array2<f64> {
    arr2(&[[1.0, 1.0], [2.0, 1.0], [3.0, 1.0], [4.0, 1.0]])
}

#[test]
fn test_covariance_and_standard_errors() {
    let jacobian = create_mock_jacobian();
    let calc = UncertaintyCalculator::new(4, 2, 0.13);

    assert_eq!(calc.nfree, 2);
    assert_relative_eq!(calc.redchi, 0.065, epsilon = 1e-12);

    let covar = calc.calculate_covariance(&jacobian).unwrap();
    assert_eq!(covar.shape(), &[2, 2]);

    // (J^T J)^-1 = [[0.2, -0.5], [-0.5, 1.5]] for this design
    assert_relative_eq!(covar[[0, 0]], 0.065 * 0.2, epsilon = 1e-12);
    assert_relative_eq!(covar[[0, 1]], 0.065 * -0.5, epsilon = 1e-12);
    assert_relative_eq!(covar[[1, 1]], 0.065 * 1.5, epsilon = 1e-12);

    let errors = standard_errors_from_covariance(&covar);
    assert_relative_eq!(errors[0], (0.065f64 * 0.2).sqrt(), epsilon = 1e-12);

    let mut params = Parameters::new();
    params.add_param("m", 0.7).unwrap();
    params.add_param("b", 0.3).unwrap();
    calc.apply_standard_errors(&covar, &mut params);
    assert_relative_eq!(
        params.get("b").unwrap().stderr().unwrap(),
        (0.065f64 * 1.5).sqrt(),
        epsilon = 1e-12
    );

    let correl = calc.calculate_correlation(&covar);
    assert_relative_eq!(correl[[0, 0]], 1.0, epsilon = 1e-12);
    assert_relative_eq!(correl[[0, 1]], correl[[1, 0]], epsilon = 1e-12);
    assert!(correl[[0, 1]].abs() <= 1.0);
}

#[test]
fn test_singular_jacobian() {
    let jacobian = arr2(&[[1.0, 0.0], [2.0, 0.0], [3.0, 0.0]]);
    let err = calculate_covariance(&jacobian, 1.0).unwrap_err();
    assert!(matches!(err, ProfileFitError::SingularMatrix));
}

#[test]
fn test_information_criteria() {
    let calc = UncertaintyCalculator::new(50, 5, 2.0);
    assert_eq!(calc.nfree, 45);

    // aic = n ln(chisqr / n) + 2 nvarys, bic = n ln(chisqr / n) + ln(n) nvarys
    let base = 50.0 * (2.0f64 / 50.0).ln();
    assert_relative_eq!(calc.aic(), base + 10.0, epsilon = 1e-9);
    assert_relative_eq!(calc.bic(), base + 50.0f64.ln() * 5.0, epsilon = 1e-9);
}

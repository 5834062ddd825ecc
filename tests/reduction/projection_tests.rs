//! The profile of an R×C matrix has C elements, each the column sum.

use ndarray::{array, Array2};
use profilefit_rs::{matrix_from_rows, Profile, ProfileFitError, ProjectionAxis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[test]
fn test_column_sums_for_random_shapes() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    for _ in 0..20 {
        let rows = rng.gen_range(1..12);
        let cols = rng.gen_range(1..40);
        let matrix = Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-5.0..50.0));

        let profile = Profile::reduce(matrix.view(), ProjectionAxis::Rows).unwrap();
        assert_eq!(profile.len(), cols);

        for c in 0..cols {
            let expected: f64 = (0..rows).map(|r| matrix[[r, c]]).sum();
            assert!((profile.y()[c] - expected).abs() < 1e-9);
            assert_eq!(profile.x()[c], c as f64);
        }
    }
}

#[test]
fn test_single_row_reduces_to_itself() {
    let matrix = array![[3.0, 1.0, 4.0, 1.0, 5.0]];
    let profile = Profile::reduce(matrix.view(), ProjectionAxis::Rows).unwrap();
    assert_eq!(profile.y(), &array![3.0, 1.0, 4.0, 1.0, 5.0]);
}

#[test]
fn test_columns_axis_matches_transpose() {
    let matrix = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];

    let by_columns = Profile::reduce(matrix.view(), ProjectionAxis::Columns).unwrap();
    let transposed = Profile::reduce(matrix.t(), ProjectionAxis::Rows).unwrap();
    assert_eq!(by_columns, transposed);
    assert_eq!(by_columns.y(), &array![3.0, 7.0, 11.0]);
}

#[test]
fn test_empty_input_is_shape_error() {
    for shape in [(0, 0), (0, 5), (5, 0)] {
        let matrix = Array2::<f64>::zeros(shape);
        let err = Profile::reduce(matrix.view(), ProjectionAxis::Rows).unwrap_err();
        assert!(matches!(err, ProfileFitError::ShapeError(_)), "{:?}", shape);
    }
}

#[test]
fn test_ragged_rows_are_shape_error() {
    let err = matrix_from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0]]).unwrap_err();
    assert!(matches!(err, ProfileFitError::ShapeError(_)));

    let matrix = matrix_from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
    let profile = Profile::reduce(matrix.view(), ProjectionAxis::Rows).unwrap();
    assert_eq!(profile.y(), &array![5.0, 7.0, 9.0]);
}

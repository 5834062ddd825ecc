//! Reporters receive the matrix and the fit; the SVG figure has three panels.

use crate::test_helpers::Truth;
use ndarray::ArrayView2;
use profilefit_rs::{FitReporter, LogReporter, NoopReporter, ProfileFit, ProfileFitter, Result};

/// Collects what it was given.
#[derive(Default)]
struct Recording {
    shapes: Vec<(usize, usize)>,
    centers: Vec<f64>,
}

impl FitReporter for Recording {
    fn report(&mut self, matrix: ArrayView2<'_, f64>, fit: &ProfileFit) -> Result<()> {
        self.shapes.push(matrix.dim());
        self.centers.push(fit.fitted()?.g1_center);
        Ok(())
    }
}

#[test]
fn test_custom_reporter_sees_matrix_and_fit() {
    let fitter = ProfileFitter::new();
    let mut recording = Recording::default();

    for rows in [2, 5] {
        let matrix = Truth::default().matrix(rows, 50);
        fitter.fit_and_report(matrix.view(), &mut recording).unwrap();
    }

    assert_eq!(recording.shapes, vec![(2, 50), (5, 50)]);
    assert!(recording.centers.iter().all(|c| (c - 25.0).abs() < 1e-2));
}

#[test]
fn test_builtin_text_reporters() {
    let matrix = Truth::default().matrix(2, 50);
    let fitter = ProfileFitter::new();

    assert!(fitter.fit_and_report(matrix.view(), &mut NoopReporter).is_ok());
    assert!(fitter
        .fit_and_report(matrix.view(), &mut LogReporter::new())
        .is_ok());
}

#[cfg(feature = "report")]
mod svg {
    use crate::test_helpers::Truth;
    use profilefit_rs::{render_svg, ProfileFitter, SvgReporter};

    #[test]
    fn test_figure_contents() {
        let matrix = Truth::default().noisy_matrix(3, 50, 0.3, 5);
        let fit = ProfileFitter::new().fit(matrix.view()).unwrap();

        let svg = render_svg(matrix.view(), &fit, (800, 700)).unwrap();
        assert!(svg.starts_with("<svg") || svg.contains("<svg"));
        for text in [
            "Fit (Exponential + Gaussian)",
            "Residuals plot",
            "Actual data",
            "Fitted data",
            "Best fit",
            "uncertainty band",
            "Fit line",
            "epsilon",
        ] {
            assert!(svg.contains(text), "missing {:?}", text);
        }
    }

    #[test]
    fn test_in_memory_reporter() {
        let matrix = Truth::default().matrix(2, 50);
        let mut reporter = SvgReporter::in_memory();
        assert!(reporter.svg().is_none());

        ProfileFitter::new()
            .fit_and_report(matrix.view(), &mut reporter)
            .unwrap();

        assert!(reporter.path().is_none());
        assert!(reporter.svg().unwrap().contains("<svg"));
    }
}

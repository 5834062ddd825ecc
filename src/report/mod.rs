//! Reporting of finished fits.
//!
//! [`ProfileFitter::fit_and_report`](crate::fitter::ProfileFitter::fit_and_report)
//! hands each successful fit to a [`FitReporter`] together with the matrix it
//! came from. The numeric core never draws anything itself; the figure lives
//! behind the `report` feature in [`SvgReporter`].

#[cfg(feature = "report")]
mod svg;

#[cfg(feature = "report")]
pub use svg::{draw_figure, render_svg, SvgReporter, DEFAULT_SIZE};

use crate::error::Result;
use crate::fitter::ProfileFit;
use log::{log, Level};
use ndarray::ArrayView2;

/// Receives the outcome of a fit.
pub trait FitReporter {
    /// Present `fit`, which was computed from `matrix`.
    fn report(&mut self, matrix: ArrayView2<'_, f64>, fit: &ProfileFit) -> Result<()>;
}

/// Discards every fit.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl FitReporter for NoopReporter {
    fn report(&mut self, _matrix: ArrayView2<'_, f64>, _fit: &ProfileFit) -> Result<()> {
        Ok(())
    }
}

/// Writes the text fit report through the `log` facade.
#[derive(Debug, Clone, Copy)]
pub struct LogReporter {
    level: Level,
}

impl Default for LogReporter {
    fn default() -> Self {
        Self { level: Level::Info }
    }
}

impl LogReporter {
    /// Report at `Info` level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report at `level` instead.
    pub fn with_level(level: Level) -> Self {
        Self { level }
    }

    pub fn level(&self) -> Level {
        self.level
    }
}

impl FitReporter for LogReporter {
    fn report(&mut self, matrix: ArrayView2<'_, f64>, fit: &ProfileFit) -> Result<()> {
        let (rows, cols) = matrix.dim();
        log!(
            self.level,
            "fit of a {}x{} matrix ({} samples)\n{}",
            rows,
            cols,
            fit.x().len(),
            fit.fit_report()
        );
        Ok(())
    }
}

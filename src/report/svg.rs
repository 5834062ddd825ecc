//! SVG rendering of the diagnostic figure.
//!
//! The figure stacks three panels with height ratios 3:3:1 that share the
//! x axis:
//!
//! 1. the input matrix as a heatmap, oriented so that its columns line up
//!    with the profile samples
//! 2. the profile, the best fit and the shaded uncertainty band
//! 3. the residuals around a zero line

use super::FitReporter;
use crate::error::{ProfileFitError, Result};
use crate::fitter::ProfileFit;
use crate::profile::ProjectionAxis;
use log::info;
use ndarray::ArrayView2;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fmt::Display;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Default figure size in pixels.
pub const DEFAULT_SIZE: (u32, u32) = (900, 1050);

const DATA_COLOR: RGBColor = RGBColor(0x1f, 0x77, 0xb4);
const BEST_FIT_COLOR: RGBColor = RGBColor(0xff, 0x7f, 0x0e);
const BAND_COLOR: RGBColor = RGBColor(0xab, 0xab, 0xab);

/// Anchors of the diverging red-yellow-blue colormap, low to high.
const RDYLBU: [(u8, u8, u8); 11] = [
    (0xa5, 0x00, 0x26),
    (0xd7, 0x30, 0x27),
    (0xf4, 0x6d, 0x43),
    (0xfd, 0xae, 0x61),
    (0xfe, 0xe0, 0x90),
    (0xff, 0xff, 0xbf),
    (0xe0, 0xf3, 0xf8),
    (0xab, 0xd9, 0xe9),
    (0x74, 0xad, 0xd1),
    (0x45, 0x75, 0xb4),
    (0x31, 0x36, 0x95),
];

fn render_error<E: Display>(err: E) -> ProfileFitError {
    ProfileFitError::RenderError(err.to_string())
}

/// Renders each fit to SVG, kept in memory and optionally written to a file.
#[derive(Debug, Clone)]
pub struct SvgReporter {
    path: Option<PathBuf>,
    size: (u32, u32),
    svg: Option<String>,
}

impl SvgReporter {
    /// Keep the rendered figure in memory only.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            size: DEFAULT_SIZE,
            svg: None,
        }
    }

    /// Also write the figure to `path`, replacing it on every report.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            ..Self::in_memory()
        }
    }

    /// Set the figure size in pixels.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// The most recently rendered figure.
    pub fn svg(&self) -> Option<&str> {
        self.svg.as_deref()
    }

    /// Take the most recently rendered figure out of the reporter.
    pub fn take_svg(&mut self) -> Option<String> {
        self.svg.take()
    }
}

impl FitReporter for SvgReporter {
    fn report(&mut self, matrix: ArrayView2<'_, f64>, fit: &ProfileFit) -> Result<()> {
        let svg = render_svg(matrix, fit, self.size)?;
        if let Some(path) = &self.path {
            std::fs::write(path, &svg)?;
            info!("wrote fit figure to {}", path.display());
        }
        self.svg = Some(svg);
        Ok(())
    }
}

/// Render the figure for `fit` into an SVG document.
pub fn render_svg(
    matrix: ArrayView2<'_, f64>,
    fit: &ProfileFit,
    size: (u32, u32),
) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw_figure(&root, matrix, fit)?;
        root.present().map_err(render_error)?;
    }
    Ok(svg)
}

/// Draw the three panels onto `root`.
///
/// # Errors
///
/// * `DimensionMismatch` if `matrix` does not reduce to the profile of `fit`
/// * `RenderError` if the backend fails
pub fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    matrix: ArrayView2<'_, f64>,
    fit: &ProfileFit,
) -> Result<()> {
    let n = fit.x().len();
    let grid = match fit.axis() {
        ProjectionAxis::Rows => matrix,
        ProjectionAxis::Columns => matrix.reversed_axes(),
    };
    if grid.ncols() != n {
        return Err(ProfileFitError::DimensionMismatch(format!(
            "matrix reduces to {} samples but the fit has {}",
            grid.ncols(),
            n
        )));
    }

    root.fill(&WHITE).map_err(render_error)?;

    let (_, height) = root.dim_in_pixel();
    let unit = (height / 7) as i32;
    let (heatmap_area, lower) = root.split_vertically(3 * unit);
    let (fit_area, residual_area) = lower.split_vertically(3 * unit);

    let x_range = -0.5..(n as f64 - 0.5);
    draw_heatmap(&heatmap_area, grid, x_range.clone())?;
    draw_fit(&fit_area, fit, x_range.clone())?;
    draw_residuals(&residual_area, fit, x_range)?;
    Ok(())
}

fn draw_heatmap<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    grid: ArrayView2<'_, f64>,
    x_range: Range<f64>,
) -> Result<()> {
    let rows = grid.nrows();
    let (lo, hi) = finite_range(grid.iter().copied()).unwrap_or((0.0, 1.0));

    let mut chart = ChartBuilder::on(area)
        .caption("Input matrix", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, -0.5..(rows as f64 - 0.5))
        .map_err(render_error)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .y_desc("row")
        .draw()
        .map_err(render_error)?;

    chart
        .draw_series(grid.indexed_iter().map(|((r, c), &v)| {
            let (x, y) = (c as f64, r as f64);
            Rectangle::new(
                [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                rdylbu(normalize(v, lo, hi)).filled(),
            )
        }))
        .map_err(render_error)?;

    Ok(())
}

fn draw_fit<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    fit: &ProfileFit,
    x_range: Range<f64>,
) -> Result<()> {
    let x = fit.x();
    let data = fit.profile().y();
    let best = fit.best_fit();
    let (lower, upper) = fit.band();

    let (lo, hi) = finite_range(
        data.iter()
            .chain(best.iter())
            .chain(lower.iter())
            .chain(upper.iter())
            .copied(),
    )
    .unwrap_or((0.0, 1.0));
    let (lo, hi) = padded(lo, hi);

    let mut chart = ChartBuilder::on(area)
        .caption("Fit (Exponential + Gaussian)", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, lo..hi)
        .map_err(render_error)?;

    chart
        .configure_mesh()
        .y_labels(7)
        .y_desc("intensity")
        .draw()
        .map_err(render_error)?;

    let mut band: Vec<(f64, f64)> = x.iter().copied().zip(upper.iter().copied()).collect();
    band.extend(x.iter().copied().zip(lower.iter().copied()).rev());
    let band_style = BAND_COLOR.mix(0.2).filled();
    chart
        .draw_series(std::iter::once(Polygon::new(band, band_style)))
        .map_err(render_error)?
        .label(format!("{}-σ uncertainty band", fit.band_sigma()))
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], band_style));

    chart
        .draw_series(
            x.iter()
                .zip(data.iter())
                .map(|(&x, &y)| Circle::new((x, y), 3, DATA_COLOR.filled())),
        )
        .map_err(render_error)?
        .label("Actual data")
        .legend(|(x, y)| Circle::new((x + 10, y), 3, DATA_COLOR.filled()));

    chart
        .draw_series(
            x.iter()
                .zip(best.iter())
                .map(|(&x, &y)| Circle::new((x, y), 4, RED.mix(0.3).filled())),
        )
        .map_err(render_error)?
        .label("Fitted data")
        .legend(|(x, y)| Circle::new((x + 10, y), 4, RED.mix(0.3).filled()));

    chart
        .draw_series(DashedLineSeries::new(
            x.iter().copied().zip(best.iter().copied()).collect::<Vec<_>>(),
            6,
            4,
            BEST_FIT_COLOR.stroke_width(2),
        ))
        .map_err(render_error)?
        .label("Best fit")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BEST_FIT_COLOR.stroke_width(2)));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_error)?;

    Ok(())
}

fn draw_residuals<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    fit: &ProfileFit,
    x_range: Range<f64>,
) -> Result<()> {
    let x = fit.x();
    let residuals = fit.residuals();

    let extent = residuals
        .iter()
        .filter(|r| r.is_finite())
        .fold(0.0f64, |m, r| m.max(r.abs()));
    let extent = if extent > 0.0 { extent * 1.1 } else { 1.0 };

    let mut chart = ChartBuilder::on(area)
        .caption("Residuals plot", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.clone(), -extent..extent)
        .map_err(render_error)?;

    chart
        .configure_mesh()
        .y_labels(3)
        .x_desc("x")
        .draw()
        .map_err(render_error)?;

    chart
        .draw_series(LineSeries::new(
            vec![(x_range.start, 0.0), (x_range.end, 0.0)],
            &BLACK,
        ))
        .map_err(render_error)?
        .label("Fit line")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK));

    chart
        .draw_series(
            x.iter()
                .zip(residuals.iter())
                .map(|(&x, &r)| Circle::new((x, r), 3, DATA_COLOR.filled())),
        )
        .map_err(render_error)?
        .label("epsilon")
        .legend(|(x, y)| Circle::new((x + 10, y), 3, DATA_COLOR.filled()));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_error)?;

    Ok(())
}

/// Smallest and largest finite value.
fn finite_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Widen `[lo, hi]` outward by 1% of each end.
fn padded(lo: f64, hi: f64) -> (f64, f64) {
    let (lo, hi) = (lo - 0.01 * lo.abs(), hi + 0.01 * hi.abs());
    if hi > lo {
        (lo, hi)
    } else {
        (lo - 1.0, hi + 1.0)
    }
}

fn normalize(value: f64, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        (value - lo) / (hi - lo)
    } else {
        0.5
    }
}

/// Colormap lookup for `t` in `[0, 1]`; non-finite values are grey.
fn rdylbu(t: f64) -> RGBColor {
    if !t.is_finite() {
        return RGBColor(0x80, 0x80, 0x80);
    }
    let scaled = t.clamp(0.0, 1.0) * (RDYLBU.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(RDYLBU.len() - 2);
    let f = scaled - i as f64;

    let (a, b) = (RDYLBU[i], RDYLBU[i + 1]);
    let lerp = |p: u8, q: u8| (p as f64 + (q as f64 - p as f64) * f).round() as u8;
    RGBColor(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

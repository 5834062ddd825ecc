//! Sum-projection of a 2D intensity matrix onto a 1D profile.

use crate::error::{ProfileFitError, Result};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// The axis that is summed away when reducing a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionAxis {
    /// Sum down each column; the profile has one value per column.
    #[default]
    Rows,
    /// Sum along each row; the profile has one value per row.
    Columns,
}

impl ProjectionAxis {
    fn axis(&self) -> Axis {
        match self {
            ProjectionAxis::Rows => Axis(0),
            ProjectionAxis::Columns => Axis(1),
        }
    }
}

/// A reduced 1D profile with its sample positions `x = 0, 1, ..., n-1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    x: Array1<f64>,
    y: Array1<f64>,
}

impl Profile {
    /// Wrap profile values, pairing them with integer sample positions.
    pub fn from_values(y: Array1<f64>) -> Self {
        let x = Array1::from_iter((0..y.len()).map(|i| i as f64));
        Self { x, y }
    }

    /// Reduce `matrix` by summing over `axis`.
    ///
    /// # Errors
    ///
    /// * `ShapeError` if the matrix has no rows or no columns
    pub fn reduce(matrix: ArrayView2<'_, f64>, axis: ProjectionAxis) -> Result<Self> {
        let (rows, cols) = matrix.dim();
        if rows == 0 || cols == 0 {
            return Err(ProfileFitError::ShapeError(format!(
                "cannot reduce a {}x{} matrix",
                rows, cols
            )));
        }

        Ok(Self::from_values(matrix.sum_axis(axis.axis())))
    }

    /// Sample positions.
    pub fn x(&self) -> &Array1<f64> {
        &self.x
    }

    /// Profile values.
    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.y.len()
    }

    /// Whether the profile has no samples.
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Split into `(x, y)`.
    pub fn into_parts(self) -> (Array1<f64>, Array1<f64>) {
        (self.x, self.y)
    }
}

/// Build a matrix from row vectors, checking that it is rectangular.
///
/// # Errors
///
/// * `ShapeError` if there are no rows, no columns, or rows of different length
pub fn matrix_from_rows(rows: &[Vec<f64>]) -> Result<Array2<f64>> {
    let ncols = rows
        .first()
        .map(Vec::len)
        .ok_or_else(|| ProfileFitError::ShapeError("matrix has no rows".to_string()))?;
    if ncols == 0 {
        return Err(ProfileFitError::ShapeError(
            "matrix has no columns".to_string(),
        ));
    }

    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != ncols) {
        return Err(ProfileFitError::ShapeError(format!(
            "row {} has {} values, expected {}",
            i,
            row.len(),
            ncols
        )));
    }

    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), ncols), flat)
        .map_err(|e| ProfileFitError::ShapeError(e.to_string()))
}

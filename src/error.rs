use thiserror::Error;

/// Error types for the profilefit-rs library.
#[derive(Error, Debug)]
pub enum ProfileFitError {
    /// The input matrix is empty, ragged, or has no columns.
    #[error("Shape error: {0}")]
    ShapeError(String),

    /// The solver did not converge or produced non-finite parameters.
    #[error("Fit did not converge: {0}")]
    FitConvergenceError(String),

    /// Error indicating a mismatch in vector or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error indicating a singular matrix was encountered.
    #[error("Singular matrix encountered")]
    SingularMatrix,

    /// Error for parameter-related problems.
    #[error("Parameter error: {0}")]
    ParameterError(String),

    /// Error for boundary constraint violations.
    #[error("Bounds error: {0}")]
    BoundsError(String),

    /// Parameter not found.
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error raised while drawing the diagnostic figure.
    #[error("Render error: {0}")]
    RenderError(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<crate::parameters::ParameterError> for ProfileFitError {
    fn from(err: crate::parameters::ParameterError) -> Self {
        ProfileFitError::ParameterError(err.to_string())
    }
}

impl From<crate::parameters::BoundsError> for ProfileFitError {
    fn from(err: crate::parameters::BoundsError) -> Self {
        ProfileFitError::BoundsError(err.to_string())
    }
}

/// Result type alias for profilefit-rs operations.
pub type Result<T> = std::result::Result<T, ProfileFitError>;

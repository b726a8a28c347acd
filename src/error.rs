use thiserror::Error;

/// Error types for the echem-fit library.
#[derive(Error, Debug)]
pub enum EchemError {
    /// Input arrays have the wrong shape or contain values the computation cannot accept
    /// (mismatched lengths, non-positive scan rates, non-finite values, zero currents
    /// in a logarithm).
    #[error("Invalid input shape: {0}")]
    InputShape(String),

    /// Too few data points for the requested fit.
    #[error("Insufficient data: need at least {needed} points, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// The deterministic nonlinear solver did not report success within its budget.
    #[error("Fit failed to converge: {0}")]
    Convergence(String),

    /// The posterior sampler failed on every allowed attempt.
    #[error("Posterior sampling failed: {0}")]
    Sampling(String),

    /// Error indicating a mismatch in vector or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error for invalid parameter values or settings.
    #[error("Invalid parameter value: {0}")]
    InvalidParameter(String),

    /// Error raised by the parameter system.
    #[error("Parameter error: {0}")]
    Parameter(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited text parsing or writing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl From<crate::parameters::ParameterError> for EchemError {
    fn from(err: crate::parameters::ParameterError) -> Self {
        EchemError::Parameter(format!("{}", err))
    }
}

impl From<crate::parameters::BoundsError> for EchemError {
    fn from(err: crate::parameters::BoundsError) -> Self {
        EchemError::Parameter(format!("{}", err))
    }
}

/// Result type alias for echem-fit operations.
pub type Result<T> = std::result::Result<T, EchemError>;

/// Check that two paired sequences have equal length.
pub(crate) fn ensure_same_len(what: &str, a: usize, b: usize) -> Result<()> {
    if a != b {
        return Err(EchemError::InputShape(format!(
            "{} must have equal lengths, got {} and {}",
            what, a, b
        )));
    }
    Ok(())
}

/// Check that a fit has at least `needed` points.
pub(crate) fn ensure_min_len(needed: usize, got: usize) -> Result<()> {
    if got < needed {
        return Err(EchemError::InsufficientData { needed, got });
    }
    Ok(())
}

use thiserror::Error;

/// Errors raised while simulating, fitting or summarising a Poisson GLM.
///
/// Convergence problems are deliberately absent: a chain that has not mixed is
/// reported through R-hat in [`crate::posterior::PosteriorSummary`], not as an error.
#[derive(Debug, Error)]
pub enum GlmError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A distribution could not be constructed from the supplied parameters.
    #[error("invalid distribution parameter: {0}")]
    InvalidParameter(String),

    /// The MCMC engine returned an error; its message is preserved.
    #[error("sampler failed: {0}")]
    Sampler(String),

    #[error("array shape mismatch: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("need more than {dropped} draws per chain, got {available}")]
    InsufficientDraws { dropped: usize, available: usize },

    #[error("failed to serialize summary: {0}")]
    Serialize(#[from] serde_json::Error),

    #[cfg(feature = "plot")]
    #[error("plotting failed: {0}")]
    Plot(String),
}

pub type Result<T, E = GlmError> = std::result::Result<T, E>;

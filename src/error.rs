use thiserror::Error;

/// Failures surfaced to `/predict` callers as `{"error": ...}` payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PredictError {
    #[error("The following keys are missing: {}", .0.join(","))]
    MissingKeys(Vec<&'static str>),

    #[error("season must be an integer")]
    InvalidSeason,

    #[error("{0} must be an integer")]
    InvalidId(&'static str),

    #[error("Model unavailable or not loaded")]
    ModelUnavailable,

    #[error("Insufficient data or fixture not found")]
    FixtureNotFound,

    #[error("Prediction failed: {0}")]
    Internal(String),
}

impl PredictError {
    /// Problems with the request body itself, answered with HTTP 400.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            Self::MissingKeys(_) | Self::InvalidSeason | Self::InvalidId(_)
        )
    }
}

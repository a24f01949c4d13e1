use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// The history fetch produced no usable rows.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Model fit failure: {0}")]
    ModelFitFailure(String),

    #[error("News unavailable: {0}")]
    NewsUnavailable(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Timed out after {0}s")]
    Timeout(u64),
}

impl AnalysisError {
    /// True for the kinds the forecast pane reports as "forecast not available".
    pub fn is_forecast_unavailable(&self) -> bool {
        matches!(
            self,
            AnalysisError::InsufficientData(_) | AnalysisError::ModelFitFailure(_)
        )
    }
}

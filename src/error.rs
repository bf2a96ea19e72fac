//! Error types for the scorecast training pipeline

use thiserror::Error;

/// Result type alias for scorecast operations
pub type Result<T> = std::result::Result<T, ScorecastError>;

/// Main error type for the training pipeline
#[derive(Error, Debug)]
pub enum ScorecastError {
    #[error("invalid split fraction {0}: must lie in (0, 1) and leave both partitions non-empty")]
    InvalidSplitFraction(f64),

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    #[error("training diverged (last stable round {round}): {reason}")]
    TrainingDiverged { round: usize, reason: String },

    #[error("invalid hyperparameter: {name} = {value}, {reason}")]
    InvalidHyperparameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("empty dataset: {0}")]
    EmptyDataset(String),

    #[error("no trial produced a valid model")]
    SearchExhaustedNoValidModel,

    #[error("data error: {0}")]
    DataError(String),

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("model not fitted")]
    ModelNotFitted,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for ScorecastError {
    fn from(err: polars::error::PolarsError) -> Self {
        ScorecastError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for ScorecastError {
    fn from(err: serde_json::Error) -> Self {
        ScorecastError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScorecastError::InvalidSplitFraction(1.5);
        assert!(err.to_string().contains("1.5"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ScorecastError = io_err.into();
        assert!(matches!(err, ScorecastError::IoError(_)));
    }

    #[test]
    fn test_diverged_carries_round() {
        let err = ScorecastError::TrainingDiverged {
            round: 7,
            reason: "non-finite evaluation loss".to_string(),
        };
        assert!(err.to_string().contains("round 7"));
    }
}

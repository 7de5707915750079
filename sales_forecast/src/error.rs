//! Error types for the sales_forecast crate

use sales_math::MathError;
use thiserror::Error;

/// Custom error types for the sales_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to reading or validating the uploaded table
    #[error("Data error: {0}")]
    DataError(String),

    /// A requested or required column is missing
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// A cell could not be parsed as a date or a number
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Error related to request validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid model parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The forecasting library failed to fit or predict
    #[error("Model error: {0}")]
    ModelError(String),

    /// No trained model is available
    #[error("Model not trained")]
    NotTrained,

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from scaling, splitting or scoring
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Error persisting or restoring a model artifact
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::DataError(err.to_string())
    }
}

impl From<calamine::Error> for ForecastError {
    fn from(err: calamine::Error) -> Self {
        ForecastError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::SerializationError(err.to_string())
    }
}

//! # Sales Math
//!
//! Numeric building blocks for the sales forecasting pipeline.
//! This crate provides feature standardization, reproducible train/test
//! splits and the regression metrics reported after training.

use thiserror::Error;

pub mod metrics;
pub mod scaling;
pub mod split;

pub use metrics::RegressionMetrics;
pub use scaling::StandardScaler;

/// Errors that can occur in numeric preprocessing and evaluation
#[derive(Error, Debug)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for sales math operations
pub type Result<T> = std::result::Result<T, MathError>;

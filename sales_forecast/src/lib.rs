//! # Sales Forecast
//!
//! A Rust library for forecasting daily sales from tabular uploads.
//!
//! ## Features
//!
//! - CSV and Excel ingest with date/target column detection
//! - Calendar feature extraction (day of week, day of month, month, ...)
//! - Random forest regression on calendar features (smartcore)
//! - Exponential smoothing with weekly seasonal decomposition (augurs)
//! - Holdout evaluation with regression metrics
//! - JSON model artifacts for serving after a restart
//!
//! ## Quick Start
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use sales_forecast::data::DataLoader;
//! use sales_forecast::forecast::predict_range;
//! use sales_forecast::models::{train_from_table, TrainingRequest};
//!
//! # fn main() -> sales_forecast::Result<()> {
//! // Load data with `Date` and `Valor` columns
//! let table = DataLoader::from_path("sales.csv")?;
//!
//! // Train the default random forest
//! let report = train_from_table(&table, &TrainingRequest::default())?;
//! println!("{}", report.metrics);
//!
//! // Predict the first week of the next year
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
//! for day in predict_range(&report.model, start, end, 366)? {
//!     println!("{}: {:.2}", day.date, day.prediction);
//! }
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod error;
pub mod features;
pub mod forecast;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use crate::data::{ColumnSpec, DataLoader, FileFormat, RawTable, SalesSeries};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{CalendarFeature, FeatureSet};
pub use crate::forecast::{predict_range, Prediction};
pub use crate::models::{
    ForecastModel, ModelKind, TrainedForecastModel, TrainedModel, TrainingReport,
    TrainingRequest,
};
pub use crate::store::{ModelArtifact, ModelStore};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
